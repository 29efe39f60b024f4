//! Loading configuration from project directories.

use codeintel_core::{Config, ConfigError, CoreError, TooltipMode};
use codeintel_test_utils::TestProject;
use std::path::PathBuf;

#[tokio::test]
async fn test_project_without_config_uses_defaults() {
    let project = TestProject::new().with_python_package("app").build();

    let (config, sources) = Config::load(Some(project.path())).await.unwrap();

    assert!(!sources.iter().any(|s| s.starts_with(project.path())));
    assert!(config.is_enabled());
    assert_eq!(config.tooltip_mode(), TooltipMode::Popup);
    assert_eq!(config.history_size(), 64);
}

#[tokio::test]
async fn test_project_json_config() {
    let project = TestProject::new()
        .with_config(
            r#"{
                "tooltips": "panel",
                "liveDisabledLanguages": ["PHP"],
                "historySize": 8,
                "engine": { "command": "codeintel-engine", "args": ["--stdio"] }
            }"#,
        )
        .build();

    let (config, sources) = Config::load(Some(project.path())).await.unwrap();

    assert_eq!(sources.last(), Some(&project.path().join("codeintel.json")));
    assert_eq!(config.tooltip_mode(), TooltipMode::Panel);
    assert_eq!(config.history_size(), 8);
    assert!(!config.is_live_for("PHP"));
    assert!(config.is_live_for("Python"));
    let engine = config.engine.unwrap();
    assert_eq!(engine.command, "codeintel-engine");
    assert_eq!(engine.args, vec!["--stdio"]);
}

#[tokio::test]
async fn test_jsonc_takes_precedence_over_json() {
    let project = TestProject::new()
        .with_config(r#"{ "tooltips": "status" }"#)
        .with_jsonc_config(
            r#"{
                // Prefer the panel
                "tooltips": "panel", /* trailing */
                "scanExtraPaths": ["http://not/a/comment"]
            }"#,
        )
        .build();

    let (config, sources) = Config::load(Some(project.path())).await.unwrap();

    assert_eq!(sources.last(), Some(&project.path().join("codeintel.jsonc")));
    assert!(!sources.contains(&project.path().join("codeintel.json")));
    assert_eq!(config.tooltip_mode(), TooltipMode::Panel);
    assert_eq!(
        config.scan_extra_paths,
        Some(vec![PathBuf::from("http://not/a/comment")])
    );
}

#[tokio::test]
async fn test_env_and_file_references() {
    std::env::set_var("CODEINTEL_TEST_ENGINE_BIN", "/opt/engine/bin/run");
    let project = TestProject::new()
        .with_file("secrets/interpreter.txt", "/usr/bin/python3\n")
        .with_jsonc_config(
            r#"{
                "engine": { "command": "{env:CODEINTEL_TEST_ENGINE_BIN}" },
                "languageSettings": {
                    "Python": { "interpreter": "{file:secrets/interpreter.txt}" }
                }
            }"#,
        )
        .build();

    let (config, _) = Config::load(Some(project.path())).await.unwrap();

    assert_eq!(config.engine.as_ref().unwrap().command, "/opt/engine/bin/run");
    let preferences = config.preferences_for("Python", &[]);
    assert_eq!(preferences.settings["interpreter"], "/usr/bin/python3");
}

#[tokio::test]
async fn test_missing_env_reference_fails() {
    let project = TestProject::new()
        .with_config(r#"{ "engine": { "command": "{env:CODEINTEL_TEST_SURELY_UNSET}" } }"#)
        .build();

    let err = Config::load(Some(project.path())).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Config(ConfigError::EnvVarNotFound { ref name }) if name == "CODEINTEL_TEST_SURELY_UNSET"
    ));
}

#[tokio::test]
async fn test_invalid_json_names_the_file() {
    let project = TestProject::new().with_config("{ \"live\": }").build();

    let err = Config::load(Some(project.path())).await.unwrap_err();

    match err {
        CoreError::Config(ConfigError::InvalidJson { path, .. }) => {
            assert!(path.ends_with("codeintel.json"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
