//! Configuration for the code intelligence coordinator.
//!
//! Configuration is loaded from multiple sources and merged, later sources
//! taking precedence:
//! 1. Global config: `~/.config/codeintel/config.json`
//! 2. Environment variable: `CODEINTEL_CONFIG_CONTENT`
//! 3. Project config: `codeintel.jsonc` or `codeintel.json` in the project directory
//!
//! Supports JSONC (JSON with comments) and variable substitution:
//! - `{env:VAR_NAME}` - Substitute environment variable
//! - `{file:path}` - Substitute file contents

use crate::error::{ConfigError, CoreResult};
use codeintel_engine::{EngineCommand, Preferences};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment variable holding inline configuration.
pub const CONFIG_ENV_VAR: &str = "CODEINTEL_CONFIG_CONTENT";

/// Default capacity of the per-window jump history.
pub const DEFAULT_HISTORY_SIZE: usize = 64;

/// Syntax names mapped to an engine language unless configured otherwise.
const BUILTIN_SYNTAX_MAP: &[(&str, &str)] = &[("Python Django", "Python")];

static VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

fn var_regex() -> &'static regex::Regex {
    VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\{(env|file):([^}]+)\}")
            .expect("Invalid regex pattern - this is a compile-time constant")
    })
}

/// Where call-tips are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipMode {
    /// Reuse the completion popup.
    #[default]
    Popup,
    /// Show on the status bar.
    Status,
    /// Show in an output panel.
    Panel,
}

/// Per-language overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LanguageSettings {
    /// Extra scan directories for this language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_extra_paths: Option<Vec<PathBuf>>,

    /// Excluded scan directories for this language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_exclude_paths: Option<Vec<PathBuf>>,

    /// Engine settings passed through untouched.
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// JSON Schema reference.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Master switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Trigger on typing, not only on explicit commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<bool>,

    /// Languages the coordinator ignores entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_languages: Option<Vec<String>>,

    /// Languages that only respond to explicit commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_disabled_languages: Option<Vec<String>>,

    /// Editor syntax name to engine language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax_map: Option<HashMap<String, String>>,

    /// Engine settings shared by every language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_extra_paths: Option<Vec<PathBuf>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_exclude_paths: Option<Vec<PathBuf>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_settings: Option<HashMap<String, LanguageSettings>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltips: Option<TooltipMode>,

    /// Capacity of the per-window jump history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_size: Option<usize>,

    /// Engine launch command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineCommand>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Returns the merged config and the files it was read from.
    pub async fn load(project_dir: Option<&Path>) -> CoreResult<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        if let Some(global_dir) = Self::global_config_dir() {
            for name in &["config.json", "codeintel.json", "codeintel.jsonc"] {
                let path = global_dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        if let Ok(content) = std::env::var(CONFIG_ENV_VAR) {
            let loaded = Self::parse_jsonc(&content, "<env>")?;
            config = config.merge(loaded);
        }

        if let Some(dir) = project_dir {
            for name in &["codeintel.jsonc", "codeintel.json"] {
                let path = dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        Ok((config, sources))
    }

    /// Get the global config directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            if let Some(home) = dirs::home_dir() {
                let xdg_config = home.join(".config").join("codeintel");
                if xdg_config.exists() {
                    return Some(xdg_config);
                }
            }
        }

        dirs::config_dir().map(|d| d.join("codeintel"))
    }

    /// Load a single config file.
    pub async fn load_file(path: &Path) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = Self::substitute_variables(&content, path)?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Parse JSONC content.
    pub fn parse_jsonc(content: &str, source: &str) -> CoreResult<Self> {
        let stripped = Self::strip_comments(content);
        serde_json::from_str(&stripped).map_err(|e| {
            ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Strip `//` and `/* */` comments, leaving string contents alone.
    pub fn strip_comments(content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();
        let mut in_string = false;
        let mut escaped = false;

        while let Some(c) = chars.next() {
            if in_string {
                result.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }

            match (c, chars.peek()) {
                ('"', _) => {
                    in_string = true;
                    result.push(c);
                }
                ('/', Some('/')) => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            result.push('\n');
                            break;
                        }
                    }
                }
                ('/', Some('*')) => {
                    chars.next();
                    let mut prev = ' ';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        // Keep line numbers stable for parse errors
                        if c == '\n' {
                            result.push('\n');
                        }
                        prev = c;
                    }
                }
                _ => result.push(c),
            }
        }

        result
    }

    /// Substitute `{env:NAME}` and `{file:path}` references.
    ///
    /// File references are resolved relative to the config file.
    fn substitute_variables(content: &str, config_path: &Path) -> CoreResult<String> {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        let mut result = content.to_string();

        for cap in var_regex().captures_iter(content) {
            let (Some(full), Some(kind), Some(value)) = (cap.get(0), cap.get(1), cap.get(2))
            else {
                continue;
            };
            let value = value.as_str();

            let replacement = match kind.as_str() {
                "env" => std::env::var(value).map_err(|_| ConfigError::EnvVarNotFound {
                    name: value.to_string(),
                })?,
                "file" => {
                    let path = if let Some(rest) = value.strip_prefix("~/") {
                        dirs::home_dir()
                            .ok_or_else(|| ConfigError::InvalidPath(value.to_string()))?
                            .join(rest)
                    } else {
                        config_dir.join(value)
                    };
                    std::fs::read_to_string(&path)
                        .map_err(|_| ConfigError::FileRefNotFound {
                            path: path.display().to_string(),
                        })?
                        .trim()
                        .to_string()
                }
                _ => continue,
            };

            // Escape so the substituted text stays a valid JSON string body
            let escaped = serde_json::to_string(&replacement)?;
            let escaped = &escaped[1..escaped.len() - 1];
            result = result.replace(full.as_str(), escaped);
        }

        Ok(result)
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Maps are merged key by key; everything else is replaced wholesale.
    pub fn merge(mut self, other: Config) -> Self {
        if other.schema.is_some() {
            self.schema = other.schema;
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.live.is_some() {
            self.live = other.live;
        }
        if other.disabled_languages.is_some() {
            self.disabled_languages = other.disabled_languages;
        }
        if other.live_disabled_languages.is_some() {
            self.live_disabled_languages = other.live_disabled_languages;
        }
        if other.scan_extra_paths.is_some() {
            self.scan_extra_paths = other.scan_extra_paths;
        }
        if other.scan_exclude_paths.is_some() {
            self.scan_exclude_paths = other.scan_exclude_paths;
        }
        if other.tooltips.is_some() {
            self.tooltips = other.tooltips;
        }
        if other.history_size.is_some() {
            self.history_size = other.history_size;
        }
        if other.engine.is_some() {
            self.engine = other.engine;
        }

        if let Some(map) = other.syntax_map {
            self.syntax_map.get_or_insert_with(HashMap::new).extend(map);
        }
        if let Some(settings) = other.settings {
            self.settings.get_or_insert_with(Map::new).extend(settings);
        }
        if let Some(languages) = other.language_settings {
            self.language_settings
                .get_or_insert_with(HashMap::new)
                .extend(languages);
        }

        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Whether typing triggers requests for `language`.
    pub fn is_live_for(&self, language: &str) -> bool {
        self.is_language_enabled(language)
            && self.live.unwrap_or(true)
            && !contains(&self.live_disabled_languages, language)
    }

    /// Whether `language` is handled at all.
    pub fn is_language_enabled(&self, language: &str) -> bool {
        self.is_enabled() && !contains(&self.disabled_languages, language)
    }

    pub fn tooltip_mode(&self) -> TooltipMode {
        self.tooltips.unwrap_or_default()
    }

    pub fn history_size(&self) -> usize {
        self.history_size.unwrap_or(DEFAULT_HISTORY_SIZE)
    }

    /// Map an editor syntax to the engine's language name.
    ///
    /// Accepts either a bare name (`Python`) or a syntax definition path
    /// (`Packages/Python/Python.sublime-syntax`), in which case the file
    /// stem is used.
    pub fn language_for_syntax(&self, syntax: &str) -> String {
        let name = Path::new(syntax)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|_| syntax.contains('/') || syntax.contains('\\'))
            .unwrap_or(syntax);

        if let Some(mapped) = self.syntax_map.as_ref().and_then(|m| m.get(name)) {
            return mapped.clone();
        }
        BUILTIN_SYNTAX_MAP
            .iter()
            .find(|(from, _)| *from == name)
            .map(|(_, to)| (*to).to_string())
            .unwrap_or_else(|| name.to_string())
    }

    /// Build the preferences sent with a request for `language`.
    ///
    /// Language settings overlay the global ones. Extra paths are the
    /// global list, then the language's list, then the project folders,
    /// with duplicates dropped.
    pub fn preferences_for(&self, language: &str, project_folders: &[PathBuf]) -> Preferences {
        let language_settings = self
            .language_settings
            .as_ref()
            .and_then(|m| m.get(language));

        let mut settings = self.settings.clone().unwrap_or_default();
        let mut extra_paths = self.scan_extra_paths.clone().unwrap_or_default();
        let mut exclude_paths = self.scan_exclude_paths.clone().unwrap_or_default();

        if let Some(lang) = language_settings {
            settings.extend(lang.settings.clone());
            extra_paths.extend(lang.scan_extra_paths.iter().flatten().cloned());
            exclude_paths.extend(lang.scan_exclude_paths.iter().flatten().cloned());
        }
        extra_paths.extend(project_folders.iter().cloned());

        Preferences {
            settings,
            extra_paths: dedup(extra_paths),
            exclude_paths: dedup(exclude_paths),
        }
    }
}

fn contains(list: &Option<Vec<String>>, language: &str) -> bool {
    list.as_ref()
        .is_some_and(|l| l.iter().any(|s| s.eq_ignore_ascii_case(language)))
}

fn dedup(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}
