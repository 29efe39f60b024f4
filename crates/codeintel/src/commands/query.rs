//! Headless engine queries: `languages`, `complete` and `definition`.

use super::console::{cursor_offset, syntax_for_path, ConsoleEditor, VIEW};
use anyhow::{bail, Context};
use codeintel_core::{Config, Coordinator, EditorSurface};
use codeintel_engine::{EngineClient, ProcessEngine};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// What to ask the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Complete,
    Definition,
}

/// Load the project config and start the engine it names.
async fn start_engine(project: &Path) -> anyhow::Result<(Config, Arc<ProcessEngine>)> {
    let (config, sources) = Config::load(Some(project)).await?;
    debug!(?sources, "Configuration loaded");

    let Some(command) = config.engine.clone() else {
        bail!("No engine configured; set \"engine\" in codeintel.json");
    };
    info!(command = %command.command, "Starting engine");
    let engine = ProcessEngine::spawn(&command, Some(project))
        .await
        .with_context(|| format!("Failed to start engine '{}'", command.command))?;
    Ok((config, Arc::new(engine)))
}

/// List the languages the configured engine supports.
pub async fn list_languages(project: &Path) -> anyhow::Result<()> {
    let (_, engine) = start_engine(project).await?;

    let languages = engine.languages();
    if languages.is_empty() {
        println!("The engine reported no languages.");
    } else {
        println!("Supported languages:");
        for language in &languages {
            println!("  {language}");
        }
    }

    engine.close().await?;
    Ok(())
}

/// Run one query against `file` at a 1-based position and print the result.
pub async fn run_query(
    project: &Path,
    file: &Path,
    line: usize,
    col: usize,
    query: Query,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let Some(cursor) = cursor_offset(&text, line, col) else {
        bail!("Position {line}:{col} is outside {}", file.display());
    };

    let (config, engine) = start_engine(project).await?;
    let syntax = syntax_for_path(file);
    let language = config.language_for_syntax(&syntax);
    if !engine.languages().contains(&language) {
        engine.close().await?;
        bail!("The engine does not support {language}");
    }

    let preferences = config.preferences_for(&language, &[project.to_path_buf()]);
    engine
        .set_global_environment(std::env::vars().collect(), preferences)
        .await?;

    let editor = Arc::new(ConsoleEditor::new(file, syntax, text, cursor, project));
    let client: Arc<dyn EngineClient> = engine.clone();
    let surface: Arc<dyn EditorSurface> = editor.clone();
    let coordinator = Coordinator::new(client, surface, config);
    coordinator.start_event_pump();

    match query {
        Query::Complete => coordinator.autocomplete(VIEW),
        Query::Definition => coordinator.goto_definition(VIEW),
    }
    coordinator.settle().await;

    match query {
        Query::Complete => match coordinator.on_query_completions(VIEW) {
            Some(items) if editor.completions_shown() => {
                for item in items {
                    println!("{}\t{}", item.label, item.insertion);
                }
            }
            _ => println!("No completions"),
        },
        Query::Definition => {
            if editor.opened().is_empty() {
                println!("No definition found");
            }
        }
    }

    coordinator.shutdown();
    engine.close().await?;
    Ok(())
}
