//! The `config` command.

use codeintel_core::Config;
use std::path::Path;

/// Print configuration sources and the merged result.
pub async fn show_config(project: &Path) -> anyhow::Result<()> {
    let (config, sources) = Config::load(Some(project)).await?;

    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none)");
    } else {
        for source in &sources {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
