//! Configuration management commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;

use placereviews::config::Config;

/// Print the effective configuration (file, defaults and env overrides).
pub async fn cmd_config_show(explicit: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(explicit).await?;
    let source = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Config::discover().await,
    };
    match source {
        Some(path) => eprintln!("{} Source: {}", style("→").dim(), path.display()),
        None => eprintln!("{} Source: built-in defaults", style("→").dim()),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Write the default configuration to `path` or the default location.
pub fn cmd_config_init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path
        .or_else(Config::default_path)
        .context("Could not determine a config directory; pass a path")?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    Config::default().save(&path)?;
    println!(
        "{} Wrote default config to {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}
