use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use shuntflow_core::config::SessionConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the default config to this file instead of stdout
    #[arg(short, long, conflicts_with = "check")]
    pub output: Option<PathBuf>,

    /// Load and validate an existing config, printing it with defaults filled in
    #[arg(long, value_name = "FILE")]
    pub check: Option<PathBuf>,
}

/// Read a session config from TOML and validate it.
pub fn load_session_config(path: &Path) -> Result<SessionConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: SessionConfig = toml::from_str(&contents)
        .with_context(|| format!("Invalid session config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    if let Some(ref path) = args.check {
        let config = load_session_config(path)?;
        println!("# {} is valid", path.display());
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let defaults = toml::to_string_pretty(&SessionConfig::default())?;
    match args.output {
        Some(ref path) => {
            std::fs::write(path, &defaults)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!("Default config saved to {}", path.display());
        }
        None => print!("{defaults}"),
    }
    Ok(())
}
