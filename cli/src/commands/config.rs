// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use linkboards_core::domain::config::{LinkboardsConfig, ENV_CONFIG_PATH};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration as YAML
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Write the default configuration to a file
    Generate {
        #[arg(short, long, default_value = "./linkboards.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = LinkboardsConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        eprintln!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => eprintln!("  1. --config flag: {}", path.display()),
            None => eprintln!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        eprintln!(
            "  2. {}: {}",
            ENV_CONFIG_PATH,
            std::env::var(ENV_CONFIG_PATH)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        eprintln!("  3. ./linkboards.yaml");
        eprintln!("  4. ~/.linkboards/config.yaml");
        eprintln!("  5. /etc/linkboards/config.yaml");
        eprintln!();
    }

    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    let config = LinkboardsConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    eprintln!("{}", "✓ Configuration is valid".green());
    Ok(())
}

fn generate(output: PathBuf) -> Result<()> {
    if output.exists() {
        anyhow::bail!("Refusing to overwrite existing file {}", output.display());
    }

    LinkboardsConfig::default()
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    eprintln!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );
    Ok(())
}
