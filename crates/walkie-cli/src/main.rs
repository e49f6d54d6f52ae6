//! walkie: demo driver for the peer-mesh session manager.
//!
//! Loads the TOML config, builds a small in-process mesh, dials it into a
//! full mesh and runs a push-to-talk round and a rename, logging the event
//! trail of every participant.

mod cli;
mod demo;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use walkie_common::ConfigError;
use walkie_config::{config_to_json, toml_loader, validation, WalkieConfig};

use crate::cli::Args;

fn load(args: &Args) -> Result<(WalkieConfig, Option<PathBuf>), ConfigError> {
    let (mut config, path) = match &args.config {
        Some(path) => {
            let path = PathBuf::from(path);
            (toml_loader::load_from_path(&path)?, Some(path))
        }
        None => (walkie_config::load_config()?, None),
    };
    if let Some(name) = &args.name {
        config.identity.display_name = name.trim().to_string();
    }
    validation::validate(&config)?;
    Ok((config, path))
}

fn save(config: &WalkieConfig, path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => walkie_config::save_config_to_path(config, path),
        None => walkie_config::save_config(config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let (config, path) = match load(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("walkie: {e}");
            return ExitCode::FAILURE;
        }
    };

    let directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.as_directive().to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive)),
        )
        .init();

    if args.print_config {
        println!("{}", config_to_json(&config));
        return ExitCode::SUCCESS;
    }
    if args.save_config {
        if let Err(e) = save(&config, path.as_deref()) {
            tracing::error!(error = %e, "Failed to save config");
            return ExitCode::FAILURE;
        }
        tracing::info!("Config saved");
    }

    match demo::run(&config, usize::from(args.peers)).await {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Demo failed");
            ExitCode::FAILURE
        }
    }
}
