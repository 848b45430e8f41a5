// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Result};
use tfs_gateway::{config, server};
use tracing::{error, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Rejects log levels the subscriber would not accept.
fn check_log_level(level: &str) -> Result<()> {
    if level.parse::<LevelFilter>().is_err() {
        bail!("invalid log level '{level}', expected one of: error, warn, info, debug, trace");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Tracing is not installed yet, so configuration failures go to stderr.
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());
    if let Err(e) = check_log_level(&log_level) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .json()
        .init();

    info!(
        backend = %config.backend.addr,
        model = %config.backend.model_name,
        port = config.server.port,
        "starting prediction gateway"
    );

    // A model that never becomes available takes the process down with it.
    if let Err(e) = server::run(config).await {
        error!("gateway terminated: {e}");
        std::process::exit(1);
    }

    Ok(())
}
