//! Simple test harness for the recommendation service.
//!
//! Loads the configured tables, fits both models and writes a full
//! submission, logging each step.
//!
//! Usage: `server [CONFIG_DIR]` (defaults to `configs`)

use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{RecommendationService, ServiceConfig};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,models=debug,pipeline=debug")),
        )
        .init();

    let config_dir = env::args().nth(1).unwrap_or_else(|| "configs".to_string());
    info!("Starting book recommendation harness with configs from {}", config_dir);

    let config = ServiceConfig::load_dir(&config_dir).context("Failed to load configuration")?;
    let mut service = RecommendationService::from_config(config).context("Failed to build service")?;
    info!("{}", service.info());

    let state = service.fit();
    info!("Models trained at {} (generation {})", state.fitted_at, state.generation);

    let start = Instant::now();
    let path = service.predict_and_save().context("Failed to produce predictions")?;
    info!(
        "Predictions for {} users written to {} in {:.2?}",
        service.user_ids().len(),
        path.display(),
        start.elapsed()
    );

    Ok(())
}
