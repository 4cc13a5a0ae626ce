// Declare the modules
pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod prompt;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;

use crate::api::{HuggingFaceProvider, LLMApiProvider};
use crate::config::AppConfig;
use crate::state::Session;
use anyhow::Context;
use std::sync::Arc;
use tokio::io::BufReader;

pub use crate::error::{Result, RoastError};

/// Starts the terminal front-end. Configuration problems stop the process
/// before any request is made.
pub async fn run() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    log::info!(
        "Using model {} at {} (prompt route: {:?})",
        config.model.model,
        config.model.api_url,
        config.model.prompt_route
    );

    // Create the API provider instance
    let api_provider: Arc<dyn LLMApiProvider> =
        Arc::new(HuggingFaceProvider::new(config.model.request_timeout)?);

    let mut session = Session::new(config, api_provider)?;

    commands::run_terminal(
        &mut session,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}
