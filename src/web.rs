#![cfg(not(tarpaulin_include))]

use fulfillment_board::{AppConfig, app};

/// Main entry point for the order board web server
///
/// Loads `.env` if present, reads the configuration from the environment and
/// serves the board until interrupted.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        e
    })?;

    app::run(config).await
}
