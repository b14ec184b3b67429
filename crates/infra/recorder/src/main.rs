//! bStat recorder binary.
//!
//! Usage: `bstat-recorder [config.toml] < events.jsonl`

use bstat_recorder::{DEFAULT_CONFIG_PATH, RecorderService, load_config_or_default};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = load_config_or_default(&config_path)?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = %config_path, "Loaded configuration");

    // Record stdin until EOF
    let service = RecorderService::from_config(&config).await?;
    let summary = service.run(BufReader::new(tokio::io::stdin())).await?;

    tracing::info!(
        recorded = summary.recorded,
        malformed = summary.malformed,
        failed = summary.failed,
        "Input exhausted"
    );

    Ok(())
}
