//! Bank ledger server binary

use bank_core::{Config, LedgerEngine, Metrics, RocksStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting bank ledger server");

    // Load configuration
    let config = Config::from_env()?;

    // Open the durable store and the engine over it
    let store = Arc::new(RocksStore::open(&config)?);
    let metrics = Metrics::new()?;
    let _engine = LedgerEngine::new(store).with_metrics(metrics);
    tracing::info!(data_dir = ?config.data_dir, "Ledger opened successfully");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down bank ledger server");
    Ok(())
}
