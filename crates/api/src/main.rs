//! FieldWatch Alert Engine - Main Entry Point

use api::{init_logging, run_server};
use pipeline::EngineConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FIELDWATCH_CONFIG").ok());
    let config = EngineConfig::load(path.as_deref())?;
    init_logging(&config.logging)?;

    info!("=== FieldWatch Alert Engine v{} ===", env!("CARGO_PKG_VERSION"));
    run_server(config).await?;

    Ok(())
}
