//! Harness entrypoint: one HTTP listener serving /setup, /services, and /api.

use fixture_harness::{HarnessConfig, HarnessServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("fixture_harness=info".parse()?),
        )
        .init();

    let config = HarnessConfig::from_env();
    let server = HarnessServer::bind(&config).await?;
    tracing::info!("test server is listening on {}", server.base_url());
    server.run().await?;
    Ok(())
}
