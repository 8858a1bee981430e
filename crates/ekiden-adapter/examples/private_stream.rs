/*
[INPUT]:  EKIDEN_TOKEN environment variable
[OUTPUT]: Logged order and position updates
[POS]:    Examples - private account stream
[UPDATE]: When private stream API changes
*/

use ekiden_adapter::{ClientConfig, EkidenError, PrivateStream, TokenStore};
use tokio::time::{Duration, sleep};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ekiden_adapter::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let token = std::env::var("EKIDEN_TOKEN")
        .map_err(|_| EkidenError::Configuration("EKIDEN_TOKEN is not set".to_string()))?;

    let tokens = TokenStore::new();
    tokens.set_token(token);
    let stream = PrivateStream::new(&ClientConfig::testnet(), tokens)?;
    stream.connect().await?;

    let mut diagnostics = stream.connection().diagnostics();
    tokio::spawn(async move {
        while let Ok(diagnostic) = diagnostics.recv().await {
            warn!(?diagnostic, "stream diagnostic");
        }
    });

    let _orders = stream.subscribe_orders(|event| info!(data = %event.data, "order update"))?;
    let _positions =
        stream.subscribe_positions(|event| info!(data = %event.data, "position update"))?;

    sleep(Duration::from_secs(60)).await;
    stream.close();
    Ok(())
}
