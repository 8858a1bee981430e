/*
[INPUT]:  Testnet public stream URL and a market address
[OUTPUT]: Logged orderbook and trade updates
[POS]:    Examples - public market data stream
[UPDATE]: When public stream API changes
*/

use ekiden_adapter::ws::OrderbookEvent;
use ekiden_adapter::{ClientConfig, PublicStream};
use tokio::time::{Duration, sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Example: public market data
///
/// Usage: `cargo run --example public_stream -- <market_addr>`
#[tokio::main]
async fn main() -> ekiden_adapter::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let market = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0x88f4f63b3a9a7b6b7e3bb09e2a4c1e11".to_string());

    let stream = PublicStream::new(&ClientConfig::testnet())?;
    stream.connect().await?;
    info!(market = %market, "public stream connected");

    let book = stream.subscribe_orderbook(&market, |event| match event {
        OrderbookEvent::OrderbookSnapshot { asks, bids, seq, .. } => {
            info!(seq, asks = asks.len(), bids = bids.len(), "orderbook snapshot");
        }
        OrderbookEvent::OrderbookDelta { asks, bids, seq, .. } => {
            info!(seq, asks = asks.len(), bids = bids.len(), "orderbook delta");
        }
    })?;
    let trades = stream.subscribe_trades(&market, |event| {
        for trade in event.trades {
            info!(price = %trade.price, size = %trade.size, side = %trade.side, "trade");
        }
    })?;

    sleep(Duration::from_secs(30)).await;

    book.unsubscribe()?;
    trades.unsubscribe()?;
    stream.close();
    Ok(())
}
