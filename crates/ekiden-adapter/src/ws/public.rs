/*
[INPUT]:  ClientConfig (public stream URL) and per-market callbacks
[OUTPUT]: Typed orderbook, trade, ticker and kline subscriptions
[POS]:    WebSocket layer - public market data facade
[UPDATE]: When adding public channels or changing topic naming
*/

use serde_json::Value;

use super::connection::{Connection, ConnectionOptions, ConnectionState, Unsubscribe};
use super::message::{OrderbookEvent, TickerSnapshot, TradesEvent};
use super::registry::{Handler, SubscriptionRequest};
use super::transport::{TungsteniteTransport, WsTransport};
use crate::config::ClientConfig;
use crate::http::Result;

pub fn orderbook_topic(market_addr: &str) -> String {
    format!("orderbook/{market_addr}")
}

pub fn trade_topic(market_addr: &str) -> String {
    format!("trade/{market_addr}")
}

pub fn ticker_topic(symbol: &str) -> String {
    format!("ticker/{symbol}")
}

pub fn kline_topic(interval: &str, symbol: &str) -> String {
    format!("kline.{interval}.{symbol}")
}

/// Public market data stream; no authentication
#[derive(Debug, Clone)]
pub struct PublicStream {
    connection: Connection,
}

impl PublicStream {
    /// Stream over the configured public URL
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let url = config.require_ws_url()?;
        let transport = TungsteniteTransport::new(url, config.reconnect_delay);
        Ok(Self::with_transport(transport, config))
    }

    pub fn with_transport<T: WsTransport>(transport: T, config: &ClientConfig) -> Self {
        Self {
            connection: Connection::new(
                transport,
                ConnectionOptions::public(config.heartbeat_interval),
            ),
        }
    }

    pub async fn connect(&self) -> Result<()> {
        self.connection.connect().await
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn subscribe_orderbook<F>(&self, market_addr: &str, f: F) -> Result<Unsubscribe>
    where
        F: Fn(OrderbookEvent) + Send + Sync + 'static,
    {
        self.subscribe_typed(orderbook_topic(market_addr), f)
    }

    pub fn subscribe_trades<F>(&self, market_addr: &str, f: F) -> Result<Unsubscribe>
    where
        F: Fn(TradesEvent) + Send + Sync + 'static,
    {
        self.subscribe_typed(trade_topic(market_addr), f)
    }

    pub fn subscribe_ticker<F>(&self, symbol: &str, f: F) -> Result<Unsubscribe>
    where
        F: Fn(TickerSnapshot) + Send + Sync + 'static,
    {
        self.subscribe_typed(ticker_topic(symbol), f)
    }

    /// Kline payloads are passed through untyped
    pub fn subscribe_kline<F>(&self, interval: &str, symbol: &str, f: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscribe_typed(kline_topic(interval, symbol), f)
    }

    /// One handler for several raw topics
    pub fn subscribe_topics<I, S>(&self, topics: I, handler: Handler) -> Result<Unsubscribe>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connection
            .subscribe(SubscriptionRequest::topics(topics, handler))
    }

    pub fn subscribe_handlers<I, S>(&self, pairs: I) -> Result<Unsubscribe>
    where
        I: IntoIterator<Item = (S, Handler)>,
        S: Into<String>,
    {
        self.connection.subscribe(SubscriptionRequest::handlers(pairs))
    }

    pub fn unsubscribe_topics<I, S>(&self, topics: I, handler: Handler) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connection
            .unsubscribe(SubscriptionRequest::topics(topics, handler))
    }

    pub fn unsubscribe_handlers<I, S>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, Handler)>,
        S: Into<String>,
    {
        self.connection
            .unsubscribe(SubscriptionRequest::handlers(pairs))
    }

    pub fn close(&self) {
        self.connection.close();
    }

    fn subscribe_typed<T, F>(&self, topic: String, f: F) -> Result<Unsubscribe>
    where
        T: serde::de::DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.connection
            .subscribe(SubscriptionRequest::topic(topic, Handler::typed(f)))
    }
}
