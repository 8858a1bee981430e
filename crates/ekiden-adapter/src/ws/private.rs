/*
[INPUT]:  ClientConfig (private stream URL), a TokenStore and account callbacks
[OUTPUT]: Authenticated order, position, execution and balance subscriptions
[POS]:    WebSocket layer - private account facade
[UPDATE]: When adding private channels or changing auth handshake
*/

use super::connection::{Connection, ConnectionOptions, ConnectionState, Unsubscribe};
use super::message::WsEvent;
use super::registry::{Handler, SubscriptionRequest};
use super::transport::{TungsteniteTransport, WsTransport};
use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::http::Result;

pub const ORDER_TOPIC: &str = "order";
pub const POSITION_TOPIC: &str = "position";
pub const EXECUTION_TOPIC: &str = "execution";
pub const ACCOUNT_BALANCE_TOPIC: &str = "account_balance";

/// Private account stream authenticated with a bearer token.
///
/// Share the [`TokenStore`] with a `GatewayClient` to keep both on the same
/// token. `connect` waits until a token is available.
#[derive(Debug, Clone)]
pub struct PrivateStream {
    connection: Connection,
}

impl PrivateStream {
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self> {
        let url = config.require_private_ws_url()?;
        let transport = TungsteniteTransport::new(url, config.reconnect_delay);
        Ok(Self::with_transport(transport, config, tokens))
    }

    pub fn with_transport<T: WsTransport>(
        transport: T,
        config: &ClientConfig,
        tokens: TokenStore,
    ) -> Self {
        Self {
            connection: Connection::new(
                transport,
                ConnectionOptions::private(config.heartbeat_interval, tokens),
            ),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.connection.set_token(token);
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

    pub fn subscribe_orders<F>(&self, f: F) -> Result<Unsubscribe>
    where
        F: Fn(&WsEvent) + Send + Sync + 'static,
    {
        self.subscribe_one(ORDER_TOPIC, f)
    }

    pub fn subscribe_positions<F>(&self, f: F) -> Result<Unsubscribe>
    where
        F: Fn(&WsEvent) + Send + Sync + 'static,
    {
        self.subscribe_one(POSITION_TOPIC, f)
    }

    pub fn subscribe_executions<F>(&self, f: F) -> Result<Unsubscribe>
    where
        F: Fn(&WsEvent) + Send + Sync + 'static,
    {
        self.subscribe_one(EXECUTION_TOPIC, f)
    }

    pub fn subscribe_account_balance<F>(&self, f: F) -> Result<Unsubscribe>
    where
        F: Fn(&WsEvent) + Send + Sync + 'static,
    {
        self.subscribe_one(ACCOUNT_BALANCE_TOPIC, f)
    }

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

    fn subscribe_one<F>(&self, topic: &str, f: F) -> Result<Unsubscribe>
    where
        F: Fn(&WsEvent) + Send + Sync + 'static,
    {
        self.connection
            .subscribe(SubscriptionRequest::topic(topic, Handler::new(f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::EkidenError;

    #[test]
    fn test_missing_private_url_is_configuration_error() {
        let config = ClientConfig::with_urls("https://example.com", Some("wss://x/ws"), None);
        assert!(matches!(
            PrivateStream::new(&config, TokenStore::new()),
            Err(EkidenError::Configuration(_))
        ));
    }
}
