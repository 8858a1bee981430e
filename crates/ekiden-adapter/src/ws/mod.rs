/*
[INPUT]:  WebSocket configuration, bearer tokens and topic subscriptions
[OUTPUT]: Real-time market data and account updates routed to handlers
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod connection;
pub mod message;
pub mod private;
pub mod public;
pub mod registry;
pub mod transport;

pub use connection::{
    AuthMode, Connection, ConnectionOptions, ConnectionState, Diagnostic, Unsubscribe,
};
pub use message::{
    InboundFrame, OrderbookEvent, OutboundFrame, PriceLevel, TickerSnapshot, Trade, TradesEvent,
    WsEvent,
};
pub use private::PrivateStream;
pub use public::PublicStream;
pub use registry::{Handler, SubscriptionRequest, TopicRegistry};
pub use transport::{
    ChannelTransport, ChannelTransportHandle, TransportEvent, TungsteniteTransport, WsTransport,
};
