/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Ekiden gateway client surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod http;
pub mod intent;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{Ed25519Signer, IntentSigner, TokenData, TokenStore};

pub use config::ClientConfig;

// Re-export commonly used types from http
pub use http::{EkidenError, GatewayClient, Result};

pub use intent::{SignedIntent, current_nonce, encode_intent, encode_intent_value, order_sid};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    Connection, ConnectionState, Handler, PrivateStream, PublicStream, SubscriptionRequest,
    Unsubscribe, WsEvent,
};
