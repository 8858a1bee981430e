/*
[INPUT]:  HTTP client configuration and gateway endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod intent;

pub use error::{EkidenError, Result};

pub use client::GatewayClient;
