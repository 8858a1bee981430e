/*
[INPUT]:  Error sources (HTTP, gateway API, serialization, auth, WebSocket, encoder)
[OUTPUT]: Structured error types with context and classification helpers
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Ekiden adapter
#[derive(Error, Debug)]
pub enum EkidenError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// No token available, or the peer rejected it
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Required endpoint or setting missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed subscription request or connection misuse
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Encoder received a payload tag outside the known action set
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    /// Intent parameters failed client-side validation
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// Signing collaborator failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl EkidenError {
    /// Check if the error is transient.
    ///
    /// This is a hint for callers; the crate itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            EkidenError::Http(_) | EkidenError::WebSocket(_) => true,
            EkidenError::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        match self {
            EkidenError::Authentication { .. } => true,
            EkidenError::Api { code, .. } => *code == 401 || *code == 403,
            _ => false,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        EkidenError::Authentication {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EkidenError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        EkidenError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for Ekiden operations
pub type Result<T> = std::result::Result<T, EkidenError>;
