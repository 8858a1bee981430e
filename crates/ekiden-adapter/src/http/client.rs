/*
[INPUT]:  Client configuration (base URL, API prefix, timeouts) and bearer token
[OUTPUT]: Configured reqwest client and typed gateway responses
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::http::{EkidenError, Result};

/// HTTP client for the gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http_client: Client,
    base_url: String,
    api_prefix: String,
    tokens: TokenStore,
}

impl GatewayClient {
    /// Create a new client with the default (testnet) configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        Self::with_token_store(config, TokenStore::new())
    }

    /// Create a client that shares `tokens` with other components
    pub fn with_token_store(config: &ClientConfig, tokens: TokenStore) -> Result<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_prefix: config.api_prefix.clone(),
            tokens,
        })
    }

    /// Set the bearer token used for authenticated endpoints
    pub fn set_token(&self, token: impl Into<String>) {
        self.tokens.set_token(token);
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Build full URL: base URL + API prefix + endpoint
    fn url(&self, endpoint: &str) -> Result<Url> {
        let raw = format!("{}{}{}", self.base_url, self.api_prefix, endpoint);
        Ok(Url::parse(&raw)?)
    }

    /// Build request builder for public endpoints
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder carrying the bearer token
    pub(crate) fn authed_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let token = self
            .tokens
            .get_token()
            .ok_or_else(|| EkidenError::authentication("Not authenticated"))?;
        Ok(self.request(method, endpoint)?.bearer_auth(token))
    }

    /// Send a request and decode a JSON body, mapping non-2xx to `Api` errors
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            EkidenError::InvalidResponse(format!("failed to decode response body: {e}"))
        })
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let raw = response.text().await.unwrap_or_default();
    let detail = error_detail(&raw);
    debug!(status = status.as_u16(), path = %path, "gateway request failed");

    Err(EkidenError::api_error(
        status,
        format!("{path} failed with status {}: {detail}", status.as_u16()),
    ))
}

/// Pull the human-readable reason out of an error body
fn error_detail(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::String(message)) => message,
        Ok(value) => value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_default(),
        Err(_) => raw.to_string(),
    }
}
