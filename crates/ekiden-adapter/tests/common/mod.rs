/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for ekiden-adapter tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ekiden_adapter::ws::ChannelTransportHandle;
use ekiden_adapter::{ClientConfig, Ed25519Signer, Handler, WsEvent};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Config pointing at a mock server, with no stream URLs
pub fn mock_config(server: &MockServer) -> ClientConfig {
    ClientConfig::with_urls(&server.uri(), None, None)
}

/// Stream config with a short heartbeat
pub fn stream_config(heartbeat: Duration) -> ClientConfig {
    let mut config = ClientConfig::with_urls(
        "http://localhost:8080",
        Some("ws://localhost:8080/ws/public"),
        Some("ws://localhost:8080/ws/private"),
    );
    config.heartbeat_interval = heartbeat;
    config
}

/// Deterministic signer for testing
pub fn test_signer() -> Ed25519Signer {
    Ed25519Signer::from_secret_key(&[1u8; 32])
}

/// Mock JWT token for testing
pub fn mock_jwt_token() -> String {
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.signature".to_string()
}

/// Handler that records every event it sees
pub fn recording_handler() -> (Handler, Arc<Mutex<Vec<WsEvent>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler = Handler::new(move |event: &WsEvent| sink.lock().unwrap().push(event.clone()));
    (handler, seen)
}

/// Next frame written by the client, parsed as JSON
pub async fn next_frame(handle: &mut ChannelTransportHandle) -> Value {
    tokio::time::timeout(FRAME_TIMEOUT, handle.next_sent_json())
        .await
        .expect("timed out waiting for outbound frame")
        .expect("transport closed")
}

/// Collect frames until one subscribes to `marker`; the marker frame is excluded
pub async fn frames_until_marker(handle: &mut ChannelTransportHandle, marker: &str) -> Vec<Value> {
    let mut frames = Vec::new();
    loop {
        let frame = next_frame(handle).await;
        if frame["op"] == "subscribe" && frame["args"] == json!([marker]) {
            return frames;
        }
        frames.push(frame);
    }
}

pub fn auth_ok() -> Value {
    json!({"op": "auth", "success": true, "user_id": "user-1", "req_id": "req_1"})
}

pub fn event(topic: &str, data: Value) -> Value {
    json!({"op": "event", "topic": topic, "data": data})
}

/// Poll until `check` holds or the frame timeout elapses
pub async fn wait_until(check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + FRAME_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
