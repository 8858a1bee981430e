/*
[INPUT]:  A WebSocket URL or an in-memory event channel
[OUTPUT]: Opened/message/error/closed transport events and a text send path
[POS]:    WebSocket layer - socket plumbing beneath the connection state machine
[UPDATE]: When changing reconnect behavior or adding transport backends
*/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::http::{EkidenError, Result};

/// Lifecycle and data notifications raised by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Error(String),
    Closed,
}

/// Bidirectional text transport driven by the connection event loop.
///
/// Implementations own their reconnect policy: after `Closed` they may
/// emit `Opened` again. `recv` must be cancel-safe. Returning `None`
/// ends the connection for good.
#[async_trait]
pub trait WsTransport: Send + 'static {
    async fn recv(&mut self) -> Option<TransportEvent>;

    async fn send(&mut self, text: String) -> Result<()>;

    async fn close(&mut self);
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Outbound = Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>;

/// tokio-tungstenite transport with a fixed reconnect delay.
///
/// The socket lives in a spawned task that reports through a channel, so an
/// interrupted `recv` never abandons a handshake. Frames written while the
/// socket is down are rejected rather than held for the next connection.
pub struct TungsteniteTransport {
    url: String,
    reconnect_delay: Duration,
    // Taken when the socket task starts
    events_tx: Option<mpsc::UnboundedSender<TransportEvent>>,
    events_rx: mpsc::UnboundedReceiver<TransportEvent>,
    outbound: Outbound,
    shut_down: bool,
}

impl TungsteniteTransport {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            url: url.into(),
            reconnect_delay,
            events_tx: Some(events_tx),
            events_rx,
            outbound: Arc::new(Mutex::new(None)),
            shut_down: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WsTransport for TungsteniteTransport {
    async fn recv(&mut self) -> Option<TransportEvent> {
        if self.shut_down {
            return None;
        }
        if let Some(events_tx) = self.events_tx.take() {
            let task = SocketTask {
                url: self.url.clone(),
                reconnect_delay: self.reconnect_delay,
                events: events_tx,
                outbound: self.outbound.clone(),
            };
            tokio::spawn(task.run());
        }
        self.events_rx.recv().await
    }

    async fn send(&mut self, text: String) -> Result<()> {
        let sender = lock_outbound(&self.outbound).clone();
        let Some(sender) = sender else {
            return Err(EkidenError::WebSocket("transport not open".to_string()));
        };
        sender
            .send(text)
            .map_err(|_| EkidenError::WebSocket("transport not open".to_string()))
    }

    async fn close(&mut self) {
        self.shut_down = true;
        self.events_rx.close();
        // The writer sends a close frame once its sender is gone
        lock_outbound(&self.outbound).take();
    }
}

fn lock_outbound(
    outbound: &Outbound,
) -> MutexGuard<'_, Option<mpsc::UnboundedSender<String>>> {
    outbound.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connect/read/write loop behind [`TungsteniteTransport`]
struct SocketTask {
    url: String,
    reconnect_delay: Duration,
    events: mpsc::UnboundedSender<TransportEvent>,
    outbound: Outbound,
}

impl SocketTask {
    async fn run(self) {
        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                tokio::select! {
                    _ = self.events.closed() => break,
                    _ = tokio::time::sleep(self.reconnect_delay) => {}
                }
            }
            attempt = attempt.saturating_add(1);

            let connected = tokio::select! {
                _ = self.events.closed() => break,
                result = connect_async(self.url.as_str()) => result,
            };
            let stream = match connected {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!(url = %self.url, attempt, error = %e, "ws connect failed");
                    if self.events.send(TransportEvent::Error(e.to_string())).is_err() {
                        break;
                    }
                    continue;
                }
            };

            info!(url = %self.url, "ws transport opened");
            attempt = 1;
            let (writer_tx, writer_rx) = mpsc::unbounded_channel();
            *lock_outbound(&self.outbound) = Some(writer_tx);
            if self.events.send(TransportEvent::Opened).is_err() {
                lock_outbound(&self.outbound).take();
                break;
            }

            self.pump(stream, writer_rx).await;
            lock_outbound(&self.outbound).take();
            if self.events.send(TransportEvent::Closed).is_err() {
                break;
            }
        }
        debug!(url = %self.url, "ws socket task stopped");
    }

    /// Drive one socket until it ends, errors or loses its writer
    async fn pump(&self, stream: WsStream, mut writer_rx: mpsc::UnboundedReceiver<String>) {
        let (mut write, mut read) = stream.split();
        loop {
            tokio::select! {
                outgoing = writer_rx.recv() => match outgoing {
                    Some(text) => {
                        if let Err(e) = write.send(WsMessage::Text(text.into())).await {
                            warn!(error = %e, "ws send failed");
                            self.report(TransportEvent::Error(format!("send failed: {e}")));
                            return;
                        }
                    }
                    None => {
                        if let Err(e) = write.send(WsMessage::Close(None)).await {
                            debug!(error = %e, "ws close handshake failed");
                        }
                        return;
                    }
                },
                incoming = read.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        if !self.report(TransportEvent::Message(text.as_str().to_owned())) {
                            return;
                        }
                    }
                    Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => {
                            if !self.report(TransportEvent::Message(text)) {
                                return;
                            }
                        }
                        Err(_) => debug!(len = bytes.len(), "dropping non-utf8 binary frame"),
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!(?frame, "ws closed by peer");
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "ws read error");
                        self.report(TransportEvent::Error(e.to_string()));
                        return;
                    }
                    None => {
                        info!("ws stream ended");
                        return;
                    }
                },
            }
        }
    }

    /// False once the transport has been closed or dropped
    fn report(&self, event: TransportEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

/// In-memory transport; the paired handle plays the server side
pub struct ChannelTransport {
    events_rx: mpsc::UnboundedReceiver<TransportEvent>,
    sent_tx: mpsc::UnboundedSender<String>,
    open: bool,
}

/// Server side of a [`ChannelTransport`]
pub struct ChannelTransportHandle {
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    sent_rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelTransport {
    pub fn pair() -> (Self, ChannelTransportHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        (
            Self {
                events_rx,
                sent_tx,
                open: false,
            },
            ChannelTransportHandle { events_tx, sent_rx },
        )
    }
}

#[async_trait]
impl WsTransport for ChannelTransport {
    async fn recv(&mut self) -> Option<TransportEvent> {
        let event = self.events_rx.recv().await?;
        match event {
            TransportEvent::Opened => self.open = true,
            TransportEvent::Closed => self.open = false,
            _ => {}
        }
        Some(event)
    }

    async fn send(&mut self, text: String) -> Result<()> {
        if !self.open {
            return Err(EkidenError::WebSocket("transport not open".to_string()));
        }
        self.sent_tx
            .send(text)
            .map_err(|_| EkidenError::WebSocket("peer dropped".to_string()))
    }

    async fn close(&mut self) {
        self.open = false;
        self.events_rx.close();
    }
}

impl ChannelTransportHandle {
    pub fn open(&self) {
        self.push(TransportEvent::Opened);
    }

    pub fn close(&self) {
        self.push(TransportEvent::Closed);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(TransportEvent::Error(message.into()));
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(TransportEvent::Message(text.into()));
    }

    pub fn push_json(&self, value: &serde_json::Value) {
        self.push_text(value.to_string());
    }

    /// Next frame the client wrote, waiting if none yet
    pub async fn next_sent(&mut self) -> Option<String> {
        self.sent_rx.recv().await
    }

    pub async fn next_sent_json(&mut self) -> Option<serde_json::Value> {
        let text = self.next_sent().await?;
        serde_json::from_str(&text).ok()
    }

    pub fn try_next_sent(&mut self) -> Option<String> {
        self.sent_rx.try_recv().ok()
    }

    fn push(&self, event: TransportEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("channel transport already closed");
        }
    }
}
