/*
[INPUT]:  A WsTransport, auth mode, heartbeat interval and token store
[OUTPUT]: Authenticated stream with topic routing, replay and heartbeat
[POS]:    WebSocket layer - connection state machine shared by both facades
[UPDATE]: When changing auth handshake, reconnect replay or frame routing
*/

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::message::{InboundFrame, OutboundFrame, WsEvent};
use super::registry::{Handler, SubscriptionRequest, TopicRegistry};
use super::transport::{TransportEvent, WsTransport};
use crate::auth::TokenStore;
use crate::config::DEFAULT_HEARTBEAT_INTERVAL;
use crate::http::{EkidenError, Result};

const DIAGNOSTIC_CAPACITY: usize = 64;
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingAuth,
    Authenticated,
    Closed,
}

/// How the connection becomes `Authenticated` once the transport opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Public streams: open transport means authenticated
    None,
    /// Private streams: send `{op:"auth", bearer}` and wait for the reply
    Bearer,
}

#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub auth: AuthMode,
    pub heartbeat_interval: Duration,
    pub tokens: TokenStore,
}

impl ConnectionOptions {
    pub fn public(heartbeat_interval: Duration) -> Self {
        Self {
            auth: AuthMode::None,
            heartbeat_interval,
            tokens: TokenStore::new(),
        }
    }

    pub fn private(heartbeat_interval: Duration, tokens: TokenStore) -> Self {
        Self {
            auth: AuthMode::Bearer,
            heartbeat_interval,
            tokens,
        }
    }
}

/// Out-of-band notices for callers that want more than log lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    PeerError {
        message: String,
        req_id: Option<String>,
    },
    AuthRejected {
        message: String,
    },
    MalformedFrame {
        error: String,
    },
    TransportError {
        message: String,
    },
}

enum Command {
    Connect,
    /// Control frame built during authenticated session `session`
    Send {
        frame: OutboundFrame,
        session: u64,
    },
    Close,
}

struct Inner {
    state: ConnectionState,
    registry: TopicRegistry,
    req_counter: u64,
    // Bumped with every replay snapshot; older queued frames are covered by it
    session: u64,
    pending_connect: Option<oneshot::Sender<Result<()>>>,
    last_latency: Option<Duration>,
    // Taken by the event loop on first connect
    transport: Option<Box<dyn WsTransport>>,
    commands: Option<mpsc::UnboundedReceiver<Command>>,
}

impl Inner {
    fn next_req_id(&mut self) -> String {
        self.req_counter += 1;
        format!("req_{}", self.req_counter)
    }
}

struct Core {
    inner: Mutex<Inner>,
    auth: AuthMode,
    heartbeat_interval: Duration,
    tokens: TokenStore,
    diagnostics: broadcast::Sender<Diagnostic>,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Move to `to` unless already closed; returns false when closed
    fn transition(&self, to: ConnectionState) -> bool {
        let mut inner = self.lock();
        if inner.state == ConnectionState::Closed {
            return false;
        }
        if inner.state != to {
            debug!(from = ?inner.state, to = ?to, "ws state change");
            inner.state = to;
        }
        true
    }

    fn has_pending_connect(&self) -> bool {
        self.lock().pending_connect.is_some()
    }

    fn resolve_connect(&self, result: Result<()>) {
        let pending = self.lock().pending_connect.take();
        if let Some(tx) = pending {
            let _ = tx.send(result);
        }
    }

    fn emit(&self, diagnostic: Diagnostic) {
        // No receivers is fine
        let _ = self.diagnostics.send(diagnostic);
    }
}

/// Stream connection: owns topic subscriptions and drives a transport.
///
/// Cloning yields another handle to the same connection. The background
/// task stops after [`Connection::close`] or once every handle is dropped.
#[derive(Clone)]
pub struct Connection {
    core: Arc<Core>,
    commands: mpsc::UnboundedSender<Command>,
}

impl Connection {
    pub fn new<T: WsTransport>(transport: T, options: ConnectionOptions) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (diagnostics, _) = broadcast::channel(DIAGNOSTIC_CAPACITY);
        let heartbeat_interval = if options.heartbeat_interval.is_zero() {
            DEFAULT_HEARTBEAT_INTERVAL
        } else {
            options.heartbeat_interval
        };

        let inner = Inner {
            state: ConnectionState::Disconnected,
            registry: TopicRegistry::new(),
            req_counter: 0,
            session: 0,
            pending_connect: None,
            last_latency: None,
            transport: Some(Box::new(transport)),
            commands: Some(commands_rx),
        };

        Self {
            core: Arc::new(Core {
                inner: Mutex::new(inner),
                auth: options.auth,
                heartbeat_interval,
                tokens: options.tokens,
                diagnostics,
            }),
            commands: commands_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.core.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == ConnectionState::Authenticated
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.core.auth
    }

    /// Active topics in the order they were first subscribed
    pub fn active_topics(&self) -> Vec<String> {
        self.core.lock().registry.active_topics()
    }

    pub fn handler_count(&self, topic: &str) -> usize {
        self.core.lock().registry.handler_count(topic)
    }

    /// Round trip of the most recent answered ping
    pub fn last_latency(&self) -> Option<Duration> {
        self.core.lock().last_latency
    }

    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.core.diagnostics.subscribe()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.core.tokens
    }

    /// Store a bearer token; a connect waiting on it proceeds.
    ///
    /// Storing through any clone of the shared [`TokenStore`] has the same effect.
    pub fn set_token(&self, token: impl Into<String>) {
        self.core.tokens.set_token(token);
    }

    /// Resolve once authenticated, or fail on auth rejection or transport error
    pub async fn connect(&self) -> Result<()> {
        let (rx, spawn) = {
            let mut inner = self.core.lock();
            match inner.state {
                ConnectionState::Closed => return Err(closed_error()),
                ConnectionState::Authenticated => return Ok(()),
                _ => {}
            }
            if inner
                .pending_connect
                .as_ref()
                .is_some_and(|tx| !tx.is_closed())
            {
                return Err(EkidenError::WebSocket(
                    "connect already in progress".to_string(),
                ));
            }

            let (tx, rx) = oneshot::channel();
            inner.pending_connect = Some(tx);
            let spawn = match (inner.transport.take(), inner.commands.take()) {
                (Some(transport), Some(commands)) => Some((transport, commands)),
                _ => None,
            };
            (rx, spawn)
        };

        if let Some((transport, commands)) = spawn {
            let event_loop = EventLoop {
                token_changes: self.core.tokens.changes(),
                core: self.core.clone(),
                transport,
                commands,
                heartbeat: None,
                transport_open: false,
                parse_failures: 0,
            };
            tokio::spawn(event_loop.run());
        }

        if self.commands.send(Command::Connect).is_err() {
            self.core.resolve_connect(Err(task_stopped_error()));
        }

        rx.await.unwrap_or_else(|_| Err(task_stopped_error()))
    }

    /// Register handlers; newly active topics are announced to the gateway
    pub fn subscribe(&self, request: SubscriptionRequest) -> Result<Unsubscribe> {
        let pairs = request.into_pairs()?;
        let mut inner = self.core.lock();
        if inner.state != ConnectionState::Authenticated {
            return Err(EkidenError::authentication(
                "Cannot subscribe - not authenticated",
            ));
        }

        let activated = inner.registry.subscribe(pairs.clone());
        if !activated.is_empty() {
            let req_id = inner.next_req_id();
            debug!(topics = ?activated, req_id = %req_id, "subscribing");
            let session = inner.session;
            self.enqueue(Command::Send {
                frame: OutboundFrame::Subscribe {
                    args: activated,
                    req_id,
                },
                session,
            });
        }

        Ok(Unsubscribe {
            connection: self.clone(),
            pairs,
        })
    }

    /// Remove handlers; topics left without handlers are released
    pub fn unsubscribe(&self, request: SubscriptionRequest) -> Result<()> {
        let pairs = request.into_pairs()?;
        let mut inner = self.core.lock();
        let deactivated = inner.registry.unsubscribe(pairs);
        if deactivated.is_empty() {
            return Ok(());
        }
        if inner.state != ConnectionState::Authenticated {
            warn!(topics = ?deactivated, state = ?inner.state, "not authenticated, unsubscribe not sent");
            return Ok(());
        }

        let req_id = inner.next_req_id();
        debug!(topics = ?deactivated, req_id = %req_id, "unsubscribing");
        let session = inner.session;
        self.enqueue(Command::Send {
            frame: OutboundFrame::Unsubscribe {
                args: deactivated,
                req_id,
            },
            session,
        });
        Ok(())
    }

    /// Terminal: drops all subscriptions and stops the background task
    pub fn close(&self) {
        let (pending, transport) = {
            let mut inner = self.core.lock();
            if inner.state == ConnectionState::Closed {
                return;
            }
            inner.state = ConnectionState::Closed;
            inner.registry.clear();
            (inner.pending_connect.take(), inner.transport.take())
        };
        drop(transport);
        if let Some(tx) = pending {
            let _ = tx.send(Err(closed_error()));
        }
        self.enqueue(Command::Close);
        info!("ws connection closed");
    }

    fn enqueue(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("ws event loop not running, command dropped");
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("auth", &self.core.auth)
            .finish()
    }
}

/// Removes the handlers registered by one subscribe call.
///
/// Dropping the guard leaves the subscription in place.
#[must_use = "keep the guard to unsubscribe later"]
#[derive(Debug)]
pub struct Unsubscribe {
    connection: Connection,
    pairs: Vec<(String, Handler)>,
}

impl Unsubscribe {
    pub fn topics(&self) -> Vec<&str> {
        self.pairs.iter().map(|(topic, _)| topic.as_str()).collect()
    }

    pub fn unsubscribe(self) -> Result<()> {
        self.connection
            .unsubscribe(SubscriptionRequest::Handlers(self.pairs))
    }
}

struct EventLoop {
    core: Arc<Core>,
    transport: Box<dyn WsTransport>,
    commands: mpsc::UnboundedReceiver<Command>,
    token_changes: watch::Receiver<u64>,
    heartbeat: Option<Interval>,
    transport_open: bool,
    parse_failures: usize,
}

impl EventLoop {
    async fn run(mut self) {
        debug!(auth = ?self.core.auth, "ws event loop started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Close) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                event = self.transport.recv() => match event {
                    Some(event) => self.handle_transport_event(event).await,
                    None => {
                        self.transport_finished();
                        break;
                    }
                },
                Ok(()) = self.token_changes.changed() => self.on_token_changed().await,
                _ = next_heartbeat(&mut self.heartbeat) => self.send_ping().await,
            }
        }
        self.heartbeat = None;
        self.transport.close().await;
        debug!("ws event loop stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect => match self.core.state() {
                ConnectionState::Disconnected | ConnectionState::Connecting => {
                    if self.core.transition(ConnectionState::Connecting) && self.transport_open {
                        self.authenticate().await;
                    }
                }
                // Auth reply pending; it settles the new waiter
                ConnectionState::AwaitingAuth => {}
                ConnectionState::Authenticated => self.core.resolve_connect(Ok(())),
                ConnectionState::Closed => self.core.resolve_connect(Err(closed_error())),
            },
            Command::Send { frame, session } => {
                let (state, live) = {
                    let inner = self.core.lock();
                    (inner.state, inner.session)
                };
                if state != ConnectionState::Authenticated {
                    warn!(op = frame.op(), state = ?state, "not authenticated, dropping frame");
                } else if session != live {
                    debug!(op = frame.op(), req_id = frame.req_id(), "frame predates replay, dropping");
                } else {
                    self.write(frame).await;
                }
            }
            Command::Close => {}
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                self.transport_open = true;
                let state = self.core.state();
                info!(state = ?state, "ws transport open");
                if matches!(
                    state,
                    ConnectionState::Connecting | ConnectionState::AwaitingAuth
                ) {
                    self.authenticate().await;
                }
            }
            TransportEvent::Message(text) => self.handle_text(text).await,
            TransportEvent::Error(message) => {
                warn!(error = %message, "ws transport error");
                self.core.emit(Diagnostic::TransportError {
                    message: message.clone(),
                });
                let state = self.core.state();
                if matches!(
                    state,
                    ConnectionState::Connecting | ConnectionState::AwaitingAuth
                ) && self.core.has_pending_connect()
                {
                    self.core.transition(ConnectionState::Disconnected);
                    self.core
                        .resolve_connect(Err(EkidenError::WebSocket(message)));
                }
            }
            TransportEvent::Closed => {
                self.transport_open = false;
                self.heartbeat = None;
                let state = self.core.state();
                if matches!(
                    state,
                    ConnectionState::Authenticated | ConnectionState::AwaitingAuth
                ) {
                    self.core.transition(ConnectionState::Connecting);
                }
                info!(state = ?state, "ws transport closed");
            }
        }
    }

    async fn on_token_changed(&mut self) {
        if self.core.auth == AuthMode::Bearer
            && self.core.state() == ConnectionState::Connecting
            && self.transport_open
        {
            self.authenticate().await;
        }
    }

    fn transport_finished(&mut self) {
        warn!("ws transport ended");
        self.core.transition(ConnectionState::Disconnected);
        self.core
            .resolve_connect(Err(EkidenError::WebSocket("transport ended".to_string())));
    }

    async fn authenticate(&mut self) {
        match self.core.auth {
            AuthMode::None => self.on_authenticated().await,
            AuthMode::Bearer => {
                let Some(token) = self.core.tokens.get_token() else {
                    debug!("no token yet, auth deferred");
                    self.core.transition(ConnectionState::Connecting);
                    return;
                };
                let req_id = {
                    let mut inner = self.core.lock();
                    if inner.state == ConnectionState::Closed {
                        return;
                    }
                    inner.state = ConnectionState::AwaitingAuth;
                    inner.next_req_id()
                };
                self.write(OutboundFrame::Auth {
                    bearer: token,
                    req_id,
                })
                .await;
            }
        }
    }

    async fn on_authenticated(&mut self) {
        let replay = {
            let mut inner = self.core.lock();
            if inner.state == ConnectionState::Closed {
                return;
            }
            inner.state = ConnectionState::Authenticated;
            inner.session += 1;
            let topics = inner.registry.active_topics();
            if topics.is_empty() {
                None
            } else {
                let req_id = inner.next_req_id();
                Some(OutboundFrame::Subscribe {
                    args: topics,
                    req_id,
                })
            }
        };

        info!("ws authenticated");
        self.start_heartbeat();
        if let Some(frame) = replay {
            if let OutboundFrame::Subscribe { args, .. } = &frame {
                info!(topics = ?args, "replaying subscriptions");
            }
            self.write(frame).await;
        }
        self.core.resolve_connect(Ok(()));
    }

    async fn handle_text(&mut self, text: String) {
        let frame = match serde_json::from_str::<InboundFrame>(&text) {
            Ok(frame) => frame,
            Err(e) => {
                self.log_parse_failure(&e, &text);
                self.core.emit(Diagnostic::MalformedFrame {
                    error: e.to_string(),
                });
                return;
            }
        };

        match frame {
            InboundFrame::Auth {
                success,
                user_id,
                message,
                ..
            } => self.handle_auth(success, user_id, message).await,
            InboundFrame::Subscribed { args, req_id } => {
                debug!(topics = ?args, req_id = ?req_id, "subscribed");
            }
            InboundFrame::Unsubscribed { args, req_id } => {
                debug!(topics = ?args, req_id = ?req_id, "unsubscribed");
            }
            InboundFrame::Pong {
                server_ts,
                client_ts,
                req_id,
            } => self.handle_pong(server_ts, client_ts, req_id),
            InboundFrame::Event { topic, data } => self.dispatch(topic, data),
            InboundFrame::Error { message, req_id } => {
                warn!(error = %message, req_id = ?req_id, "gateway reported error");
                self.core.emit(Diagnostic::PeerError { message, req_id });
            }
        }
    }

    async fn handle_auth(
        &mut self,
        success: bool,
        user_id: Option<String>,
        message: Option<String>,
    ) {
        let state = self.core.state();
        if state != ConnectionState::AwaitingAuth {
            debug!(state = ?state, success, "ignoring unexpected auth reply");
            return;
        }

        if success {
            info!(user_id = user_id.as_deref().unwrap_or("-"), "ws auth accepted");
            self.on_authenticated().await;
            return;
        }

        let message = message.unwrap_or_else(|| "Authentication failed".to_string());
        warn!(error = %message, "ws auth rejected");
        self.core.transition(ConnectionState::Disconnected);
        self.core.emit(Diagnostic::AuthRejected {
            message: message.clone(),
        });
        self.core
            .resolve_connect(Err(EkidenError::authentication(message)));
    }

    fn handle_pong(&self, server_ts: i64, client_ts: Option<i64>, req_id: Option<String>) {
        let Some(client_ts) = client_ts else {
            debug!(server_ts, req_id = ?req_id, "pong without client timestamp");
            return;
        };
        let elapsed = now_nanos().saturating_sub(client_ts).max(0);
        let latency = Duration::from_nanos(elapsed as u64);
        self.core.lock().last_latency = Some(latency);
        debug!(
            latency_ms = latency.as_millis() as u64,
            server_ts,
            req_id = ?req_id,
            "pong"
        );
    }

    fn dispatch(&self, topic: String, data: Value) {
        let handlers = self.core.lock().registry.handlers_for(&topic);
        if handlers.is_empty() {
            warn!(topic = %topic, "event for topic without handlers");
            return;
        }
        let event = WsEvent { topic, data };
        for handler in &handlers {
            handler.call(&event);
        }
    }

    fn start_heartbeat(&mut self) {
        let period = self.core.heartbeat_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.heartbeat = Some(interval);
    }

    async fn send_ping(&mut self) {
        let req_id = {
            let mut inner = self.core.lock();
            if inner.state != ConnectionState::Authenticated {
                return;
            }
            inner.next_req_id()
        };
        self.write(OutboundFrame::Ping {
            ts: now_nanos(),
            req_id,
        })
        .await;
    }

    async fn write(&mut self, frame: OutboundFrame) {
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                warn!(op = frame.op(), error = %e, "failed to encode frame");
                return;
            }
        };
        debug!(op = frame.op(), req_id = frame.req_id(), "ws send");
        if let Err(e) = self.transport.send(text).await {
            warn!(op = frame.op(), error = %e, "ws send failed");
        }
    }

    fn log_parse_failure(&mut self, error: &serde_json::Error, raw: &str) {
        self.parse_failures += 1;
        if self.parse_failures > PARSE_FAIL_LOG_LIMIT {
            debug!(count = self.parse_failures, error = %error, "ws frame parse failed");
            return;
        }
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        warn!(
            sample_index = self.parse_failures,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %error,
            raw = %preview,
            "ws frame parse failed"
        );
    }
}

async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

fn closed_error() -> EkidenError {
    EkidenError::WebSocket("connection closed".to_string())
}

fn task_stopped_error() -> EkidenError {
    EkidenError::WebSocket("connection task stopped".to_string())
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
