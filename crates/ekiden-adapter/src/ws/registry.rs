/*
[INPUT]:  (topic, handler) pairs from subscribe/unsubscribe calls
[OUTPUT]: Reference-counted topic set and per-topic handler lists
[POS]:    WebSocket layer - subscription bookkeeping, no I/O
[UPDATE]: When changing handler identity or subscription argument shapes
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::message::WsEvent;
use crate::http::{EkidenError, Result};

/// Callback invoked for every event on a subscribed topic.
///
/// Identity is the underlying allocation: clones of one `Handler` are the
/// same handler, two `Handler::new` calls over equal closures are not.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(&WsEvent) + Send + Sync>);

impl Handler {
    pub fn new(f: impl Fn(&WsEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Wrap a callback taking the event data deserialized as `T`.
    /// Payloads that do not match `T` are logged and dropped.
    pub fn typed<T, F>(f: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        Self::new(move |event: &WsEvent| match T::deserialize(&event.data) {
            Ok(value) => f(value),
            Err(e) => warn!(topic = %event.topic, error = %e, "event payload did not match expected shape"),
        })
    }

    pub fn call(&self, event: &WsEvent) {
        (self.0)(event)
    }

    pub fn same(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// The three accepted argument shapes for subscribe and unsubscribe
#[derive(Debug, Clone)]
pub enum SubscriptionRequest {
    Topic(String, Handler),
    Topics(Vec<String>, Handler),
    Handlers(Vec<(String, Handler)>),
}

impl SubscriptionRequest {
    pub fn topic(topic: impl Into<String>, handler: Handler) -> Self {
        Self::Topic(topic.into(), handler)
    }

    pub fn topics<I, S>(topics: I, handler: Handler) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Topics(topics.into_iter().map(Into::into).collect(), handler)
    }

    pub fn handlers<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Handler)>,
        S: Into<String>,
    {
        Self::Handlers(
            pairs
                .into_iter()
                .map(|(topic, handler)| (topic.into(), handler))
                .collect(),
        )
    }

    /// Flatten into (topic, handler) pairs, rejecting empty input
    pub fn into_pairs(self) -> Result<Vec<(String, Handler)>> {
        let pairs = match self {
            Self::Topic(topic, handler) => vec![(topic, handler)],
            Self::Topics(topics, handler) => {
                if topics.is_empty() {
                    return Err(EkidenError::WebSocket(
                        "topics must be a non-empty list".to_string(),
                    ));
                }
                topics
                    .into_iter()
                    .map(|topic| (topic, handler.clone()))
                    .collect()
            }
            Self::Handlers(pairs) => {
                if pairs.is_empty() {
                    return Err(EkidenError::WebSocket(
                        "handler map must not be empty".to_string(),
                    ));
                }
                pairs
            }
        };

        if pairs.iter().any(|(topic, _)| topic.trim().is_empty()) {
            return Err(EkidenError::WebSocket(
                "topic must be a non-empty string".to_string(),
            ));
        }
        Ok(pairs)
    }
}

/// Topic set with per-topic handler lists.
///
/// A topic is active while at least one handler is registered for it.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    handlers: HashMap<String, Vec<Handler>>,
    order: Vec<String>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register pairs; returns topics that just became active
    pub fn subscribe(&mut self, pairs: Vec<(String, Handler)>) -> Vec<String> {
        let mut activated = Vec::new();
        for (topic, handler) in pairs {
            match self.handlers.get_mut(&topic) {
                Some(list) => {
                    if list.iter().any(|h| h.same(&handler)) {
                        debug!(topic = %topic, "handler already registered");
                    } else {
                        list.push(handler);
                    }
                }
                None => {
                    self.handlers.insert(topic.clone(), vec![handler]);
                    self.order.push(topic.clone());
                    activated.push(topic);
                }
            }
        }
        activated
    }

    /// Remove pairs; returns topics that just became inactive
    pub fn unsubscribe(&mut self, pairs: Vec<(String, Handler)>) -> Vec<String> {
        let mut deactivated = Vec::new();
        for (topic, handler) in pairs {
            let Some(list) = self.handlers.get_mut(&topic) else {
                debug!(topic = %topic, "unsubscribe for inactive topic");
                continue;
            };
            list.retain(|h| !h.same(&handler));
            if list.is_empty() {
                self.handlers.remove(&topic);
                self.order.retain(|t| t != &topic);
                deactivated.push(topic);
            }
        }
        deactivated
    }

    /// Handlers for `topic` in registration order
    pub fn handlers_for(&self, topic: &str) -> Vec<Handler> {
        self.handlers.get(topic).cloned().unwrap_or_default()
    }

    /// Active topics in activation order
    pub fn active_topics(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn is_active(&self, topic: &str) -> bool {
        self.handlers.contains_key(topic)
    }

    pub fn handler_count(&self, topic: &str) -> usize {
        self.handlers.get(topic).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
        self.order.clear();
    }
}
