/*
[INPUT]:  Raw JSON frames exchanged with the gateway stream endpoints
[OUTPUT]: Typed outbound/inbound frames and typed market event payloads
[POS]:    WebSocket layer - message parsing and wire format
[UPDATE]: When adding new ops, event types or changing frame format
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Side;

/// Control frames sent to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OutboundFrame {
    Auth { bearer: String, req_id: String },
    Subscribe { args: Vec<String>, req_id: String },
    Unsubscribe { args: Vec<String>, req_id: String },
    /// `ts` is the client wall clock in nanoseconds
    Ping { ts: i64, req_id: String },
}

impl OutboundFrame {
    pub fn op(&self) -> &'static str {
        match self {
            OutboundFrame::Auth { .. } => "auth",
            OutboundFrame::Subscribe { .. } => "subscribe",
            OutboundFrame::Unsubscribe { .. } => "unsubscribe",
            OutboundFrame::Ping { .. } => "ping",
        }
    }

    pub fn req_id(&self) -> &str {
        match self {
            OutboundFrame::Auth { req_id, .. }
            | OutboundFrame::Subscribe { req_id, .. }
            | OutboundFrame::Unsubscribe { req_id, .. }
            | OutboundFrame::Ping { req_id, .. } => req_id,
        }
    }
}

/// Frames received from the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InboundFrame {
    Auth {
        success: bool,
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        req_id: Option<String>,
    },
    Subscribed {
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        req_id: Option<String>,
    },
    Unsubscribed {
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        req_id: Option<String>,
    },
    Pong {
        server_ts: i64,
        #[serde(default)]
        client_ts: Option<i64>,
        #[serde(default)]
        req_id: Option<String>,
    },
    Event {
        topic: String,
        #[serde(default)]
        data: Value,
    },
    Error {
        message: String,
        #[serde(default)]
        req_id: Option<String>,
    },
}

/// Event delivered to subscription handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsEvent {
    pub topic: String,
    pub data: Value,
}

/// `[price, size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel(pub Decimal, pub Decimal);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderbookEvent {
    OrderbookSnapshot {
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
        market_addr: String,
        seq: u64,
        matched_at: u64,
    },
    OrderbookDelta {
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
        seq: u64,
        matched_at: u64,
    },
}

impl OrderbookEvent {
    pub fn seq(&self) -> u64 {
        match self {
            OrderbookEvent::OrderbookSnapshot { seq, .. }
            | OrderbookEvent::OrderbookDelta { seq, .. } => *seq,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: Decimal,
    pub size: Decimal,
    pub side: Side,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradesEvent {
    pub trades: Vec<Trade>,
    pub market_addr: String,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub market_addr: String,
    pub ts: u64,
    pub last_price: Decimal,
    pub mark_price: Decimal,
    pub index_price: Decimal,
    pub open_interest: Decimal,
    pub open_interest_value: Decimal,
    pub funding_rate: Decimal,
    pub funding_rate_percentage: Decimal,
    pub next_funding_time: u64,
    pub volume_24h: Decimal,
    pub turnover_24h: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_auth_shape() {
        let frame = OutboundFrame::Auth {
            bearer: "tok".to_string(),
            req_id: "req_1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            serde_json::json!({"op": "auth", "bearer": "tok", "req_id": "req_1"})
        );
    }

    #[test]
    fn test_inbound_auth_without_req_id() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"op":"auth","success":false,"message":"bad token"}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Auth {
                success: false,
                user_id: None,
                message: Some("bad token".to_string()),
                req_id: None,
            }
        );
    }

    #[test]
    fn test_inbound_event_and_pong() {
        let event: InboundFrame =
            serde_json::from_str(r#"{"op":"event","topic":"order","data":{"sid":"1"}}"#).unwrap();
        assert!(matches!(event, InboundFrame::Event { ref topic, .. } if topic == "order"));

        let pong: InboundFrame =
            serde_json::from_str(r#"{"op":"pong","server_ts":10,"client_ts":4,"req_id":"req_2"}"#)
                .unwrap();
        assert!(matches!(
            pong,
            InboundFrame::Pong {
                client_ts: Some(4),
                ..
            }
        ));
    }

    #[test]
    fn test_orderbook_snapshot_parses_numbers() {
        let data = serde_json::json!({
            "type": "orderbook_snapshot",
            "asks": [[100.5, 2]],
            "bids": [[99.25, 1.5]],
            "market_addr": "0xm",
            "seq": 7,
            "matched_at": 1_700_000_000_000u64
        });
        let event: OrderbookEvent = serde_json::from_value(data).unwrap();
        match &event {
            OrderbookEvent::OrderbookSnapshot { asks, bids, .. } => {
                assert_eq!(asks[0], PriceLevel(Decimal::new(1005, 1), Decimal::from(2)));
                assert_eq!(bids[0], PriceLevel(Decimal::new(9925, 2), Decimal::new(15, 1)));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(event.seq(), 7);
    }
}
