/*
[INPUT]:  Trading actions composed by the caller
[OUTPUT]: Typed action payloads ready for encoding and submission
[POS]:    Data layer - intent action model (closed set of actions)
[UPDATE]: When the gateway adds an action (also update the encoder)
*/

use serde::{Deserialize, Serialize};

use super::enums::{OrderKind, Side, TpSlMode, TpSlOrderType};

/// Tags of every action the gateway accepts
pub const ACTION_TYPES: [&str; 4] = [
    "order_create",
    "order_cancel",
    "order_cancel_all",
    "leverage_assign",
];

/// A trading action carried inside a signed intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    OrderCreate { orders: Vec<OrderSpec> },
    OrderCancel { cancels: Vec<OrderCancel> },
    OrderCancelAll,
    LeverageAssign { leverage: u64, market_addr: String },
}

impl ActionPayload {
    /// Tag written at the front of the encoded payload
    pub fn action_type(&self) -> &'static str {
        match self {
            ActionPayload::OrderCreate { .. } => "order_create",
            ActionPayload::OrderCancel { .. } => "order_cancel",
            ActionPayload::OrderCancelAll => "order_cancel_all",
            ActionPayload::LeverageAssign { .. } => "leverage_assign",
        }
    }
}

/// Single order inside an `order_create` action.
///
/// `price`, `size` and trigger prices are fixed-point integers in market units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub side: Side,
    pub size: u64,
    pub price: u64,
    pub leverage: u64,
    #[serde(rename = "type")]
    pub kind: OrderKind,
    pub market_addr: String,
    pub is_cross: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_link_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket: Option<TpSlBracket>,
}

impl OrderSpec {
    /// Minimal order with every optional field absent
    pub fn new(
        side: Side,
        kind: OrderKind,
        market_addr: impl Into<String>,
        size: u64,
        price: u64,
        leverage: u64,
    ) -> Self {
        Self {
            side,
            size,
            price,
            leverage,
            kind,
            market_addr: market_addr.into(),
            is_cross: false,
            time_in_force: None,
            trigger_price: None,
            reduce_only: None,
            order_link_id: None,
            bracket: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancel {
    pub sid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpSlBracket {
    pub mode: TpSlMode,
    #[serde(default)]
    pub take_profit: Option<TpSlSpec>,
    #[serde(default)]
    pub stop_loss: Option<TpSlSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpSlSpec {
    pub trigger_price: u64,
    pub order_type: TpSlOrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<u64>,
}
