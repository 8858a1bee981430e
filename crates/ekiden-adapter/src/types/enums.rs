/*
[INPUT]:  Gateway schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization and wire encodings
[POS]:    Data layer - type definitions for intents and API communication
[UPDATE]: When the gateway adds variants (ordinals are a protocol contract)
*/

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// String form written into intent bytes
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Limit,
    Market,
}

impl OrderKind {
    /// String form written into intent bytes
    pub fn as_str(self) -> &'static str {
        match self {
            OrderKind::Limit => "limit",
            OrderKind::Market => "market",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Take-profit / stop-loss bracket mode.
///
/// Encoded by variant index; the order of variants must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TpSlMode {
    Full,
    Partial,
}

impl TpSlMode {
    pub fn ordinal(self) -> u32 {
        match self {
            TpSlMode::Full => 0,
            TpSlMode::Partial => 1,
        }
    }
}

/// Order type used when a take-profit or stop-loss leg triggers.
///
/// Encoded by variant index; the order of variants must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TpSlOrderType {
    Market,
    Limit,
}

impl TpSlOrderType {
    pub fn ordinal(self) -> u32 {
        match self {
            TpSlOrderType::Market => 0,
            TpSlOrderType::Limit => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TpSlMode::Full, 0)]
    #[case(TpSlMode::Partial, 1)]
    fn test_tpsl_mode_ordinal(#[case] mode: TpSlMode, #[case] expected: u32) {
        assert_eq!(mode.ordinal(), expected);
    }

    #[rstest]
    #[case(TpSlOrderType::Market, 0)]
    #[case(TpSlOrderType::Limit, 1)]
    fn test_tpsl_order_type_ordinal(#[case] order_type: TpSlOrderType, #[case] expected: u32) {
        assert_eq!(order_type.ordinal(), expected);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&OrderKind::Market).unwrap(), "\"market\"");
        assert_eq!(serde_json::to_string(&TpSlMode::Partial).unwrap(), "\"PARTIAL\"");
        assert_eq!(
            serde_json::from_str::<TpSlOrderType>("\"LIMIT\"").unwrap(),
            TpSlOrderType::Limit
        );
    }
}
