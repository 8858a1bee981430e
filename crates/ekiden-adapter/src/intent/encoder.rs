/*
[INPUT]:  Typed (or raw JSON) action payload and a nonce
[OUTPUT]: Deterministic intent bytes: SEED || payload || u64_le(nonce)
[POS]:    Intent layer - binary encoding that is signed and verified remotely
[UPDATE]: Never reorder fields; any change breaks outstanding signatures
*/

use serde_json::Value;

use crate::http::{EkidenError, Result};
use crate::types::{ACTION_TYPES, ActionPayload, OrderSpec, TpSlBracket, TpSlSpec};

/// Domain-separation prefix of every encoded intent.
///
/// Version-bound: the validator rejects signatures over any other prefix.
pub const INTENT_SEED: [u8; 32] = [
    226, 172, 78, 86, 136, 217, 100, 39, 10, 216, 118, 215, 96, 194, 235, 178, 213, 79, 178, 109,
    147, 81, 44, 121, 0, 73, 182, 88, 55, 48, 208, 111,
];

/// Append-only writer for the BCS subset used by intents
#[derive(Debug, Default, Clone)]
pub struct BcsWriter {
    buf: Vec<u8>,
}

impl BcsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_uleb128(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.buf.push((value & 0x7f) as u8 | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Length-prefixed UTF-8 string
    pub fn write_str(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// True option: presence byte, then the value when present
    pub fn write_option_str(&mut self, value: Option<&str>) {
        match value {
            Some(value) => {
                self.write_u8(1);
                self.write_str(value);
            }
            None => self.write_u8(0),
        }
    }

    pub fn write_option_u64(&mut self, value: Option<u64>) {
        match value {
            Some(value) => {
                self.write_u8(1);
                self.write_u64(value);
            }
            None => self.write_u8(0),
        }
    }

    fn write_len(&mut self, len: usize) {
        // Lengths are u32 on the validator side.
        self.write_uleb128(len as u32);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode an action and nonce into the exact bytes the gateway verifies
pub fn encode_intent(payload: &ActionPayload, nonce: u64) -> Vec<u8> {
    let mut writer = BcsWriter::new();
    writer.buf.extend_from_slice(&INTENT_SEED);
    write_payload(&mut writer, payload);
    writer.write_u64(nonce);
    writer.into_bytes()
}

/// Lowercase hex rendering of [`encode_intent`]
pub fn encode_intent_hex(payload: &ActionPayload, nonce: u64) -> String {
    hex::encode(encode_intent(payload, nonce))
}

/// Encode an untyped JSON payload.
///
/// The `type` tag is checked against the known action set before anything
/// else so an unsupported action never reaches the signer.
pub fn encode_intent_value(payload: &Value, nonce: u64) -> Result<Vec<u8>> {
    let tag = payload
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| EkidenError::UnknownActionType("<missing>".to_string()))?;

    if !ACTION_TYPES.contains(&tag) {
        return Err(EkidenError::UnknownActionType(tag.to_string()));
    }

    let typed: ActionPayload = serde_json::from_value(payload.clone())?;
    Ok(encode_intent(&typed, nonce))
}

fn write_payload(writer: &mut BcsWriter, payload: &ActionPayload) {
    writer.write_str(payload.action_type());

    match payload {
        ActionPayload::LeverageAssign {
            leverage,
            market_addr,
        } => {
            writer.write_u64(*leverage);
            writer.write_str(market_addr);
        }
        ActionPayload::OrderCancel { cancels } => {
            writer.write_len(cancels.len());
            for cancel in cancels {
                writer.write_str(&cancel.sid);
            }
        }
        ActionPayload::OrderCancelAll => {}
        ActionPayload::OrderCreate { orders } => {
            writer.write_len(orders.len());
            for order in orders {
                write_order(writer, order);
            }
        }
    }
}

fn write_order(writer: &mut BcsWriter, order: &OrderSpec) {
    writer.write_str(order.side.as_str());
    writer.write_u64(order.size);
    writer.write_u64(order.price);
    writer.write_u64(order.leverage);
    writer.write_str(order.kind.as_str());
    writer.write_str(&order.market_addr);
    writer.write_bool(order.is_cross);
    writer.write_option_str(order.time_in_force.as_deref());

    // Skip-if-none fields: absent means zero bytes, never a 0 tag.
    if let Some(trigger_price) = order.trigger_price {
        writer.write_u8(1);
        writer.write_u64(trigger_price);
    }
    if let Some(reduce_only) = order.reduce_only {
        writer.write_u8(1);
        writer.write_bool(reduce_only);
    }
    if let Some(order_link_id) = &order.order_link_id {
        writer.write_u8(1);
        writer.write_str(order_link_id);
    }
    if let Some(bracket) = &order.bracket {
        writer.write_u8(1);
        write_bracket(writer, bracket);
    }
}

fn write_bracket(writer: &mut BcsWriter, bracket: &TpSlBracket) {
    writer.write_uleb128(bracket.mode.ordinal());
    write_tpsl_leg(writer, bracket.take_profit.as_ref());
    write_tpsl_leg(writer, bracket.stop_loss.as_ref());
}

fn write_tpsl_leg(writer: &mut BcsWriter, leg: Option<&TpSlSpec>) {
    match leg {
        Some(leg) => {
            writer.write_u8(1);
            writer.write_u64(leg.trigger_price);
            writer.write_uleb128(leg.order_type.ordinal());
            writer.write_option_u64(leg.limit_price);
        }
        None => writer.write_u8(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderCancel, OrderKind, Side, TpSlMode, TpSlOrderType};

    fn market() -> String {
        "0x1f318bcba992874f5cb939cd9e66cbe16cfbe89323ee91b7e98e1cc8411cd1d7".to_string()
    }

    fn base_order() -> OrderSpec {
        OrderSpec::new(Side::Buy, OrderKind::Limit, market(), 1_000, 65_000_000, 5)
    }

    fn create(order: OrderSpec) -> ActionPayload {
        ActionPayload::OrderCreate {
            orders: vec![order],
        }
    }

    #[test]
    fn test_cancel_all_exact_bytes() {
        let bytes = encode_intent(&ActionPayload::OrderCancelAll, 5);

        let mut expected = INTENT_SEED.to_vec();
        expected.push(16);
        expected.extend_from_slice(b"order_cancel_all");
        expected.extend_from_slice(&5u64.to_le_bytes());

        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_leverage_assign_layout() {
        let payload = ActionPayload::LeverageAssign {
            leverage: 20,
            market_addr: "0xab".to_string(),
        };
        let bytes = encode_intent(&payload, 1);
        let body = &bytes[INTENT_SEED.len()..bytes.len() - 8];

        let mut expected = vec![15];
        expected.extend_from_slice(b"leverage_assign");
        expected.extend_from_slice(&20u64.to_le_bytes());
        expected.push(4);
        expected.extend_from_slice(b"0xab");
        assert_eq!(body, expected.as_slice());
    }

    #[test]
    fn test_order_cancel_layout() {
        let payload = ActionPayload::OrderCancel {
            cancels: vec![
                OrderCancel {
                    sid: "a".to_string(),
                },
                OrderCancel {
                    sid: "bc".to_string(),
                },
            ],
        };
        let bytes = encode_intent(&payload, 0);
        let body = &bytes[INTENT_SEED.len()..bytes.len() - 8];

        let mut expected = vec![12];
        expected.extend_from_slice(b"order_cancel");
        expected.extend_from_slice(&[2, 1, b'a', 2, b'b', b'c']);
        assert_eq!(body, expected.as_slice());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut order = base_order();
        order.time_in_force = Some("GTC".to_string());
        order.bracket = Some(TpSlBracket {
            mode: TpSlMode::Partial,
            take_profit: Some(TpSlSpec {
                trigger_price: 70_000_000,
                order_type: TpSlOrderType::Limit,
                limit_price: Some(69_900_000),
            }),
            stop_loss: None,
        });
        let payload = create(order);

        assert_eq!(encode_intent(&payload, 42), encode_intent(&payload, 42));
        assert_ne!(encode_intent(&payload, 42), encode_intent(&payload, 43));
    }

    #[test]
    fn test_minimal_order_layout() {
        let bytes = encode_intent(&create(base_order()), 9);
        let body = &bytes[INTENT_SEED.len()..bytes.len() - 8];

        let mut writer = BcsWriter::new();
        writer.write_str("order_create");
        writer.write_uleb128(1);
        writer.write_str("buy");
        writer.write_u64(1_000);
        writer.write_u64(65_000_000);
        writer.write_u64(5);
        writer.write_str("limit");
        writer.write_str(&market());
        writer.write_bool(false);
        writer.write_u8(0);
        assert_eq!(body, writer.into_bytes().as_slice());
    }

    #[test]
    fn test_absent_trigger_price_contributes_no_bytes() {
        let without = encode_intent(&create(base_order()), 1);
        let mut order = base_order();
        order.trigger_price = Some(64_000_000);
        let with = encode_intent(&create(order), 1);

        assert_eq!(with.len(), without.len() + 9);
    }

    #[test]
    fn test_skip_if_none_fields_write_tag_one_when_present() {
        let mut order = base_order();
        order.reduce_only = Some(false);
        order.order_link_id = Some("link".to_string());
        let bytes = encode_intent(&create(order), 1);
        let tail = &bytes[bytes.len() - 8 - 8..bytes.len() - 8];
        // reduce_only: [1, 0]; order_link_id: [1, 4, 'l','i','n','k']
        assert_eq!(tail, &[1, 0, 1, 4, b'l', b'i', b'n', b'k']);
    }

    #[test]
    fn test_bracket_presence_and_leg_options() {
        let without = encode_intent(&create(base_order()), 1);

        let mut order = base_order();
        order.bracket = Some(TpSlBracket {
            mode: TpSlMode::Full,
            take_profit: None,
            stop_loss: None,
        });
        let with_empty_bracket = encode_intent(&create(order), 1);

        // presence byte + mode + take_profit none + stop_loss none
        assert_eq!(with_empty_bracket.len(), without.len() + 4);
        let tail = &with_empty_bracket[with_empty_bracket.len() - 8 - 4..with_empty_bracket.len() - 8];
        assert_eq!(tail, &[1, 0, 0, 0]);
    }

    #[test]
    fn test_bracket_leg_encoding() {
        let mut order = base_order();
        order.bracket = Some(TpSlBracket {
            mode: TpSlMode::Partial,
            take_profit: None,
            stop_loss: Some(TpSlSpec {
                trigger_price: 7,
                order_type: TpSlOrderType::Market,
                limit_price: None,
            }),
        });
        let bytes = encode_intent(&create(order), 1);
        let tail = &bytes[bytes.len() - 8 - 14..bytes.len() - 8];

        let mut expected = vec![1, 1, 0, 1];
        expected.extend_from_slice(&7u64.to_le_bytes());
        expected.extend_from_slice(&[0, 0]);
        assert_eq!(tail, expected.as_slice());
    }

    #[test]
    fn test_uleb128_multi_byte() {
        let mut writer = BcsWriter::new();
        writer.write_uleb128(300);
        assert_eq!(writer.into_bytes(), vec![0xac, 0x02]);
    }

    #[test]
    fn test_encode_value_matches_typed() {
        let payload = ActionPayload::LeverageAssign {
            leverage: 3,
            market_addr: market(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            encode_intent_value(&value, 11).unwrap(),
            encode_intent(&payload, 11)
        );
    }

    #[test]
    fn test_encode_value_unknown_tag() {
        let value = serde_json::json!({"type": "order_amend", "orders": []});
        match encode_intent_value(&value, 1) {
            Err(EkidenError::UnknownActionType(tag)) => assert_eq!(tag, "order_amend"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_hex_is_lowercase() {
        let hex = encode_intent_hex(&ActionPayload::OrderCancelAll, 255);
        assert!(hex.starts_with("e2ac4e56"));
        assert!(hex.ends_with("ff00000000000000"));
        assert_eq!(hex, hex.to_lowercase());
    }
}
