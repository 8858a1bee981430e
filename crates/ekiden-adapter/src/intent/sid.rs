/*
[INPUT]:  Order identity fields (market, user, side, size, price, type, nonce)
[OUTPUT]: Deterministic hex order SID matching the gateway's derivation
[POS]:    Intent layer - client-side order ID prediction
[UPDATE]: When the gateway changes how order SIDs are derived
*/

use sha3::{Digest, Sha3_256};

use crate::types::{OrderKind, Side};

/// Fields hashed into an order SID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSidParams<'a> {
    pub market_addr: &'a str,
    pub user_addr: &'a str,
    pub side: Side,
    pub size: u64,
    pub price: u64,
    pub kind: OrderKind,
    pub nonce: u64,
}

/// sha3-256 over the raw concatenation of the fields, hex encoded.
///
/// Strings are appended without length prefixes; integers as u64 LE.
pub fn order_sid(params: &OrderSidParams<'_>) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(params.market_addr.as_bytes());
    hasher.update(params.user_addr.as_bytes());
    hasher.update(params.side.as_str().as_bytes());
    hasher.update(params.size.to_le_bytes());
    hasher.update(params.price.to_le_bytes());
    hasher.update(params.kind.as_str().as_bytes());
    hasher.update(params.nonce.to_le_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> OrderSidParams<'static> {
        OrderSidParams {
            market_addr: "0xmarket",
            user_addr: "0xuser",
            side: Side::Sell,
            size: 10,
            price: 20,
            kind: OrderKind::Market,
            nonce: 1_700_000_000,
        }
    }

    #[test]
    fn test_sid_matches_manual_digest() {
        let mut data = Vec::new();
        data.extend_from_slice(b"0xmarket");
        data.extend_from_slice(b"0xuser");
        data.extend_from_slice(b"sell");
        data.extend_from_slice(&10u64.to_le_bytes());
        data.extend_from_slice(&20u64.to_le_bytes());
        data.extend_from_slice(b"market");
        data.extend_from_slice(&1_700_000_000u64.to_le_bytes());
        let expected = hex::encode(Sha3_256::digest(&data));

        assert_eq!(order_sid(&params()), expected);
        assert_eq!(order_sid(&params()).len(), 64);
    }

    #[test]
    fn test_sid_changes_with_nonce() {
        let mut other = params();
        other.nonce += 1;
        assert_ne!(order_sid(&params()), order_sid(&other));
    }
}
