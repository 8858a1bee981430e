/*
[INPUT]:  Intent submission parameters
[OUTPUT]: Validation errors naming the offending field
[POS]:    Intent layer - client-side checks before a request leaves the process
[UPDATE]: When the gateway tightens request validation
*/

use crate::http::{EkidenError, Result};
use crate::types::{ActionPayload, SendIntentRequest};

pub fn validate_signature(signature: &str) -> Result<()> {
    if signature.is_empty() {
        return Err(EkidenError::validation(
            "signature",
            "Signature must be a non-empty string",
        ));
    }
    if !signature.starts_with("0x") {
        return Err(EkidenError::validation(
            "signature",
            "Signature must start with 0x",
        ));
    }
    Ok(())
}

pub fn validate_market_address(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(EkidenError::validation(
            "market_addr",
            "Market address must be a non-empty string",
        ));
    }
    if !address.starts_with("0x") {
        return Err(EkidenError::validation(
            "market_addr",
            "Market address must start with 0x",
        ));
    }
    Ok(())
}

pub fn validate_leverage(leverage: u64) -> Result<()> {
    if leverage < 1 {
        return Err(EkidenError::validation(
            "leverage",
            "Leverage must be a positive integer",
        ));
    }
    Ok(())
}

/// Checks applied to every intent before submission
pub fn validate_intent(request: &SendIntentRequest) -> Result<()> {
    validate_signature(&request.signature)?;

    if let ActionPayload::LeverageAssign {
        leverage,
        market_addr,
    } = &request.payload
    {
        validate_leverage(*leverage)?;
        validate_market_address(market_addr)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(payload: ActionPayload, signature: &str) -> SendIntentRequest {
        SendIntentRequest {
            nonce: 1,
            payload,
            signature: signature.to_string(),
            sub_account_address: None,
        }
    }

    #[test]
    fn test_signature_rules() {
        assert!(validate_intent(&request(ActionPayload::OrderCancelAll, "0xdead")).is_ok());

        match validate_intent(&request(ActionPayload::OrderCancelAll, "dead")) {
            Err(EkidenError::Validation { field, .. }) => assert_eq!(field, "signature"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(validate_intent(&request(ActionPayload::OrderCancelAll, "")).is_err());
    }

    #[test]
    fn test_leverage_assign_rules() {
        let zero = ActionPayload::LeverageAssign {
            leverage: 0,
            market_addr: "0xabc".to_string(),
        };
        match validate_intent(&request(zero, "0x01")) {
            Err(EkidenError::Validation { field, .. }) => assert_eq!(field, "leverage"),
            other => panic!("unexpected result: {other:?}"),
        }

        let bad_market = ActionPayload::LeverageAssign {
            leverage: 2,
            market_addr: "abc".to_string(),
        };
        match validate_intent(&request(bad_market, "0x01")) {
            Err(EkidenError::Validation { field, .. }) => assert_eq!(field, "market_addr"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
