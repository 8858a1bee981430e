/*
[INPUT]:  Action payloads, nonces and a signing capability
[OUTPUT]: Encoded intent bytes, order SIDs and signed submission bodies
[POS]:    Intent layer - everything between "build an action" and "submit it"
[UPDATE]: When the action set or signing envelope changes
*/

pub mod encoder;
pub mod sid;
pub mod units;
pub mod validate;

use chrono::Utc;

use crate::auth::IntentSigner;
use crate::http::Result;
use crate::types::{ActionPayload, SendIntentRequest};

pub use encoder::{BcsWriter, INTENT_SEED, encode_intent, encode_intent_hex, encode_intent_value};
pub use sid::{OrderSidParams, order_sid};
pub use units::{from_fixed_point, to_fixed_point};
pub use validate::validate_intent;

/// Nonce in Unix seconds
pub fn current_nonce() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// An action with the signature over its encoded bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIntent {
    pub nonce: u64,
    pub payload: ActionPayload,
    /// `0x`-prefixed lowercase hex
    pub signature: String,
}

impl SignedIntent {
    /// Encode `payload` with `nonce` and sign the resulting bytes
    pub fn sign(payload: ActionPayload, nonce: u64, signer: &dyn IntentSigner) -> Result<Self> {
        let bytes = encode_intent(&payload, nonce);
        let signature = signer.sign_bytes(&bytes)?;
        Ok(Self {
            nonce,
            payload,
            signature: format!("0x{}", hex::encode(signature)),
        })
    }

    /// Submission body, optionally on behalf of a sub-account
    pub fn into_request(self, sub_account_address: Option<String>) -> SendIntentRequest {
        SendIntentRequest {
            nonce: self.nonce,
            payload: self.payload,
            signature: self.signature,
            sub_account_address,
        }
    }
}
