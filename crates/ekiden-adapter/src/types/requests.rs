/*
[INPUT]:  Signed intents produced by the intent module
[OUTPUT]: Request bodies for the gateway intent endpoints
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::ActionPayload;

/// Body of `POST /user/intent` and `POST /user/intent/commit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendIntentRequest {
    pub nonce: u64,
    pub payload: ActionPayload,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_account_address: Option<String>,
}
