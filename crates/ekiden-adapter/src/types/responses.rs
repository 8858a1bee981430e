/*
[INPUT]:  Gateway schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentOutput {
    OrderCreate { outputs: Vec<OrderCreateOutput> },
    OrderCancel { outputs: Vec<OrderCancelOutput> },
    LeverageAssign { success: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreateOutput {
    pub sid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelOutput {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendIntentResponse {
    pub output: IntentOutput,
    pub seq: u64,
    pub version: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendIntentWithCommitResponse {
    pub output: IntentOutput,
    pub sid: String,
    pub status: i32,
    pub seq: u64,
    pub version: u64,
    pub timestamp: u64,
    #[serde(default)]
    pub error_message: String,
}
