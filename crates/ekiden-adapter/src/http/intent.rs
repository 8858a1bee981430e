/*
[INPUT]:  Signed intent request bodies and bearer token
[OUTPUT]: Intent acknowledgements (optionally waited until commit)
[POS]:    HTTP layer - intent submission endpoints (require auth)
[UPDATE]: When adding intent endpoints or changing submission flow
*/

use reqwest::Method;

use crate::http::{GatewayClient, Result};
use crate::intent::validate_intent;
use crate::types::{SendIntentRequest, SendIntentResponse, SendIntentWithCommitResponse};

impl GatewayClient {
    /// Submit a signed intent
    ///
    /// POST {api_prefix}/user/intent
    pub async fn send_intent(&self, req: &SendIntentRequest) -> Result<SendIntentResponse> {
        let builder = self.authed_request(Method::POST, "/user/intent")?;
        validate_intent(req)?;
        self.send_json(builder.json(req)).await
    }

    /// Submit a signed intent and wait until it is committed
    ///
    /// POST {api_prefix}/user/intent/commit
    pub async fn send_intent_with_commit(
        &self,
        req: &SendIntentRequest,
    ) -> Result<SendIntentWithCommitResponse> {
        let builder = self.authed_request(Method::POST, "/user/intent/commit")?;
        validate_intent(req)?;
        self.send_json(builder.json(req)).await
    }
}
