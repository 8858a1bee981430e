/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for the gateway client
[POS]:    Integration tests - HTTP endpoints
[UPDATE]: When HTTP endpoints change
*/

mod common;

use common::{mock_config, mock_jwt_token, setup_mock_server, test_signer};
use ekiden_adapter::{
    ActionPayload, EkidenError, GatewayClient, IntentOutput, OrderKind, OrderSpec, Side,
    SignedIntent, encode_intent,
};
use rstest::rstest;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn order_create() -> ActionPayload {
    ActionPayload::OrderCreate {
        orders: vec![OrderSpec::new(
            Side::Buy,
            OrderKind::Limit,
            "0x88f4f63b3a9a7b6b7e3bb09e2a4c1e11",
            1_000_000,
            65_000_000_000,
            5,
        )],
    }
}

#[test]
fn test_client_creation() {
    let _client = assert_ok!(GatewayClient::new());
}

#[tokio::test]
async fn test_signed_order_submission() {
    let server = setup_mock_server().await;
    let client = assert_ok!(GatewayClient::with_config(&mock_config(&server)));
    client.set_token(mock_jwt_token());

    let signer = test_signer();
    let signed = assert_ok!(SignedIntent::sign(order_create(), 1_700_000_000, &signer));
    let expected_sig = format!(
        "0x{}",
        hex::encode(signer.sign(&encode_intent(&order_create(), 1_700_000_000)).to_bytes())
    );
    assert_eq!(signed.signature, expected_sig);

    Mock::given(method("POST"))
        .and(path("/api/v1/user/intent"))
        .and(header("authorization", format!("Bearer {}", mock_jwt_token()).as_str()))
        .and(body_partial_json(serde_json::json!({
            "nonce": 1_700_000_000u64,
            "signature": expected_sig,
            "payload": {"type": "order_create"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "output": {"type": "order_create", "outputs": [{"sid": "0xsid"}]},
            "seq": 10,
            "version": 3,
            "timestamp": 1_700_000_000_123u64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = assert_ok!(client.send_intent(&signed.into_request(None)).await);
    match response.output {
        IntentOutput::OrderCreate { outputs } => assert_eq!(outputs[0].sid, "0xsid"),
        other => panic!("unexpected output: {other:?}"),
    }
    assert_eq!(response.seq, 10);
}

#[tokio::test]
async fn test_commit_submission_for_sub_account() {
    let server = setup_mock_server().await;
    let client = assert_ok!(GatewayClient::with_config(&mock_config(&server)));
    client.set_token(mock_jwt_token());

    Mock::given(method("POST"))
        .and(path("/api/v1/user/intent/commit"))
        .and(body_partial_json(serde_json::json!({"sub_account_address": "0xsub"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "output": {"type": "order_cancel", "outputs": [{"success": true}]},
            "sid": "0xcancel",
            "status": 1,
            "seq": 11,
            "version": 4,
            "timestamp": 1_700_000_000_456u64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = ActionPayload::OrderCancel {
        cancels: vec![ekiden_adapter::OrderCancel {
            sid: "0xorder".to_string(),
        }],
    };
    let signed = assert_ok!(SignedIntent::sign(payload, 7, &test_signer()));
    let response = assert_ok!(
        client
            .send_intent_with_commit(&signed.into_request(Some("0xsub".to_string())))
            .await
    );
    assert_eq!(response.sid, "0xcancel");
    assert_eq!(response.status, 1);
    assert!(response.error_message.is_empty());
}

#[rstest]
#[case(401, false, true)]
#[case(403, false, true)]
#[case(429, true, false)]
#[case(500, true, false)]
#[case(400, false, false)]
#[tokio::test]
async fn test_status_mapping(
    #[case] status: u16,
    #[case] retryable: bool,
    #[case] auth_error: bool,
) {
    let server = setup_mock_server().await;
    let client = assert_ok!(GatewayClient::with_config(&mock_config(&server)));
    client.set_token(mock_jwt_token());

    Mock::given(method("POST"))
        .and(path("/api/v1/user/intent"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "error": "rejected"
        })))
        .mount(&server)
        .await;

    let signed = assert_ok!(SignedIntent::sign(
        ActionPayload::OrderCancelAll,
        1,
        &test_signer()
    ));
    let err = client
        .send_intent(&signed.into_request(None))
        .await
        .unwrap_err();

    match &err {
        EkidenError::Api { code, message } => {
            assert_eq!(*code, i32::from(status));
            assert!(message.contains("rejected"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.is_retryable(), retryable);
    assert_eq!(err.is_auth_error(), auth_error);
}

#[tokio::test]
async fn test_bad_signature_rejected_before_send() {
    let server = setup_mock_server().await;
    let client = assert_ok!(GatewayClient::with_config(&mock_config(&server)));
    client.set_token(mock_jwt_token());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut request = assert_ok!(SignedIntent::sign(
        ActionPayload::OrderCancelAll,
        1,
        &test_signer()
    ))
    .into_request(None);
    request.signature = "deadbeef".to_string();

    assert!(matches!(
        client.send_intent(&request).await,
        Err(EkidenError::Validation { .. })
    ));
}
