/*
[INPUT]:  EKIDEN_PRIVATE_KEY and EKIDEN_TOKEN environment variables
[OUTPUT]: A signed leverage intent, optionally submitted to testnet
[POS]:    Examples - intent signing and submission
[UPDATE]: When intent encoding or submission API changes
*/

use ekiden_adapter::{
    ActionPayload, ClientConfig, Ed25519Signer, GatewayClient, SignedIntent, current_nonce,
    encode_intent,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Example: sign an intent and submit it when a token is available
#[tokio::main]
async fn main() -> ekiden_adapter::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let signer = match std::env::var("EKIDEN_PRIVATE_KEY") {
        Ok(key) => Ed25519Signer::from_hex(&key)?,
        Err(_) => Ed25519Signer::generate(),
    };
    info!(public_key = %signer.public_key_hex(), "signer ready");

    let payload = ActionPayload::LeverageAssign {
        leverage: 5,
        market_addr: "0x88f4f63b3a9a7b6b7e3bb09e2a4c1e11".to_string(),
    };
    let nonce = current_nonce();
    info!(
        bytes = %hex::encode(encode_intent(&payload, nonce)),
        nonce,
        "encoded intent"
    );

    let signed = SignedIntent::sign(payload, nonce, &signer)?;
    info!(signature = %signed.signature, "signed intent");

    let Ok(token) = std::env::var("EKIDEN_TOKEN") else {
        info!("EKIDEN_TOKEN not set, skipping submission");
        return Ok(());
    };

    let client = GatewayClient::with_config(&ClientConfig::testnet())?;
    client.set_token(token);
    let response = client
        .send_intent_with_commit(&signed.into_request(None))
        .await?;
    info!(sid = %response.sid, status = response.status, seq = response.seq, "intent committed");
    Ok(())
}
