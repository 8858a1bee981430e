/*
[INPUT]:  Encoded intent bytes and optional secret key material
[OUTPUT]: Ed25519 signatures and hex-encoded public keys
[POS]:    Auth layer - signing capability consumed by the intent builder
[UPDATE]: When changing signing algorithm or key format
*/

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use rand::rngs::OsRng;

use crate::http::{EkidenError, Result};

/// Aptos-style private key prefix (AIP-80)
const ED25519_PRIVATE_KEY_PREFIX: &str = "ed25519-priv-";

/// Signing capability for intents.
///
/// Implement this for hardware wallets, remote signers or anything else
/// that can produce a signature over raw bytes.
pub trait IntentSigner: Send + Sync {
    /// Sign `message` and return the raw signature bytes
    fn sign_bytes(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Ed25519 signer for intents
#[derive(Debug)]
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create signer from existing secret key bytes (32 bytes)
    pub fn from_secret_key(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        Self { signing_key }
    }

    /// Parse a hex private key, with or without `0x` / `ed25519-priv-0x` prefixes
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let trimmed = private_key.trim();
        let trimmed = trimmed
            .strip_prefix(ED25519_PRIVATE_KEY_PREFIX)
            .unwrap_or(trimmed);
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let bytes = hex::decode(trimmed)
            .map_err(|e| EkidenError::Signing(format!("invalid private key hex: {e}")))?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            EkidenError::Signing(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_secret_key(&key))
    }

    /// Sign a message and return the signature
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Public key as `0x`-prefixed lowercase hex
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public_key_bytes()))
    }

    /// Get the raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Verify a signature against a message
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify(message, signature)
            .is_ok()
    }
}

impl IntentSigner for Ed25519Signer {
    fn sign_bytes(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.sign(message).to_bytes().to_vec())
    }
}
