/*
[INPUT]:  Signing keys and gateway-issued bearer tokens
[OUTPUT]: Intent signatures and shared token state
[POS]:    Auth layer - signing capability and token lifecycle
[UPDATE]: When auth flow or signature methods change
*/

pub mod signer;
pub mod token;

pub use signer::{Ed25519Signer, IntentSigner};
pub use token::{TokenData, TokenStore};
