//! Ed25519 adapter for the `SignatureVerifier` port

use crate::ports::SignatureVerifier;
use shared_types::{verify_signature, PublicKey, Signature};

/// Verifies contender signatures with Ed25519.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        verify_signature(public_key, message, signature)
    }
}
