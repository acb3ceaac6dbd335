//! Credential digesting.
//!
//! Used before any password reaches the store and when checking a login.
//! The authorization policy never calls into this module.

use sha2::{Digest, Sha256};

/// One-way password digest.
pub trait CredentialHasher: Send + Sync {
    fn digest(&self, plaintext: &str) -> String;

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        self.digest(plaintext) == digest
    }
}

/// Unsalted SHA-256 over the UTF-8 bytes, lowercase hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn digest(&self, plaintext: &str) -> String {
        hex::encode(Sha256::digest(plaintext.as_bytes()))
    }
}
