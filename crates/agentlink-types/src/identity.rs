//! Ed25519 identities for agents and owners.
//!
//! A public key is an agent's (or owner's) address. Inside protocol structures it
//! always travels as a lowercase hex string; this module is the only place that
//! deals with raw key bytes.
//!
//! Verification is total: any malformed key or signature makes it return `false`
//! rather than an error, so callers never need to distinguish "bad input" from
//! "bad signature".

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length of an ed25519 public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;
/// Length of an ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// An ed25519 keypair.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a keypair from its 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Rebuild a keypair from a hex-encoded secret seed.
    pub fn from_hex(seed_hex: &str) -> Result<Self> {
        let bytes = hex::decode(seed_hex.trim()).map_err(|e| Error::InvalidHex(e.to_string()))?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidKey("secret seed must be 32 bytes".to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Export the secret seed as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key as the lowercase hex address used in protocol structures.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Sign an arbitrary byte message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Serializable form for key files.
    pub fn to_key_file(&self) -> KeyFile {
        KeyFile {
            public_key: self.public_key_hex(),
            secret_key: self.to_hex(),
        }
    }

    /// Load from a key file, rejecting files whose public key does not match the seed.
    pub fn from_key_file(file: &KeyFile) -> Result<Self> {
        let keypair = Self::from_hex(&file.secret_key)?;
        if !keypair.public_key_hex().eq_ignore_ascii_case(file.public_key.trim()) {
            return Err(Error::InvalidKey(
                "public key does not match secret key".to_string(),
            ));
        }
        Ok(keypair)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// A detached ed25519 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Raw signature bytes.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0
    }

    /// Lowercase hex form used in protocol structures.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// On-disk representation of a keypair (both halves hex encoded).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFile {
    pub public_key: String,
    pub secret_key: String,
}

/// Verify `signature` over `message` with a raw public key.
///
/// Returns `false` for wrong-length or off-curve keys and malformed signatures.
pub fn verify(signature: &[u8], message: &[u8], public_key: &[u8]) -> bool {
    let Ok(pk_bytes) = <[u8; PUBLIC_KEY_LENGTH]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk_bytes) else {
        return false;
    };
    let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

/// Verify a hex-encoded signature against a hex-encoded public key.
///
/// Both strings must be lowercase hex; any other spelling of the same bytes
/// fails verification.
pub fn verify_hex(signature_hex: &str, message: &[u8], public_key_hex: &str) -> bool {
    match (decode_lower_hex(signature_hex), decode_lower_hex(public_key_hex)) {
        (Some(sig), Some(pk)) => verify(&sig, message, &pk),
        _ => false,
    }
}

/// Whether `s` looks like a hex-encoded ed25519 public key.
pub fn is_public_key_hex(s: &str) -> bool {
    s.len() == PUBLIC_KEY_LENGTH * 2 && is_lower_hex(s)
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn decode_lower_hex(s: &str) -> Option<Vec<u8>> {
    if !is_lower_hex(s) {
        return None;
    }
    hex::decode(s).ok()
}
