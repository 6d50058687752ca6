//! Owner-issued delegation certificates and fleet recognition.
//!
//! An owner binds an agent's public key to its own with a signed, time-bounded
//! certificate. Two agents holding valid certificates from the same owner are
//! fleet siblings. Verification is a pure function of the certificate and the
//! clock, so nothing here caches a "verified" flag: every check re-verifies,
//! including expiry.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canonical::encode_unsigned;
use crate::capability::glob_matches;
use crate::error::{Error, Result};
use crate::identity::{self, Keypair};

/// A signed statement "`owner` authorizes `agent` for `scope` until `expires_at`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationCertificate {
    /// Owner public key (hex). Also the fleet identifier.
    pub owner: String,
    /// Agent public key (hex).
    pub agent: String,
    /// Capability-name patterns the agent may act on.
    pub scope: Vec<String>,
    /// Issue time, epoch milliseconds.
    pub issued_at: i64,
    /// Expiry time, epoch milliseconds (exclusive).
    pub expires_at: i64,
    /// Owner's signature over the canonical encoding of the other fields (hex).
    pub signature: String,
}

/// Why a certificate failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelegationError {
    #[error("certificate expired at {expires_at} (now {now})")]
    Expired { expires_at: i64, now: i64 },

    #[error("certificate signature is invalid")]
    InvalidSignature,

    #[error("malformed certificate: {0}")]
    Malformed(String),
}

impl DelegationCertificate {
    /// Whether any scope pattern covers `capability`.
    pub fn permits(&self, capability: &str) -> bool {
        self.scope
            .iter()
            .any(|pattern| glob_matches(pattern, capability))
    }

    /// Whether the certificate is past its expiry at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }
}

/// Issue a certificate valid from now for `ttl`.
pub fn create_certificate(
    owner: &Keypair,
    agent_public_key: &str,
    scope: Vec<String>,
    ttl: Duration,
) -> Result<DelegationCertificate> {
    create_certificate_at(owner, agent_public_key, scope, ttl, crate::now_ms())
}

/// Issue a certificate with an explicit issue time.
pub fn create_certificate_at(
    owner: &Keypair,
    agent_public_key: &str,
    scope: Vec<String>,
    ttl: Duration,
    issued_at: i64,
) -> Result<DelegationCertificate> {
    if !identity::is_public_key_hex(agent_public_key) {
        return Err(Error::InvalidKey(format!(
            "agent public key is not 32 hex-encoded bytes: {agent_public_key}"
        )));
    }
    let ttl_ms = i64::try_from(ttl.as_millis())
        .map_err(|_| Error::InvalidCertificate("ttl is too large".to_string()))?;
    if ttl_ms <= 0 {
        return Err(Error::InvalidCertificate(
            "ttl must be at least one millisecond".to_string(),
        ));
    }

    let mut cert = DelegationCertificate {
        owner: owner.public_key_hex(),
        agent: agent_public_key.to_lowercase(),
        scope,
        issued_at,
        expires_at: issued_at.saturating_add(ttl_ms),
        signature: String::new(),
    };
    let signature = owner.sign(&encode_unsigned(&cert)?);
    cert.signature = signature.to_hex();
    Ok(cert)
}

/// Verify a certificate against the current time.
pub fn verify_certificate(cert: &DelegationCertificate) -> bool {
    verify_certificate_at(cert, crate::now_ms())
}

/// Verify a certificate against an explicit time.
pub fn verify_certificate_at(cert: &DelegationCertificate, now_ms: i64) -> bool {
    verify_certificate_detailed(cert, now_ms).is_ok()
}

/// Verify a certificate, reporting the reason for rejection.
pub fn verify_certificate_detailed(
    cert: &DelegationCertificate,
    now_ms: i64,
) -> std::result::Result<(), DelegationError> {
    if cert.is_expired_at(now_ms) {
        return Err(DelegationError::Expired {
            expires_at: cert.expires_at,
            now: now_ms,
        });
    }
    if cert.expires_at <= cert.issued_at {
        return Err(DelegationError::Malformed(
            "expiresAt must be after issuedAt".to_string(),
        ));
    }
    let message =
        encode_unsigned(cert).map_err(|e| DelegationError::Malformed(e.to_string()))?;
    if identity::verify_hex(&cert.signature, &message, &cert.owner) {
        Ok(())
    } else {
        Err(DelegationError::InvalidSignature)
    }
}

/// True iff both certificates verify now and share an owner.
pub fn is_fleet_sibling(a: &DelegationCertificate, b: &DelegationCertificate) -> bool {
    is_fleet_sibling_at(a, b, crate::now_ms())
}

/// [`is_fleet_sibling`] at an explicit time.
pub fn is_fleet_sibling_at(
    a: &DelegationCertificate,
    b: &DelegationCertificate,
    now_ms: i64,
) -> bool {
    verify_certificate_at(a, now_ms) && verify_certificate_at(b, now_ms) && a.owner == b.owner
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn scope(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_and_verify() {
        let owner = Keypair::generate();
        let agent = Keypair::generate();
        let cert =
            create_certificate(&owner, &agent.public_key_hex(), scope(&["echo"]), HOUR).unwrap();

        assert_eq!(cert.owner, owner.public_key_hex());
        assert_eq!(cert.agent, agent.public_key_hex());
        assert_eq!(cert.expires_at - cert.issued_at, 3_600_000);
        assert!(verify_certificate(&cert));
    }

    #[test]
    fn test_expired_certificate_fails_even_with_valid_signature() {
        let owner = Keypair::generate();
        let agent = Keypair::generate();
        let cert = create_certificate_at(
            &owner,
            &agent.public_key_hex(),
            scope(&["*"]),
            Duration::from_millis(1000),
            10_000,
        )
        .unwrap();

        assert!(verify_certificate_at(&cert, 10_999));
        assert!(!verify_certificate_at(&cert, 11_000));
        assert_eq!(
            verify_certificate_detailed(&cert, 20_000),
            Err(DelegationError::Expired {
                expires_at: 11_000,
                now: 20_000
            })
        );
    }

    #[test]
    fn test_tampered_fields_fail() {
        let owner = Keypair::generate();
        let agent = Keypair::generate();
        let intruder = Keypair::generate();
        let cert =
            create_certificate(&owner, &agent.public_key_hex(), scope(&["echo"]), HOUR).unwrap();

        let mut widened = cert.clone();
        widened.scope.push("shell".to_string());
        assert!(!verify_certificate(&widened));

        let mut swapped = cert.clone();
        swapped.agent = intruder.public_key_hex();
        assert!(!verify_certificate(&swapped));

        let mut extended = cert.clone();
        extended.expires_at += 1;
        assert!(!verify_certificate(&extended));

        let mut forged = cert;
        forged.signature = "ab".repeat(64);
        assert_eq!(
            verify_certificate_detailed(&forged, crate::now_ms()),
            Err(DelegationError::InvalidSignature)
        );
    }

    #[test]
    fn test_fleet_siblings_same_owner() {
        let owner = Keypair::generate();
        let a = create_certificate(&owner, &Keypair::generate().public_key_hex(), scope(&["*"]), HOUR)
            .unwrap();
        let b = create_certificate(&owner, &Keypair::generate().public_key_hex(), scope(&["*"]), HOUR)
            .unwrap();
        assert!(is_fleet_sibling(&a, &b));
        assert!(is_fleet_sibling(&b, &a));
    }

    #[test]
    fn test_fleet_siblings_different_owner_or_invalid() {
        let owner_a = Keypair::generate();
        let owner_b = Keypair::generate();
        let agent = Keypair::generate().public_key_hex();
        let a = create_certificate(&owner_a, &agent, scope(&["*"]), HOUR).unwrap();
        let c = create_certificate(&owner_b, &agent, scope(&["*"]), HOUR).unwrap();
        assert!(!is_fleet_sibling(&a, &c));
        assert!(!is_fleet_sibling(&c, &a));

        let mut bad = create_certificate(&owner_a, &agent, scope(&["*"]), HOUR).unwrap();
        bad.scope.clear();
        assert!(!is_fleet_sibling(&a, &bad));
        assert!(!is_fleet_sibling(&bad, &a));
    }

    #[test]
    fn test_expired_siblings_are_not_siblings() {
        let owner = Keypair::generate();
        let a = create_certificate_at(
            &owner,
            &Keypair::generate().public_key_hex(),
            scope(&["*"]),
            Duration::from_secs(1),
            0,
        )
        .unwrap();
        let b = create_certificate_at(
            &owner,
            &Keypair::generate().public_key_hex(),
            scope(&["*"]),
            Duration::from_secs(1),
            0,
        )
        .unwrap();
        assert!(is_fleet_sibling_at(&a, &b, 500));
        assert!(!is_fleet_sibling_at(&a, &b, 1_000));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let owner = Keypair::generate();
        assert!(create_certificate(&owner, "not-a-key", scope(&["*"]), HOUR).is_err());
        assert!(create_certificate(
            &owner,
            &Keypair::generate().public_key_hex(),
            scope(&["*"]),
            Duration::ZERO
        )
        .is_err());
    }

    #[test]
    fn test_scope_permits() {
        let owner = Keypair::generate();
        let cert = create_certificate(
            &owner,
            &Keypair::generate().public_key_hex(),
            scope(&["echo", "fs.*"]),
            HOUR,
        )
        .unwrap();
        assert!(cert.permits("echo"));
        assert!(cert.permits("fs.read"));
        assert!(!cert.permits("shell"));
    }

    #[test]
    fn test_certificate_json_uses_camel_case() {
        let owner = Keypair::generate();
        let cert = create_certificate(
            &owner,
            &Keypair::generate().public_key_hex(),
            scope(&["echo"]),
            HOUR,
        )
        .unwrap();
        let json = serde_json::to_value(&cert).unwrap();
        assert!(json.get("issuedAt").is_some());
        assert!(json.get("expiresAt").is_some());
        let back: DelegationCertificate = serde_json::from_value(json).unwrap();
        assert!(verify_certificate(&back));
    }
}
