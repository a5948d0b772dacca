//! Deterministic contract identities and content hashes.
//!
//! Identities combine the contract name with its input and output type tags
//! through a length-prefixed SHA-256 digest truncated to 64 bits. The
//! length prefix keeps the combination unambiguous (`("ab", "c")` and
//! `("a", "bc")` hash differently), and the digest is stable across
//! processes and builds, unlike seeded runtime hashers.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::contract::{Contract, TypeTag};

/// Deterministic identity of a registered contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ContractId(u64);

impl ContractId {
    /// Sentinel identity carried by empty metadata and empty results.
    pub const EMPTY: Self = Self(0);

    /// Wraps a raw identity value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identity value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns `true` for the sentinel identity.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == Self::EMPTY.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:016x}", self.0)
    }
}

/// Computes the identity of a contract value.
#[must_use]
pub fn contract_id(contract: &Contract) -> ContractId {
    identity_of(contract.name(), contract.input(), contract.output())
}

/// Computes the identity for a (name, input tag, output tag) triple.
///
/// Identical triples always yield the same identity across independent
/// computations; the dispatch layer relies on this to match caller-supplied
/// contracts against startup-registered metadata.
#[must_use]
pub fn identity_of(name: &str, input: &TypeTag, output: &TypeTag) -> ContractId {
    ContractId(stable64(&[
        name.as_bytes(),
        input.as_str().as_bytes(),
        output.as_str().as_bytes(),
    ]))
}

/// Computes the content hash of a raw result payload.
///
/// Used purely for change detection between consecutive results; two
/// syntactically different payloads hash differently even when they decode
/// to equal models.
#[must_use]
pub fn content_hash(raw: &str) -> u64 {
    stable64(&[raw.as_bytes()])
}

fn stable64(parts: &[&[u8]]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(u64::try_from(part.len()).unwrap_or(u64::MAX).to_le_bytes());
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut word = [0_u8; 8];
    word.copy_from_slice(digest.get(..8).unwrap_or(&[0; 8]));
    u64::from_le_bytes(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> Contract {
        Contract::new(name, TypeTag::named("request"), TypeTag::named("response"))
    }

    #[test]
    fn identical_triples_share_an_identity() {
        let first = contract_id(&sample("GetProfileContract"));
        let second = contract_id(&sample("GetProfileContract"));
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn identity_ignores_payload_and_path() {
        let bare = sample("PingContract");
        let dressed = sample("PingContract")
            .with_path("api/ping")
            .with_payload(serde_json::json!({"value": 1}));
        assert_eq!(contract_id(&bare), contract_id(&dressed));
    }

    #[test]
    fn any_component_changes_the_identity() {
        let base = identity_of(
            "PingContract",
            &TypeTag::named("request"),
            &TypeTag::named("response"),
        );
        let renamed = identity_of(
            "PongContract",
            &TypeTag::named("request"),
            &TypeTag::named("response"),
        );
        let retyped = identity_of(
            "PingContract",
            &TypeTag::named("request"),
            &TypeTag::named("other"),
        );
        assert_ne!(base, renamed);
        assert_ne!(base, retyped);
    }

    #[test]
    fn component_boundaries_are_unambiguous() {
        let joined = identity_of("ab", &TypeTag::named("c"), &TypeTag::STRING);
        let split = identity_of("a", &TypeTag::named("bc"), &TypeTag::STRING);
        assert_ne!(joined, split);
    }

    #[test]
    fn content_hash_tracks_raw_text() {
        assert_eq!(content_hash("{\"value\":1}"), content_hash("{\"value\":1}"));
        assert_ne!(content_hash("{\"value\":1}"), content_hash("{\"value\": 1}"));
    }
}
