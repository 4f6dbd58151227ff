//! Content fingerprints and application identifiers.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of a hex-rendered SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// SHA-256 of the raw document bytes, lowercase hex.
///
/// Depends only on the bytes, never on media type or filename.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Whether `s` has the shape of a [`fingerprint`] output.
pub fn is_valid_hash(s: &str) -> bool {
    s.len() == HASH_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Fresh random (v4) UUID for a submission.
pub fn new_application_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn known_digests() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fingerprint_is_deterministic_and_well_formed() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let a = fingerprint(&bytes);
        let b = fingerprint(&bytes);
        assert_eq!(a, b);
        assert!(is_valid_hash(&a));
    }

    #[test]
    fn single_byte_change_changes_digest() {
        let mut bytes = b"%PDF-1.5 resume".to_vec();
        let before = fingerprint(&bytes);
        bytes[9] ^= 1;
        assert_ne!(before, fingerprint(&bytes));
    }

    #[test]
    fn hash_shape_validation() {
        assert!(is_valid_hash(&"0".repeat(64)));
        assert!(!is_valid_hash(&"0".repeat(63)));
        assert!(!is_valid_hash(&"A".repeat(64)));
        assert!(!is_valid_hash(&"g".repeat(64)));
    }

    #[test]
    fn application_ids_do_not_collide() {
        const TRIALS: usize = 1_000_000;
        let mut seen = HashSet::with_capacity(TRIALS);
        for _ in 0..TRIALS {
            assert!(seen.insert(new_application_id()));
        }
    }
}
