//! # Hashing Utilities
//!
//! BLAKE3 is the only hash function in Regalium. It is fast, has a proper
//! key-derivation mode for domain separation, and produces 32-byte digests
//! that double as mining proofs and state fingerprints.

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use regalium_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"regalium");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash over several byte slices.
///
/// Uses BLAKE3's `derive_key` mode, so two contexts can never collide even
/// when fed identical data. Parts are streamed into the hasher without an
/// intermediate buffer; callers are responsible for making the encoding
/// unambiguous (fixed-width integers, separators between variable-length
/// fields).
pub fn domain_separated_hash(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Fingerprint of a serialized ledger snapshot, hex-encoded.
///
/// Two nodes holding byte-identical snapshots report the same digest.
pub fn snapshot_digest(snapshot: &[u8]) -> String {
    hex::encode(blake3_hash(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake3_deterministic() {
        let a = blake3_hash(b"regalium");
        let b = blake3_hash(b"regalium");
        assert_eq!(a, b);
    }

    #[test]
    fn blake3_different_inputs() {
        assert_ne!(blake3_hash(b"regalium"), blake3_hash(b"Regalium"));
    }

    #[test]
    fn blake3_empty_known_vector() {
        assert_eq!(
            hex::encode(blake3_hash(b"")),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn domain_separation() {
        let data: &[&[u8]] = &[b"same", b"data"];
        assert_ne!(
            domain_separated_hash("context-a", data),
            domain_separated_hash("context-b", data)
        );
    }

    #[test]
    fn domain_hash_streams_parts() {
        // Splitting the input differently must not change the digest.
        let split = domain_separated_hash("ctx", &[b"ab", b"cd"]);
        let joined = domain_separated_hash("ctx", &[b"abcd"]);
        assert_eq!(split, joined);
    }

    #[test]
    fn snapshot_digest_is_hex() {
        let digest = snapshot_digest(b"state");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
