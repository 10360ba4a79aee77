//! Cache key normalization and deterministic vector point IDs.

use sha2::{Digest, Sha256};

/// Normalized exact-match key: `"{query}:{location}"`, trimmed and
/// lowercased so formatting differences never split cache entries.
#[must_use]
pub fn normalize_key(query: &str, location: &str) -> String {
    format!(
        "{}:{}",
        query.trim().to_lowercase(),
        location.trim().to_lowercase()
    )
}

/// Text embedded for similarity search: `"{query} {location}"`, normalized
/// the same way as the exact key.
#[must_use]
pub fn semantic_text(query: &str, location: &str) -> String {
    format!(
        "{} {}",
        query.trim().to_lowercase(),
        location.trim().to_lowercase()
    )
}

/// Derive a stable vector point ID (u64) from a cache key.
///
/// Takes the first 8 bytes of SHA-256(key) as a big-endian u64, so the same
/// key always lands on the same point (natural deduplication on upsert).
///
/// # Panics
///
/// Never panics: a SHA-256 digest is always at least 8 bytes.
#[must_use]
pub fn point_id(key: &str) -> u64 {
    let hash = Sha256::digest(key.as_bytes());
    let bytes: [u8; 8] = hash[..8].try_into().expect("SHA256 is at least 8 bytes");
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_trims_and_lowercases() {
        assert_eq!(
            normalize_key("  Agencias Toyota ", " 19.4326,-99.1332 "),
            "agencias toyota:19.4326,-99.1332"
        );
    }

    #[test]
    fn equivalent_queries_share_a_key() {
        assert_eq!(
            normalize_key("AGENCIAS DE AUTOS", "19.43,-99.13"),
            normalize_key("agencias de autos", "19.43,-99.13")
        );
    }

    #[test]
    fn point_id_is_stable() {
        let key = normalize_key("agencias de autos", "19.43,-99.13");
        assert_eq!(point_id(&key), point_id(&key));
    }

    #[test]
    fn different_keys_produce_different_ids() {
        assert_ne!(point_id("a:1,1"), point_id("b:1,1"));
    }
}
