use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

/// width of the opaque ids used for tracking ids, job ids and suppression ids
const OPAQUE_ID_LEN: usize = 24;

/// generates a random alphanumeric identifier of the given length
pub fn opaque_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// a 24 char opaque id, the width used for click/open tracking ids and job ids
pub fn tracking_id() -> String {
    opaque_id(OPAQUE_ID_LEN)
}

/// a time-sortable event id: a millisecond timestamp prefix (hex, zero padded
/// to 13 chars) followed by a random suffix, so events created in the same
/// millisecond still sort by creation order while remaining unique.
pub fn event_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!("evt_{millis:013x}{}", opaque_id(10))
}

/// sha-256 hex digest of a raw API key, the value stored as `domain_api_key.key_hash`
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_id_has_requested_length() {
        assert_eq!(opaque_id(24).len(), 24);
        assert_eq!(opaque_id(10).len(), 10);
    }

    #[test]
    fn event_ids_are_lexically_sortable_by_creation_order() {
        let a = event_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = event_id();
        assert!(a < b);
    }

    #[test]
    fn sha256_hex_is_stable_and_deterministic() {
        let a = sha256_hex("my-api-key");
        let b = sha256_hex("my-api-key");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, sha256_hex("a-different-key"));
    }
}
