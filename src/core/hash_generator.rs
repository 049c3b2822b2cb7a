use rand::RngCore;

use crate::core::models::UserRecord;
use crate::error::Result;

/// Random bytes behind each hash token (16 bytes = 32 hex chars).
pub const HASH_BYTES: usize = 16;

/// A fresh, high-entropy lowercase hex token for a new record.
pub fn generate_hash() -> String {
    let mut bytes = [0u8; HASH_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// JSON snippet to paste into the user table for a new hash.
pub fn record_template(hash: &str) -> Result<String> {
    let record = UserRecord::new(hash, "User Name Here", vec!["https://example.com".to_string()]);
    Ok(serde_json::to_string_pretty(&record)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_shape() {
        let hash = generate_hash();
        assert_eq!(hash.len(), HASH_BYTES * 2);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_uniqueness() {
        assert_ne!(generate_hash(), generate_hash());
    }

    #[test]
    fn test_template_parses_back() {
        let hash = generate_hash();
        let template = record_template(&hash).unwrap();
        let record: UserRecord = serde_json::from_str(&template).unwrap();
        assert_eq!(record.hash, hash);
        assert_eq!(record.valid_urls(), vec!["https://example.com"]);
    }
}
