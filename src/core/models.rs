use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{QrRedirectError, Result};
use crate::storage::format::DEFAULT_ITERATIONS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KdfParams {
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Fast parameters for testing only.
    #[cfg(test)]
    pub fn test_params() -> Self {
        Self { iterations: 1_000 }
    }
}

/// One user's entry in the table.
///
/// Field order is the canonical serialized order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub hash: String,
    #[serde(default)]
    pub name: String,
    pub urls: Vec<String>,
}

impl UserRecord {
    pub fn new(hash: impl Into<String>, name: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            urls,
        }
    }

    /// Trimmed, non-blank URLs in their original order.
    pub fn valid_urls(&self) -> Vec<&str> {
        self.urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct UserTable {
    pub records: Vec<UserRecord>,
}

impl UserTable {
    pub fn new(records: Vec<UserRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact, case-sensitive lookup.
    pub fn find(&self, hash: &str) -> Option<&UserRecord> {
        self.records.iter().find(|r| r.hash == hash)
    }

    pub fn hashes(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.hash.as_str()).collect()
    }

    /// Every record needs a hash, at least one usable URL, and a hash no
    /// other record uses.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, record) in self.records.iter().enumerate() {
            if record.hash.trim().is_empty() {
                return Err(QrRedirectError::InvalidRecord {
                    record: format!("#{index}"),
                    reason: "hash is empty".to_string(),
                });
            }
            if record.valid_urls().is_empty() {
                return Err(QrRedirectError::InvalidRecord {
                    record: record.hash.clone(),
                    reason: "no non-blank URLs".to_string(),
                });
            }
            if !seen.insert(record.hash.as_str()) {
                return Err(QrRedirectError::InvalidRecord {
                    record: record.hash.clone(),
                    reason: "duplicate hash".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Compact JSON with stable field order.
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| QrRedirectError::CorruptTable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_canonical_json_shape() {
        let table = UserTable::new(vec![UserRecord::new("a1", "Alice", urls(&["u1"]))]);
        assert_eq!(
            table.to_canonical_json().unwrap(),
            r#"[{"hash":"a1","name":"Alice","urls":["u1"]}]"#
        );
    }

    #[test]
    fn test_canonical_json_is_stable() {
        let table = UserTable::new(vec![
            UserRecord::new("b2", "Bob", urls(&["u2", "u3"])),
            UserRecord::new("a1", "Alice", urls(&["u1"])),
        ]);
        let first = table.to_canonical_json().unwrap();
        let reparsed = UserTable::from_json(&first).unwrap();
        assert_eq!(reparsed.to_canonical_json().unwrap(), first);
        assert_eq!(reparsed.hashes(), vec!["b2", "a1"]);
    }

    #[test]
    fn test_missing_name_defaults() {
        let table = UserTable::from_json(r#"[{"hash":"a1","urls":["u1"]}]"#).unwrap();
        assert_eq!(table.records[0].name, "");
    }

    #[test]
    fn test_structural_mismatch_is_corrupt() {
        let result = UserTable::from_json(r#"{"hash":"a1"}"#);
        assert!(matches!(result, Err(QrRedirectError::CorruptTable(_))));
        let result = UserTable::from_json(r#"[{"hash":"a1","urls":"u1"}]"#);
        assert!(matches!(result, Err(QrRedirectError::CorruptTable(_))));
    }

    #[test]
    fn test_valid_urls_filters_blanks() {
        let record = UserRecord::new("h", "", urls(&["", "  ", " https://x.test "]));
        assert_eq!(record.valid_urls(), vec!["https://x.test"]);
    }

    #[test]
    fn test_find_is_case_sensitive() {
        let table = UserTable::new(vec![UserRecord::new("Ab", "", urls(&["u"]))]);
        assert!(table.find("Ab").is_some());
        assert!(table.find("ab").is_none());
    }

    #[test]
    fn test_validate_accepts_good_table() {
        let table = UserTable::new(vec![
            UserRecord::new("a1", "A", urls(&["u1"])),
            UserRecord::new("b2", "B", urls(&["", "u2"])),
        ]);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_hash() {
        let table = UserTable::new(vec![
            UserRecord::new("a1", "A", urls(&["u1"])),
            UserRecord::new(" ", "B", urls(&["u2"])),
        ]);
        match table.validate() {
            Err(QrRedirectError::InvalidRecord { record, .. }) => assert_eq!(record, "#1"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_empty_urls() {
        let table = UserTable::new(vec![UserRecord::new("a1", "A", vec![])]);
        match table.validate() {
            Err(QrRedirectError::InvalidRecord { record, .. }) => assert_eq!(record, "a1"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_blank_urls_only() {
        let table = UserTable::new(vec![UserRecord::new("a1", "A", urls(&["", "  "]))]);
        assert!(matches!(
            table.validate(),
            Err(QrRedirectError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_hash() {
        let table = UserTable::new(vec![
            UserRecord::new("a1", "A", urls(&["u1"])),
            UserRecord::new("a1", "B", urls(&["u2"])),
        ]);
        match table.validate() {
            Err(QrRedirectError::InvalidRecord { record, reason }) => {
                assert_eq!(record, "a1");
                assert_eq!(reason, "duplicate hash");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
