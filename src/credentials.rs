//! Ordered credential pool for a single provider.
//!
//! Keys are loaded once per invocation, read-only afterwards. Position in
//! the list is priority: the orchestrator always tries index 0 first.

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct CredentialPool {
    provider: String,
    keys: Vec<String>,
}

impl CredentialPool {
    /// Build a pool from configured keys, skipping blank entries.
    ///
    /// Fails with [`Error::NoCredentialsConfigured`] when nothing usable
    /// remains; this aborts the pipeline before any network call.
    pub fn new(provider: impl Into<String>, keys: impl IntoIterator<Item = String>) -> Result<Self> {
        let provider = provider.into();
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(Error::NoCredentialsConfigured(provider));
        }

        Ok(Self { provider, keys })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Credentials in priority order. Never yields an empty string.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_preserves_order() {
        let pool = CredentialPool::new(
            "gemini",
            vec!["key-a".to_string(), "key-b".to_string(), "key-c".to_string()],
        )
        .unwrap();

        let keys: Vec<&str> = pool.iter().collect();
        assert_eq!(keys, vec!["key-a", "key-b", "key-c"]);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_pool_skips_blank_entries() {
        let pool = CredentialPool::new(
            "gemini",
            vec!["  ".to_string(), "key-b".to_string(), "".to_string()],
        )
        .unwrap();

        let keys: Vec<&str> = pool.iter().collect();
        assert_eq!(keys, vec!["key-b"]);
    }

    #[test]
    fn test_empty_pool_is_a_configuration_error() {
        let err = CredentialPool::new("gemini", vec!["".to_string()]).unwrap_err();
        assert!(matches!(err, Error::NoCredentialsConfigured(ref p) if p == "gemini"));
    }
}
