//! Credential pool parsing and selection
//!
//! A [`CredentialPool`] is an ordered, non-empty set of API keys parsed once
//! from a configuration string (comma-separated, whitespace-trimmed). The
//! failover loop walks the pool in order and never mutates it; there is no
//! cross-call memory of which credentials failed, so every call gets a full
//! pass over the pool.

use std::fmt;

use rand::Rng;

use crate::error::{FailoverError, Result};

/// An opaque API credential.
///
/// The inner string is never printed in full; `Debug` shows only a short
/// prefix fingerprint so keys do not leak into logs or panic messages.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw credential value, for handing to an upstream client.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short, log-safe identifier for this credential.
    pub fn fingerprint(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}***")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.fingerprint())
    }
}

/// An ordered, non-empty sequence of credentials.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    /// Parse a comma-separated credential list.
    ///
    /// Whitespace around each entry is trimmed and empty entries are
    /// discarded. Input order is preserved and entries are not deduplicated.
    /// Fails with [`FailoverError::EmptyCredentialPool`] if nothing usable
    /// remains, so a constructed pool is never empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let credentials: Vec<Credential> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Credential::new)
            .collect();

        if credentials.is_empty() {
            return Err(FailoverError::EmptyCredentialPool);
        }
        Ok(Self { credentials })
    }

    /// Read the named environment variable and parse it as a pool.
    ///
    /// A missing variable is reported as [`FailoverError::MissingConfiguration`];
    /// a present-but-blank value falls through to the empty-pool error.
    pub fn from_env(var: &str) -> Result<Self> {
        let raw = std::env::var(var).map_err(|_| FailoverError::MissingConfiguration {
            var: var.to_string(),
        })?;
        Self::parse(&raw)
    }

    /// Number of credentials in the pool. Always at least 1.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Always false: construction fails instead of producing an empty pool.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate credentials in failover order.
    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }

    /// Get a credential by position.
    pub fn get(&self, index: usize) -> Option<&Credential> {
        self.credentials.get(index)
    }

    /// Pick one credential uniformly at random.
    ///
    /// This is for callers that want a single default key for a
    /// non-failover client; the failover loop itself always walks the pool
    /// in order and never calls this.
    pub fn choose_random(&self) -> &Credential {
        let index = rand::thread_rng().gen_range(0..self.credentials.len());
        &self.credentials[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_credential() {
        let pool = CredentialPool::parse("sk-abc123").unwrap();
        assert_eq!(pool.len(), 1);
        assert!(!pool.is_empty());
        assert_eq!(pool.get(0).unwrap().as_str(), "sk-abc123");
    }

    #[test]
    fn test_parse_preserves_order_and_trims() {
        let pool = CredentialPool::parse(" k1 , k2,  k3  ").unwrap();
        let keys: Vec<&str> = pool.iter().map(Credential::as_str).collect();
        assert_eq!(keys, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn test_parse_discards_empty_entries() {
        let pool = CredentialPool::parse("k1,, ,k2,").unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_parse_empty_input_fails() {
        assert!(matches!(
            CredentialPool::parse(""),
            Err(FailoverError::EmptyCredentialPool)
        ));
        assert!(matches!(
            CredentialPool::parse("  , ,  "),
            Err(FailoverError::EmptyCredentialPool)
        ));
    }

    #[test]
    fn test_from_env_missing_variable() {
        let err = CredentialPool::from_env("TOWER_FAILOVER_TEST_UNSET_VAR").unwrap_err();
        assert!(matches!(
            err,
            FailoverError::MissingConfiguration { ref var } if var == "TOWER_FAILOVER_TEST_UNSET_VAR"
        ));
    }

    #[test]
    fn test_from_env_reads_and_parses() {
        std::env::set_var("TOWER_FAILOVER_TEST_POOL_VAR", "a,b");
        let pool = CredentialPool::from_env("TOWER_FAILOVER_TEST_POOL_VAR").unwrap();
        assert_eq!(pool.len(), 2);
        std::env::remove_var("TOWER_FAILOVER_TEST_POOL_VAR");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credential = Credential::new("sk-supersecretvalue");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("sk-s***"));
        assert!(!rendered.contains("supersecret"));
    }

    #[test]
    fn test_choose_random_stays_in_pool() {
        let pool = CredentialPool::parse("k1,k2,k3").unwrap();
        for _ in 0..50 {
            let picked = pool.choose_random();
            assert!(pool.iter().any(|c| c == picked));
        }
    }

    #[test]
    fn test_choose_random_single_credential() {
        let pool = CredentialPool::parse("only").unwrap();
        assert_eq!(pool.choose_random().as_str(), "only");
    }
}
