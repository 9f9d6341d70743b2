//! Flat string-keyed configuration.
//!
//! The policy engine consumes configuration as a flat mapping of keys to
//! string values, for example:
//!
//! ```text
//! policy        = pol2,pol1
//! matchstrategy = firstmatch
//! pol1_origin   = *
//! pol2_origin   = *.woopy.com
//! ```
//!
//! Where the mapping comes from (a file, the environment, an embedded map)
//! is up to the caller; see the `corsair-config` crate.

use indexmap::IndexMap;

/// Key naming the comma-separated list of active policies.
pub const POLICY_KEY: &str = "policy";

/// Key naming the match strategy.
pub const MATCH_STRATEGY_KEY: &str = "matchstrategy";

/// An insertion-ordered string-to-string configuration map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatConfig {
    entries: IndexMap<String, String>,
}

impl FlatConfig {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over the keys starting with `prefix`, yielding the remainder
    /// of each key alongside its value.
    ///
    /// ```
    /// use corsair_core::FlatConfig;
    ///
    /// let cfg = FlatConfig::new()
    ///     .with("pol_origin", "*")
    ///     .with("other_origin", "copy");
    /// let fields: Vec<_> = cfg.strip_prefix("pol_").collect();
    /// assert_eq!(fields, vec![("origin", "*")]);
    /// ```
    pub fn strip_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|field| (field, v)))
    }
}

impl<K, V> FromIterator<(K, V)> for FlatConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Self::new();
        config.extend(iter);
        config
    }
}

impl<K, V> Extend<(K, V)> for FlatConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
