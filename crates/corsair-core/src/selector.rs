//! Policy selection.
//!
//! [`PolicySelector`] pairs an immutable [`PolicySet`] with an injected
//! [`SelectionCache`]. Given the request origin (and the method, under
//! `verbmatch`) it returns a [`Selection`]: which policy won and which origin
//! value to echo back.

use std::sync::Arc;

use crate::cache::{BoundedCache, CacheStats, NoCache, SelectionCache, SelectionKey};
use crate::policy::{Policy, DENY_POLICY};
use crate::policy_set::{MatchStrategy, PolicySet};

/// Outcome of selecting a policy for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The `deny` policy was reached. No CORS headers are emitted.
    Denied,
    /// A policy resolved an origin.
    Granted {
        /// The winning policy.
        policy: Arc<Policy>,
        /// The origin value to echo in `Access-Control-Allow-Origin`.
        origin: String,
    },
    /// No active policy resolved an origin.
    Unmatched,
}

impl Selection {
    /// Name of the winning policy. `deny` for [`Selection::Denied`].
    #[must_use]
    pub fn policy_name(&self) -> Option<&str> {
        match self {
            Self::Denied => Some(DENY_POLICY),
            Self::Granted { policy, .. } => Some(policy.name()),
            Self::Unmatched => None,
        }
    }

    /// The resolved origin, if a policy granted one.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Granted { origin, .. } => Some(origin),
            _ => None,
        }
    }

    /// The winning policy, if any.
    #[must_use]
    pub fn policy(&self) -> Option<&Arc<Policy>> {
        match self {
            Self::Granted { policy, .. } => Some(policy),
            _ => None,
        }
    }

    /// Short label for logs and metrics: `granted`, `denied` or `unmatched`.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Denied => "denied",
            Self::Granted { .. } => "granted",
            Self::Unmatched => "unmatched",
        }
    }
}

/// Selects policies for requests, memoizing results.
///
/// Cloning is cheap; clones share the policy set and the cache.
///
/// # Example
///
/// ```
/// use corsair_core::{FlatConfig, PolicySelector, PolicySet};
///
/// let set = PolicySet::from_config(
///     &FlatConfig::new().with("policy", "pol").with("pol_origin", "copy"),
/// );
/// let selector = PolicySelector::new(set);
///
/// let first = selector.select("https://a.example", Some("GET"));
/// let second = selector.select("https://a.example", Some("GET"));
/// assert_eq!(first, second);
/// assert_eq!(selector.cache_stats().hits, 1);
/// ```
#[derive(Debug, Clone)]
pub struct PolicySelector {
    policies: Arc<PolicySet>,
    cache: Arc<dyn SelectionCache>,
}

impl PolicySelector {
    /// Creates a selector with a [`BoundedCache`] of default capacity.
    pub fn new(policies: impl Into<Arc<PolicySet>>) -> Self {
        Self::with_cache(policies, Arc::new(BoundedCache::default()))
    }

    /// Creates a selector that never caches.
    pub fn uncached(policies: impl Into<Arc<PolicySet>>) -> Self {
        Self::with_cache(policies, Arc::new(NoCache::default()))
    }

    /// Creates a selector with an explicit cache.
    pub fn with_cache(
        policies: impl Into<Arc<PolicySet>>,
        cache: Arc<dyn SelectionCache>,
    ) -> Self {
        Self {
            policies: policies.into(),
            cache,
        }
    }

    /// The policy set being evaluated.
    #[must_use]
    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Selects the policy for `origin` and `method`.
    ///
    /// Returns exactly what [`PolicySet::select`] returns; the cache only
    /// avoids recomputation.
    #[must_use]
    pub fn select(&self, origin: &str, method: Option<&str>) -> Selection {
        let method = match self.policies.strategy() {
            MatchStrategy::FirstMatch => None,
            MatchStrategy::VerbMatch => method,
        };
        let key = SelectionKey::new(origin, method);

        if let Some(selection) = self.cache.get(&key) {
            tracing::trace!(
                origin,
                ?method,
                outcome = selection.outcome(),
                "CORS selection cache hit"
            );
            return selection;
        }

        let selection = self.policies.select(origin, method);
        tracing::trace!(
            origin,
            ?method,
            policy = ?selection.policy_name(),
            outcome = selection.outcome(),
            "CORS policy selected"
        );
        self.cache.insert(key, selection.clone());
        selection
    }

    /// Statistics of the underlying cache.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
