//! Header grants computed from a selection.
//!
//! These are the values the Response Composer writes. They are plain data:
//! turning them into HTTP headers is the middleware's job.

use crate::selector::Selection;

/// What a preflight response grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightGrant {
    /// `Access-Control-Allow-Origin`.
    pub allow_origin: String,
    /// `Access-Control-Allow-Methods`.
    pub allow_methods: Option<String>,
    /// `Access-Control-Allow-Headers`.
    pub allow_headers: Option<String>,
    /// Emit `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
    /// `Access-Control-Max-Age`.
    pub max_age: Option<u64>,
}

impl PreflightGrant {
    /// Computes the preflight grant, or `None` for a denied or unmatched
    /// selection.
    ///
    /// `Allow-Origin` is always the selector's resolved origin, even for a
    /// credentialed wildcard policy.
    ///
    /// ```
    /// use corsair_core::{PolicySet, PreflightGrant};
    ///
    /// let set = PolicySet::direct([("origin", "*"), ("methods", "*"), ("headers", "*")]);
    /// let selection = set.select("https://a.example", Some("PATCH"));
    /// let grant = PreflightGrant::compute(&selection, Some("PATCH"), Some("x-token")).unwrap();
    /// assert_eq!(grant.allow_origin, "*");
    /// assert_eq!(grant.allow_methods.as_deref(), Some("PATCH"));
    /// assert_eq!(grant.allow_headers.as_deref(), Some("x-token"));
    /// ```
    #[must_use]
    pub fn compute(
        selection: &Selection,
        requested_method: Option<&str>,
        requested_headers: Option<&str>,
    ) -> Option<Self> {
        let Selection::Granted { policy, origin } = selection else {
            return None;
        };
        Some(Self {
            allow_origin: origin.clone(),
            allow_methods: policy.methods().allow_value(requested_method),
            allow_headers: policy.headers().allow_value(requested_headers),
            allow_credentials: policy.credentials(),
            max_age: policy.max_age(),
        })
    }
}

/// What an actual (non-preflight) response grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualGrant {
    /// `Access-Control-Allow-Origin`.
    pub allow_origin: String,
    /// Emit `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
    /// `Access-Control-Expose-Headers`.
    pub expose_headers: Option<String>,
    /// Append `Vary: Origin`.
    pub vary_origin: bool,
}

impl ActualGrant {
    /// Computes the grant for an actual request carrying `request_origin`.
    ///
    /// A credentialed policy with the `*` origin rule echoes the request
    /// origin instead of `*`. `Vary: Origin` is requested whenever the
    /// rule is not `*`.
    ///
    /// ```
    /// use corsair_core::{ActualGrant, PolicySet};
    ///
    /// let set = PolicySet::direct([("origin", "*"), ("credentials", "true")]);
    /// let selection = set.select("https://a.example", Some("GET"));
    /// let grant = ActualGrant::compute(&selection, "https://a.example").unwrap();
    /// assert_eq!(grant.allow_origin, "https://a.example");
    /// assert!(grant.allow_credentials);
    /// assert!(!grant.vary_origin);
    /// ```
    #[must_use]
    pub fn compute(selection: &Selection, request_origin: &str) -> Option<Self> {
        let Selection::Granted { policy, origin } = selection else {
            return None;
        };
        let wildcard = policy.origin().is_any();
        let allow_origin = if policy.credentials() && wildcard {
            request_origin
        } else {
            origin.as_str()
        };
        if allow_origin.is_empty() {
            return None;
        }
        Some(Self {
            allow_origin: allow_origin.to_string(),
            allow_credentials: policy.credentials(),
            expose_headers: policy.expose_headers().map(str::to_string),
            vary_origin: !wildcard,
        })
    }
}
