//! The CORS policy value object.
//!
//! A [`Policy`] is one named ruleset: which origins are granted, which
//! methods and headers a preflight may announce, what is exposed to scripts
//! and whether credentialed access is allowed. Policies are immutable once
//! built and are shared behind `Arc` by the [`PolicySet`](crate::PolicySet).

use crate::pattern::{CaseSensitivity, GlobPattern};

/// Name of the policy that never grants anything.
pub const DENY_POLICY: &str = "deny";

/// Name of the single policy built by [`PolicySet::direct`](crate::PolicySet::direct).
pub const DIRECT_POLICY: &str = "direct";

/// Which origins a policy grants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OriginRule {
    /// No origin configured. The policy never resolves an origin.
    #[default]
    Unset,
    /// `*`: any origin. The literal `*` is echoed back.
    Any,
    /// `copy`: whatever origin the request sent is echoed back.
    Copy,
    /// A space-separated list of glob patterns.
    Patterns {
        /// The rule text as configured.
        raw: String,
        /// Compiled patterns with bare `*` entries removed.
        patterns: Vec<GlobPattern>,
    },
}

impl OriginRule {
    /// Parses the `origin` field.
    ///
    /// ```
    /// use corsair_core::OriginRule;
    ///
    /// assert_eq!(OriginRule::parse("*"), OriginRule::Any);
    /// assert_eq!(OriginRule::parse("copy"), OriginRule::Copy);
    /// assert_eq!(OriginRule::parse(""), OriginRule::Unset);
    /// assert_eq!(OriginRule::parse("a.com *.b.com").patterns().len(), 2);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "" => Self::Unset,
            "*" => Self::Any,
            "copy" => Self::Copy,
            _ => {
                let patterns: Vec<GlobPattern> = trimmed
                    .split_whitespace()
                    .filter(|p| *p != "*")
                    .map(GlobPattern::new)
                    .collect();
                if patterns.is_empty() {
                    // only bare stars, e.g. "* *"
                    Self::Any
                } else {
                    Self::Patterns {
                        raw: trimmed.to_string(),
                        patterns,
                    }
                }
            }
        }
    }

    /// Returns `true` for the `*` rule.
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// The compiled pattern list. Empty unless this is a pattern rule.
    #[must_use]
    pub fn patterns(&self) -> &[GlobPattern] {
        match self {
            Self::Patterns { patterns, .. } => patterns,
            _ => &[],
        }
    }

    /// The configured rule text, or `None` when unset.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Any => Some("*"),
            Self::Copy => Some("copy"),
            Self::Patterns { raw, .. } => Some(raw),
        }
    }
}

/// Which methods a preflight may be granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodRule {
    /// `*`: echo the requested method.
    Any,
    /// Explicit method tokens in configured order.
    List(Vec<GlobPattern>),
}

impl Default for MethodRule {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl MethodRule {
    /// Parses a comma-separated method list, or `*`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "*" {
            return Self::Any;
        }
        Self::List(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(GlobPattern::new)
                .collect(),
        )
    }

    /// Returns `true` if `method` is permitted. Tokens compare case-sensitively.
    #[must_use]
    pub fn allows(&self, method: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::List(tokens) => method.is_some_and(|m| {
                tokens
                    .iter()
                    .any(|t| t.matches_with(m, CaseSensitivity::Sensitive))
            }),
        }
    }

    /// Value for `Access-Control-Allow-Methods`, or `None` when nothing is granted.
    #[must_use]
    pub fn allow_value(&self, requested: Option<&str>) -> Option<String> {
        let value = match self {
            Self::Any => requested.unwrap_or_default().to_string(),
            Self::List(tokens) => tokens
                .iter()
                .map(GlobPattern::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        };
        non_empty(value)
    }
}

/// Which request headers a preflight may be granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderRule {
    /// `*`: echo `Access-Control-Request-Headers`.
    Any,
    /// A literal header list, emitted as configured.
    List(String),
}

impl Default for HeaderRule {
    fn default() -> Self {
        Self::List(String::new())
    }
}

impl HeaderRule {
    /// Parses the `headers` field.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "*" => Self::Any,
            other => Self::List(other.to_string()),
        }
    }

    /// Value for `Access-Control-Allow-Headers`, or `None` when nothing is granted.
    #[must_use]
    pub fn allow_value(&self, requested: Option<&str>) -> Option<String> {
        match self {
            Self::Any => requested.map(str::to_string).and_then(non_empty),
            Self::List(headers) => non_empty(headers.clone()),
        }
    }
}

/// One named CORS ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    name: String,
    origin: OriginRule,
    methods: MethodRule,
    headers: HeaderRule,
    expose_headers: Option<String>,
    credentials: bool,
    max_age: Option<u64>,
}

impl Policy {
    /// Starts building a policy with every field at its default.
    pub fn builder(name: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder::new(name)
    }

    /// The deny policy.
    #[must_use]
    pub fn deny() -> Self {
        Self::builder(DENY_POLICY).build()
    }

    /// Policy name, unique within its set.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for the policy that never grants anything.
    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.name == DENY_POLICY
    }

    /// Origin rule.
    #[must_use]
    pub fn origin(&self) -> &OriginRule {
        &self.origin
    }

    /// Method rule.
    #[must_use]
    pub fn methods(&self) -> &MethodRule {
        &self.methods
    }

    /// Header rule.
    #[must_use]
    pub fn headers(&self) -> &HeaderRule {
        &self.headers
    }

    /// Headers exposed on actual responses.
    #[must_use]
    pub fn expose_headers(&self) -> Option<&str> {
        self.expose_headers.as_deref()
    }

    /// Whether credentialed access is granted.
    #[must_use]
    pub fn credentials(&self) -> bool {
        self.credentials
    }

    /// Preflight cache lifetime in seconds.
    #[must_use]
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }
}

/// Builder for [`Policy`].
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    /// Creates a builder for a policy called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            policy: Policy {
                name: name.into(),
                origin: OriginRule::Unset,
                methods: MethodRule::default(),
                headers: HeaderRule::default(),
                expose_headers: None,
                credentials: false,
                max_age: None,
            },
        }
    }

    /// Sets the origin rule from its textual form (`*`, `copy` or patterns).
    #[must_use]
    pub fn origin(mut self, origin: &str) -> Self {
        self.policy.origin = OriginRule::parse(origin);
        self
    }

    /// Sets the method rule from its textual form (`*` or a comma list).
    #[must_use]
    pub fn methods(mut self, methods: &str) -> Self {
        self.policy.methods = MethodRule::parse(methods);
        self
    }

    /// Sets the header rule from its textual form (`*` or a literal list).
    #[must_use]
    pub fn headers(mut self, headers: &str) -> Self {
        self.policy.headers = HeaderRule::parse(headers);
        self
    }

    /// Sets the exposed headers. Blank values clear the field.
    #[must_use]
    pub fn expose_headers(mut self, headers: &str) -> Self {
        self.policy.expose_headers = non_empty(headers.trim().to_string());
        self
    }

    /// Grants or withholds credentialed access.
    #[must_use]
    pub fn credentials(mut self, allow: bool) -> Self {
        self.policy.credentials = allow;
        self
    }

    /// Sets the preflight max-age in seconds.
    #[must_use]
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.policy.max_age = Some(seconds);
        self
    }

    /// Finishes the policy.
    #[must_use]
    pub fn build(self) -> Policy {
        self.policy
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
