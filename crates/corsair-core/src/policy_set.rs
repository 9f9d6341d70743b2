//! The ordered, immutable set of active policies.
//!
//! A [`PolicySet`] is built once from a [`FlatConfig`] and never changes
//! afterwards. The order of `policy` entries is significant: policies are
//! evaluated front to back and the first one that resolves an origin wins.
//!
//! # Example
//!
//! ```
//! use corsair_core::{FlatConfig, PolicySet};
//!
//! let cfg = FlatConfig::new()
//!     .with("policy", "pol2,pol1")
//!     .with("pol1_origin", "*")
//!     .with("pol2_origin", "*.woopy.com");
//!
//! let set = PolicySet::from_config(&cfg);
//! let selection = set.select("palim.woopy.com", None);
//! assert_eq!(selection.policy_name(), Some("pol2"));
//! assert_eq!(selection.origin(), Some("palim.woopy.com"));
//!
//! let selection = set.select("palim.com", None);
//! assert_eq!(selection.policy_name(), Some("pol1"));
//! assert_eq!(selection.origin(), Some("*"));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::diagnostic::PolicyDiagnostic;
use crate::flat::{FlatConfig, MATCH_STRATEGY_KEY, POLICY_KEY};
use crate::pattern::matches_any;
use crate::policy::{OriginRule, Policy, DENY_POLICY, DIRECT_POLICY};
use crate::selector::Selection;

/// How the selector chooses among active policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchStrategy {
    /// Only the origin decides.
    #[default]
    FirstMatch,
    /// The requested method must also be allowed by the policy.
    VerbMatch,
}

impl MatchStrategy {
    /// Parses `firstmatch` or `verbmatch`, ignoring case and surrounding space.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "firstmatch" => Some(Self::FirstMatch),
            "verbmatch" => Some(Self::VerbMatch),
            _ => None,
        }
    }

    /// The configuration spelling of this strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstMatch => "firstmatch",
            Self::VerbMatch => "verbmatch",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered collection of named policies plus a match strategy.
#[derive(Debug, Clone)]
pub struct PolicySet {
    active: Vec<String>,
    strategy: MatchStrategy,
    policies: IndexMap<String, Arc<Policy>>,
    diagnostics: Vec<PolicyDiagnostic>,
}

impl PolicySet {
    /// Builds a policy set from flat configuration.
    ///
    /// `policy` lists the active policy names (default `deny`) and
    /// `matchstrategy` picks the strategy (default `firstmatch`). Each
    /// active policy `P` reads its fields from the keys prefixed `P_`.
    /// Problems are reported through [`diagnostics`](Self::diagnostics) and
    /// logged; construction itself never fails.
    pub fn from_config(config: &FlatConfig) -> Self {
        let mut diagnostics = Vec::new();

        let mut active: Vec<String> = config
            .get(POLICY_KEY)
            .unwrap_or(DENY_POLICY)
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if active.is_empty() {
            active.push(DENY_POLICY.to_string());
        }

        let strategy = match config.get(MATCH_STRATEGY_KEY) {
            None => MatchStrategy::default(),
            Some(value) => MatchStrategy::parse(value).unwrap_or_else(|| {
                diagnostics.push(PolicyDiagnostic::UnknownMatchStrategy {
                    value: value.to_string(),
                });
                MatchStrategy::default()
            }),
        };

        let mut policies = IndexMap::new();
        for name in &active {
            if policies.contains_key(name) {
                continue;
            }
            let policy = if name == DENY_POLICY {
                Policy::deny()
            } else {
                let prefix = format!("{name}_");
                parse_policy(name, config.strip_prefix(&prefix), &mut diagnostics)
            };
            policies.insert(name.clone(), Arc::new(policy));
        }

        Self::finish(active, strategy, policies, diagnostics)
    }

    /// Builds the single anonymous policy `direct` from unprefixed fields
    /// (`origin`, `methods`, ...), evaluated with `firstmatch`.
    ///
    /// ```
    /// use corsair_core::PolicySet;
    ///
    /// let set = PolicySet::direct([("origin", "copy"), ("methods", "GET")]);
    /// assert_eq!(set.active_policies(), ["direct"]);
    /// assert_eq!(set.select("https://a.example", None).origin(), Some("https://a.example"));
    /// ```
    pub fn direct<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut diagnostics = Vec::new();
        let fields: Vec<(K, V)> = fields.into_iter().collect();
        let policy = parse_policy(
            DIRECT_POLICY,
            fields.iter().map(|(k, v)| (k.as_ref(), v.as_ref())),
            &mut diagnostics,
        );

        let mut policies = IndexMap::new();
        policies.insert(DIRECT_POLICY.to_string(), Arc::new(policy));
        Self::finish(
            vec![DIRECT_POLICY.to_string()],
            MatchStrategy::FirstMatch,
            policies,
            diagnostics,
        )
    }

    /// Builds a set from already constructed policies, active in the given order.
    pub fn from_policies<I>(strategy: MatchStrategy, policies: I) -> Self
    where
        I: IntoIterator<Item = Policy>,
    {
        let mut active = Vec::new();
        let mut map = IndexMap::new();
        for policy in policies {
            active.push(policy.name().to_string());
            map.insert(policy.name().to_string(), Arc::new(policy));
        }
        Self::finish(active, strategy, map, Vec::new())
    }

    fn finish(
        active: Vec<String>,
        strategy: MatchStrategy,
        policies: IndexMap<String, Arc<Policy>>,
        diagnostics: Vec<PolicyDiagnostic>,
    ) -> Self {
        for diagnostic in &diagnostics {
            tracing::warn!(policy = ?diagnostic.policy(), "{diagnostic}");
        }
        tracing::info!(
            policies = ?active,
            strategy = %strategy,
            diagnostics = diagnostics.len(),
            "CORS policy set built"
        );

        Self {
            active,
            strategy,
            policies,
            diagnostics,
        }
    }

    /// Active policy names in evaluation order.
    #[must_use]
    pub fn active_policies(&self) -> &[String] {
        &self.active
    }

    /// The match strategy.
    #[must_use]
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Looks up a policy by name.
    #[must_use]
    pub fn policy(&self, name: &str) -> Option<&Arc<Policy>> {
        self.policies.get(name)
    }

    /// Diagnostics collected during construction.
    #[must_use]
    pub fn diagnostics(&self) -> &[PolicyDiagnostic] {
        &self.diagnostics
    }

    /// Selects the policy for a request.
    ///
    /// `origin` is the request's `Origin` header (empty when absent).
    /// `method` is consulted only under [`MatchStrategy::VerbMatch`]. The
    /// result depends on nothing but the arguments and this immutable set,
    /// so it can be memoized freely.
    #[must_use]
    pub fn select(&self, origin: &str, method: Option<&str>) -> Selection {
        for name in &self.active {
            if name == DENY_POLICY {
                return Selection::Denied;
            }
            let Some(policy) = self.policies.get(name) else {
                continue;
            };
            if self.strategy == MatchStrategy::VerbMatch && !policy.methods().allows(method) {
                continue;
            }
            if let Some(resolved) = resolve_origin(policy.origin(), origin) {
                return Selection::Granted {
                    policy: Arc::clone(policy),
                    origin: resolved,
                };
            }
        }
        Selection::Unmatched
    }
}

/// Resolves the origin value a policy would echo for `origin`.
fn resolve_origin(rule: &OriginRule, origin: &str) -> Option<String> {
    let resolved = match rule {
        OriginRule::Patterns { patterns, .. } if !origin.is_empty() => {
            return matches_any(origin, patterns).then(|| origin.to_string());
        }
        OriginRule::Copy => origin.to_string(),
        OriginRule::Any => "*".to_string(),
        OriginRule::Patterns { raw, .. } => raw.clone(),
        OriginRule::Unset => return None,
    };
    (!resolved.is_empty()).then_some(resolved)
}

fn parse_policy<'a, I>(name: &str, fields: I, diagnostics: &mut Vec<PolicyDiagnostic>) -> Policy
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut builder = Policy::builder(name);
    let mut seen_any = false;
    let mut seen_origin = false;

    for (field, value) in fields {
        seen_any = true;
        builder = match field {
            "origin" => {
                seen_origin = true;
                builder.origin(value)
            }
            "methods" => builder.methods(value),
            "headers" => builder.headers(value),
            "expose_headers" => builder.expose_headers(value),
            "credentials" => match parse_bool(value) {
                Some(allow) => builder.credentials(allow),
                None => {
                    diagnostics.push(invalid(name, field, value));
                    builder.credentials(false)
                }
            },
            "maxage" => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    builder
                } else if let Ok(seconds) = trimmed.parse::<u64>() {
                    builder.max_age(seconds)
                } else {
                    diagnostics.push(invalid(name, field, value));
                    builder
                }
            }
            other => {
                diagnostics.push(PolicyDiagnostic::UnknownField {
                    policy: name.to_string(),
                    field: other.to_string(),
                });
                builder
            }
        };
    }

    if !seen_any {
        diagnostics.push(PolicyDiagnostic::NoFields {
            policy: name.to_string(),
        });
    } else if !seen_origin {
        diagnostics.push(PolicyDiagnostic::MissingOrigin {
            policy: name.to_string(),
        });
    }

    builder.build()
}

fn invalid(policy: &str, field: &str, value: &str) -> PolicyDiagnostic {
    PolicyDiagnostic::InvalidValue {
        policy: policy.to_string(),
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Parse a boolean from a string. Blank means `false`.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MethodRule;

    fn woopy() -> FlatConfig {
        FlatConfig::new()
            .with("policy", "pol2,pol1")
            .with("pol1_origin", "*")
            .with("pol2_origin", "*.woopy.com")
    }

    #[test]
    fn test_default_is_deny() {
        let set = PolicySet::from_config(&FlatConfig::new());
        assert_eq!(set.active_policies(), ["deny"]);
        assert_eq!(set.strategy(), MatchStrategy::FirstMatch);
        assert_eq!(set.select("https://a.com", None), Selection::Denied);
        assert!(set.diagnostics().is_empty());
    }

    #[test]
    fn test_blank_policy_list_falls_back_to_deny() {
        let set = PolicySet::from_config(&FlatConfig::new().with("policy", " , "));
        assert_eq!(set.active_policies(), ["deny"]);
    }

    #[test]
    fn test_precedence_follows_policy_order() {
        let set = PolicySet::from_config(&woopy());

        let selection = set.select("palim.woopy.com", None);
        assert_eq!(selection.policy_name(), Some("pol2"));
        assert_eq!(selection.origin(), Some("palim.woopy.com"));

        let selection = set.select("palim.com", None);
        assert_eq!(selection.policy_name(), Some("pol1"));
        assert_eq!(selection.origin(), Some("*"));
    }

    #[test]
    fn test_deny_reached_as_fallback() {
        let cfg = FlatConfig::new()
            .with("policy", "pol,deny")
            .with("pol_origin", "*.example.com");
        let set = PolicySet::from_config(&cfg);

        assert_eq!(set.select("a.example.com", None).policy_name(), Some("pol"));
        assert_eq!(set.select("evil.com", None), Selection::Denied);
    }

    #[test]
    fn test_deny_first_wins_over_everything() {
        let cfg = FlatConfig::new()
            .with("policy", "deny,pol")
            .with("pol_origin", "*");
        let set = PolicySet::from_config(&cfg);
        assert_eq!(set.select("a.com", Some("GET")), Selection::Denied);
    }

    #[test]
    fn test_copy_echoes_origin() {
        let cfg = FlatConfig::new()
            .with("policy", "pol")
            .with("pol_origin", "copy");
        let set = PolicySet::from_config(&cfg);
        assert_eq!(
            set.select("https://Mixed.Case:8443", None).origin(),
            Some("https://Mixed.Case:8443")
        );
        assert_eq!(set.select("", None), Selection::Unmatched);
    }

    #[test]
    fn test_pattern_rule_without_origin_resolves_to_rule_text() {
        let cfg = FlatConfig::new()
            .with("policy", "pol")
            .with("pol_origin", "example.com");
        let set = PolicySet::from_config(&cfg);
        assert_eq!(set.select("", None).origin(), Some("example.com"));
        assert_eq!(set.select("example2.com", None), Selection::Unmatched);
    }

    #[test]
    fn test_verbmatch_uses_method() {
        let cfg = FlatConfig::new()
            .with("policy", "pol1,pol2")
            .with("matchstrategy", "verbmatch")
            .with("pol1_origin", "*.woopy.com")
            .with("pol1_methods", "GET,PUT,DELETE")
            .with("pol2_origin", "*")
            .with("pol2_methods", "*");
        let set = PolicySet::from_config(&cfg);
        assert_eq!(set.strategy(), MatchStrategy::VerbMatch);

        let selection = set.select("a.woopy.com", Some("PUT"));
        assert_eq!(selection.policy_name(), Some("pol1"));
        assert_eq!(selection.origin(), Some("a.woopy.com"));

        let selection = set.select("a.woopy.com", Some("PATCH"));
        assert_eq!(selection.policy_name(), Some("pol2"));
        assert_eq!(selection.origin(), Some("*"));

        // method tokens compare case-sensitively
        assert_eq!(set.select("a.woopy.com", Some("put")).policy_name(), Some("pol2"));
    }

    #[test]
    fn test_firstmatch_ignores_method() {
        let cfg = FlatConfig::new()
            .with("policy", "pol1,pol2")
            .with("pol1_origin", "*")
            .with("pol1_methods", "GET")
            .with("pol2_origin", "*");
        let set = PolicySet::from_config(&cfg);
        assert_eq!(set.select("a.com", Some("DELETE")).policy_name(), Some("pol1"));
    }

    #[test]
    fn test_unknown_strategy_reports_and_defaults() {
        let cfg = FlatConfig::new()
            .with("policy", "pol")
            .with("matchstrategy", "bestmatch")
            .with("pol_origin", "*");
        let set = PolicySet::from_config(&cfg);
        assert_eq!(set.strategy(), MatchStrategy::FirstMatch);
        assert!(set.diagnostics().contains(&PolicyDiagnostic::UnknownMatchStrategy {
            value: "bestmatch".to_string()
        }));
    }

    #[test]
    fn test_no_fields_diagnostic() {
        let set = PolicySet::from_config(&FlatConfig::new().with("policy", "ghost"));
        assert_eq!(
            set.diagnostics(),
            [PolicyDiagnostic::NoFields {
                policy: "ghost".to_string()
            }]
        );
        assert_eq!(set.select("a.com", None), Selection::Unmatched);
    }

    #[test]
    fn test_missing_origin_diagnostic_behaves_like_deny() {
        let cfg = FlatConfig::new()
            .with("policy", "pol")
            .with("pol_methods", "GET");
        let set = PolicySet::from_config(&cfg);
        assert_eq!(
            set.diagnostics(),
            [PolicyDiagnostic::MissingOrigin {
                policy: "pol".to_string()
            }]
        );
        assert_eq!(set.select("a.com", Some("GET")), Selection::Unmatched);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = FlatConfig::new()
            .with("policy", "pol")
            .with("pol_origin", "*")
            .with("pol_credentials", "maybe")
            .with("pol_maxage", "-5")
            .with("pol_colour", "blue");
        let set = PolicySet::from_config(&cfg);
        let policy = set.policy("pol").unwrap();
        assert!(!policy.credentials());
        assert!(policy.max_age().is_none());
        assert_eq!(set.diagnostics().len(), 3);
        assert!(set.diagnostics().contains(&PolicyDiagnostic::UnknownField {
            policy: "pol".to_string(),
            field: "colour".to_string()
        }));
    }

    #[test]
    fn test_all_fields_parsed() {
        let cfg = FlatConfig::new()
            .with("policy", "pol")
            .with("pol_origin", "example.com example?.com *.example.com")
            .with("pol_methods", "put,delete")
            .with("pol_headers", "header1,header2")
            .with("pol_expose_headers", "X-Total-Count")
            .with("pol_credentials", "true")
            .with("pol_maxage", "100");
        let set = PolicySet::from_config(&cfg);
        assert!(set.diagnostics().is_empty());

        let policy = set.policy("pol").unwrap();
        assert_eq!(policy.origin().patterns().len(), 3);
        assert_eq!(policy.methods(), &MethodRule::parse("put,delete"));
        assert_eq!(policy.expose_headers(), Some("X-Total-Count"));
        assert!(policy.credentials());
        assert_eq!(policy.max_age(), Some(100));
    }

    #[test]
    fn test_deny_produces_no_diagnostics() {
        let set = PolicySet::from_config(&FlatConfig::new().with("policy", "deny"));
        assert!(set.diagnostics().is_empty());
        assert!(set.policy("deny").unwrap().is_deny());
    }

    #[test]
    fn test_direct_policy() {
        let set = PolicySet::direct([("origin", "*"), ("credentials", "true")]);
        assert_eq!(set.active_policies(), ["direct"]);
        assert_eq!(set.strategy(), MatchStrategy::FirstMatch);
        let selection = set.select("https://x.org", Some("GET"));
        assert_eq!(selection.policy_name(), Some("direct"));
        assert_eq!(selection.origin(), Some("*"));
        assert!(selection.policy().unwrap().credentials());
    }

    #[test]
    fn test_from_policies_keeps_order() {
        let set = PolicySet::from_policies(
            MatchStrategy::FirstMatch,
            [
                Policy::builder("narrow").origin("*.corp.example").build(),
                Policy::builder("wide").origin("copy").build(),
            ],
        );
        assert_eq!(set.active_policies(), ["narrow", "wide"]);
        assert_eq!(set.select("a.corp.example", None).policy_name(), Some("narrow"));
        assert_eq!(set.select("b.example", None).policy_name(), Some("wide"));
    }

    #[test]
    fn test_match_strategy_parse() {
        assert_eq!(MatchStrategy::parse("VerbMatch"), Some(MatchStrategy::VerbMatch));
        assert_eq!(MatchStrategy::parse(" firstmatch "), Some(MatchStrategy::FirstMatch));
        assert_eq!(MatchStrategy::parse("other"), None);
        assert_eq!(MatchStrategy::VerbMatch.to_string(), "verbmatch");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool(""), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
