//! # Corsair Core
//!
//! The CORS policy engine: everything that decides *whether* and *what* to
//! grant, independent of any HTTP stack.
//!
//! - [`pattern`] - Filename-style glob matching of origins and methods
//! - [`Policy`] - One named ruleset, with typed origin/method/header rules
//! - [`PolicySet`] - The ordered, immutable set of active policies
//! - [`PolicySelector`] - Memoized policy selection over an injected [`SelectionCache`]
//! - [`PreflightGrant`] / [`ActualGrant`] - Header values derived from a [`Selection`]
//! - [`PolicyDiagnostic`] - Non-fatal construction-time findings
//!
//! Every decision function is total: there is no error path between a
//! request arriving and its headers being computed.

#![doc(html_root_url = "https://docs.rs/corsair-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod diagnostic;
mod flat;
mod grant;
pub mod pattern;
mod policy;
mod policy_set;
mod selector;

pub use cache::{BoundedCache, CacheStats, NoCache, SelectionCache, SelectionKey};
pub use diagnostic::PolicyDiagnostic;
pub use flat::{FlatConfig, MATCH_STRATEGY_KEY, POLICY_KEY};
pub use grant::{ActualGrant, PreflightGrant};
pub use policy::{
    HeaderRule, MethodRule, OriginRule, Policy, PolicyBuilder, DENY_POLICY, DIRECT_POLICY,
};
pub use policy_set::{MatchStrategy, PolicySet};
pub use selector::{PolicySelector, Selection};
