//! Construction-time diagnostics.
//!
//! Building a [`PolicySet`](crate::PolicySet) never fails. Anything that looks
//! like operator error is reported as a [`PolicyDiagnostic`] instead, and the
//! affected field falls back to its default. A policy without an origin
//! simply never grants anything.

use thiserror::Error;

/// A non-fatal configuration problem found while building policies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyDiagnostic {
    /// An active policy has no prefixed keys at all.
    #[error("policy '{policy}' is active but has no configuration keys")]
    NoFields {
        /// The policy name.
        policy: String,
    },

    /// An active policy has keys, but no `origin`.
    #[error("policy '{policy}' has no origin configured and will never grant access")]
    MissingOrigin {
        /// The policy name.
        policy: String,
    },

    /// A prefixed key names a field the engine does not know.
    #[error("policy '{policy}' has unknown field '{field}'")]
    UnknownField {
        /// The policy name.
        policy: String,
        /// The unrecognised field.
        field: String,
    },

    /// A field value could not be parsed; the default is used instead.
    #[error("policy '{policy}' has invalid value '{value}' for field '{field}'")]
    InvalidValue {
        /// The policy name.
        policy: String,
        /// The field being parsed.
        field: String,
        /// The rejected value.
        value: String,
    },

    /// The match strategy is not `firstmatch` or `verbmatch`.
    #[error("unknown match strategy '{value}', using firstmatch")]
    UnknownMatchStrategy {
        /// The rejected value.
        value: String,
    },
}

impl PolicyDiagnostic {
    /// The policy this diagnostic refers to, if any.
    #[must_use]
    pub fn policy(&self) -> Option<&str> {
        match self {
            Self::NoFields { policy }
            | Self::MissingOrigin { policy }
            | Self::UnknownField { policy, .. }
            | Self::InvalidValue { policy, .. } => Some(policy),
            Self::UnknownMatchStrategy { .. } => None,
        }
    }
}
