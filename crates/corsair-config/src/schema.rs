//! On-disk configuration document.
//!
//! ```toml
//! [cors]
//! policy = "api,public"
//! matchstrategy = "firstmatch"
//! api_origin = "https://*.example.com"
//! api_methods = ["GET", "POST", "DELETE"]
//! api_credentials = true
//! api_maxage = 600
//! public_origin = "*"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! `[cors]` values may be strings, booleans, numbers or arrays of strings;
//! they are flattened to the string form the policy engine reads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

impl LogFormat {
    /// Parses `json` or `pretty`, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// A scalar (or string list) value in the `[cors]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CorsValue {
    /// `true` / `false`.
    Bool(bool),
    /// Whole number, e.g. a max age.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Plain string.
    String(String),
    /// List of strings, joined with `,`.
    List(Vec<String>),
}

impl CorsValue {
    /// The flat string form of this value.
    ///
    /// ```
    /// use corsair_config::CorsValue;
    ///
    /// assert_eq!(CorsValue::Bool(true).into_flat(), "true");
    /// assert_eq!(CorsValue::Integer(600).into_flat(), "600");
    /// assert_eq!(
    ///     CorsValue::List(vec!["GET".into(), "POST".into()]).into_flat(),
    ///     "GET,POST"
    /// );
    /// ```
    #[must_use]
    pub fn into_flat(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s,
            Self::List(items) => items.join(","),
        }
    }
}

/// The `[logging]` table. Unset fields leave earlier layers untouched.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directive.
    #[serde(default)]
    pub level: Option<String>,

    /// Output format.
    #[serde(default)]
    pub format: Option<LogFormat>,
}

/// A whole configuration file or string.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    /// Flat CORS keys.
    #[serde(default)]
    pub cors: IndexMap<String, CorsValue>,

    /// Logging overrides.
    #[serde(default)]
    pub logging: LoggingSection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" pretty "), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("compact"), None);
    }

    #[test]
    fn test_cors_values_from_toml() {
        let doc: ConfigDocument = toml::from_str(
            r#"
            [cors]
            policy = "pol"
            pol_credentials = true
            pol_maxage = 600
            pol_methods = ["GET", "PUT"]
            "#,
        )
        .unwrap();

        let mut flat: Vec<(String, String)> = doc
            .cors
            .into_iter()
            .map(|(k, v)| (k, v.into_flat()))
            .collect();
        flat.sort();
        assert_eq!(
            flat,
            vec![
                ("pol_credentials".to_string(), "true".to_string()),
                ("pol_maxage".to_string(), "600".to_string()),
                ("pol_methods".to_string(), "GET,PUT".to_string()),
                ("policy".to_string(), "pol".to_string()),
            ]
        );
        assert_eq!(doc.logging, LoggingSection::default());
    }

    #[test]
    fn test_float_value() {
        assert_eq!(CorsValue::Float(1.5).into_flat(), "1.5");
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<ConfigDocument, _> = toml::from_str("[server]\nport = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_logging_field_rejected() {
        let result: Result<ConfigDocument, _> =
            serde_json::from_str(r#"{"logging": {"colour": true}}"#);
        assert!(result.is_err());
    }
}
