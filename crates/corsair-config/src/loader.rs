//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: files, strings, embedded pairs and environment
//! variables.

use std::env;
use std::fs;
use std::path::Path;

use corsair_core::FlatConfig;

use crate::schema::{ConfigDocument, LogFormat};
use crate::{ConfigError, CorsairConfig, LoggingSettings};

/// Configuration loader with layered approach.
///
/// Layers are applied in call order, later ones overriding earlier ones key
/// by key. Environment overrides registered with
/// [`with_env_prefix`](Self::with_env_prefix) are applied last, at
/// [`load`](Self::load).
///
/// # Example
///
/// ```no_run
/// use corsair_config::ConfigLoader;
///
/// # fn main() -> Result<(), corsair_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("cors.toml")?
///     .with_env_prefix("CORSAIR")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    cors: FlatConfig,
    logging: LoggingSettings,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Create a new loader with no CORS keys and default logging.
    ///
    /// ```
    /// use corsair_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert!(config.cors.is_empty());
    /// assert_eq!(config.logging.level, "info");
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from development logging settings (debug, pretty).
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.logging = LoggingSettings::development();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats, picked by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown sections or logging fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let document = Self::parse_file(&content, path)?;
        self.merge_document(document);
        tracing::debug!(path = %path.display(), "configuration file loaded");

        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or
    /// parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - Format name ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use corsair_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [cors]
    ///     policy = "open"
    ///     open_origin = "*"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.cors.get("open_origin"), Some("*"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let document = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => return Err(ConfigError::unsupported_format(format)),
        };

        self.merge_document(document);
        Ok(self)
    }

    /// Set flat CORS keys directly.
    ///
    /// ```
    /// use corsair_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_pairs([("policy", "api"), ("api_origin", "copy")])
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.cors.get("policy"), Some("api"));
    /// ```
    #[must_use]
    pub fn with_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.cors.extend(pairs);
        self
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "CORSAIR":
    /// - `CORSAIR__CORS__POLICY=api,public`
    /// - `CORSAIR__CORS__API_ORIGIN=https://*.example.com` (key `api_origin`)
    /// - `CORSAIR__LOGGING__LEVEL=debug`
    /// - `CORSAIR__LOGGING__FORMAT=pretty`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory or its parents, if
    /// one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), ".env loaded"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::invalid_value(".env", e.to_string())),
        }
        Ok(self)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment override cannot be parsed.
    pub fn load(mut self) -> Result<CorsairConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        Ok(CorsairConfig {
            cors: self.cors,
            logging: self.logging,
        })
    }

    fn parse_file(content: &str, path: &Path) -> Result<ConfigDocument, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::unsupported_format(path.display().to_string())),
        }
    }

    fn merge_document(&mut self, document: ConfigDocument) {
        self.cors
            .extend(document.cors.into_iter().map(|(k, v)| (k, v.into_flat())));
        self.logging.apply(document.logging);
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut env_vars: Vec<(String, String)> = env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        env_vars.sort();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix but not the separator, e.g. CORSAIRX__...
            return Ok(());
        };

        match rest.split_once("__") {
            Some(("CORS", flat_key)) if !flat_key.is_empty() => {
                self.cors.insert(flat_key.to_lowercase(), value);
            }
            Some(("LOGGING", "LEVEL")) => {
                self.logging.level = value.to_string();
            }
            Some(("LOGGING", "FORMAT")) => {
                self.logging.format = LogFormat::parse(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected 'json' or 'pretty'"))?;
            }
            _ => tracing::debug!(var = key, "ignoring unrecognized environment override"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert!(config.cors.is_empty());
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [cors]
            policy = "pol1"
            pol1_origin = "*"
            pol1_credentials = true
            pol1_maxage = 120

            [logging]
            level = "warn"
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.cors.get("policy"), Some("pol1"));
        assert_eq!(config.cors.get("pol1_credentials"), Some("true"));
        assert_eq!(config.cors.get("pol1_maxage"), Some("120"));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"cors": {"policy": "p", "p_origin": "copy", "p_methods": ["GET", "POST"]}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "JSON")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.cors.get("p_origin"), Some("copy"));
        assert_eq!(config.cors.get("p_methods"), Some("GET,POST"));
    }

    #[test]
    fn test_loader_with_unsupported_format() {
        let result = ConfigLoader::new().with_string("policy: deny", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_file_toml() {
        let file = write_temp(
            ".toml",
            "[cors]\npolicy = \"site\"\nsite_origin = \"https://*.example.com\"\n",
        );

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

        assert_eq!(config.cors.get("site_origin"), Some("https://*.example.com"));
        let set = config.policy_set();
        assert_eq!(
            set.select("https://api.example.com", None).origin(),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn test_loader_with_file_json() {
        let file = write_temp(".json", r#"{"logging": {"format": "pretty"}}"#);

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_file_unknown_extension() {
        let file = write_temp(".ini", "policy=deny");
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_file_invalid_toml() {
        let file = write_temp(".toml", "[cors\npolicy = ");
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/cors.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/cors.toml")
            .unwrap()
            .load()
            .unwrap();

        assert!(config.cors.is_empty());
    }

    #[test]
    fn test_later_layers_override() {
        let config = ConfigLoader::new()
            .with_string("[cors]\npolicy = \"a\"\na_origin = \"*\"\n", "toml")
            .unwrap()
            .with_pairs([("a_origin", "copy")])
            .load()
            .unwrap();

        assert_eq!(config.cors.get("policy"), Some("a"));
        assert_eq!(config.cors.get("a_origin"), Some("copy"));
    }

    #[test]
    fn test_logging_layers_merge_per_field() {
        let config = ConfigLoader::new()
            .with_string("[logging]\nformat = \"pretty\"\n", "toml")
            .unwrap()
            .with_string("[logging]\nlevel = \"trace\"\n", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    // Env overrides are exercised through apply_env_var so tests never touch
    // the process environment.

    #[test]
    fn test_apply_env_var_cors_key() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__CORS__POL1_ORIGIN", "https://*.example.com", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__CORS__MATCHSTRATEGY", "verbmatch", "TEST")
            .unwrap();
        assert_eq!(loader.cors.get("pol1_origin"), Some("https://*.example.com"));
        assert_eq!(loader.cors.get("matchstrategy"), Some("verbmatch"));
    }

    #[test]
    fn test_apply_env_var_overrides_file() {
        let mut loader = ConfigLoader::new().with_pairs([("policy", "a")]);
        loader.apply_env_var("TEST__CORS__POLICY", "b,a", "TEST").unwrap();
        assert_eq!(loader.cors.get("policy"), Some("b,a"));
    }

    #[test]
    fn test_apply_env_var_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "debug", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "Pretty", "TEST").unwrap();
        assert_eq!(loader.logging.level, "debug");
        assert_eq!(loader.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_apply_env_var_invalid_format() {
        let mut loader = ConfigLoader::new();
        let result = loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_apply_env_var_ignores_unknown() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SERVER__PORT", "8080", "TEST").unwrap();
        loader.apply_env_var("TESTING__CORS__POLICY", "x", "TEST").unwrap();
        loader.apply_env_var("TEST__CORS__", "x", "TEST").unwrap();
        assert!(loader.cors.is_empty());
    }
}
