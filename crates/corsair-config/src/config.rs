//! Loaded configuration types.

use corsair_core::{FlatConfig, PolicySet};
use corsair_telemetry::LogConfig;

use crate::schema::{LogFormat, LoggingSection};

/// Logging settings carried alongside the CORS keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive).
    pub level: String,

    /// Log output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingSettings {
    /// Debug level, pretty output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
        }
    }

    /// Overlays the fields set in a `[logging]` table.
    pub fn apply(&mut self, section: LoggingSection) {
        if let Some(level) = section.level {
            self.level = level;
        }
        if let Some(format) = section.format {
            self.format = format;
        }
    }

    /// The telemetry logging configuration for these settings.
    ///
    /// ```
    /// use corsair_config::{LogFormat, LoggingSettings};
    ///
    /// let settings = LoggingSettings {
    ///     level: "warn".to_string(),
    ///     format: LogFormat::Pretty,
    /// };
    /// let config = settings.to_log_config();
    /// assert_eq!(config.level, "warn");
    /// assert!(!config.json_format);
    /// ```
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        base.with_level(self.level.clone())
    }
}

/// Complete corsair configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files, strings
/// and environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsairConfig {
    /// Flat CORS keys: `policy`, `matchstrategy` and `<name>_<field>`.
    pub cors: FlatConfig,

    /// Logging settings.
    pub logging: LoggingSettings,
}

impl CorsairConfig {
    /// Builds the policy set described by the CORS keys.
    ///
    /// ```
    /// use corsair_config::CorsairConfig;
    /// use corsair_core::FlatConfig;
    ///
    /// let config = CorsairConfig {
    ///     cors: FlatConfig::new()
    ///         .with("policy", "open")
    ///         .with("open_origin", "*"),
    ///     ..Default::default()
    /// };
    /// assert_eq!(config.policy_set().active_policies(), ["open"]);
    /// ```
    #[must_use]
    pub fn policy_set(&self) -> PolicySet {
        PolicySet::from_config(&self.cors)
    }

    /// The telemetry logging configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        self.logging.to_log_config()
    }
}
