//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while installing telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Failed to parse address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl TelemetryError {
    /// Creates a metrics initialization error.
    pub fn metrics_init(message: impl Into<String>) -> Self {
        Self::MetricsInit(message.into())
    }

    /// Creates a logging initialization error.
    pub fn logging_init(message: impl Into<String>) -> Self {
        Self::LoggingInit(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::metrics_init("failed");
        assert_eq!(err.to_string(), "Failed to initialize metrics: failed");

        let err = TelemetryError::logging_init("bad filter");
        assert_eq!(err.to_string(), "Failed to initialize logging: bad filter");

        let err = TelemetryError::InvalidAddress("nowhere".to_string());
        assert_eq!(err.to_string(), "Invalid address: nowhere");
    }
}
