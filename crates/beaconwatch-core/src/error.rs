//! Unified error types for the beaconwatch core library.
//!
//! This module provides a unified error type [`BeaconwatchError`] that covers
//! all failure modes across the system.
//!
//! # Design Principles
//!
//! - **Specific variants**: Each error variant captures exactly one failure mode
//! - **Actionable messages**: Error messages guide users toward resolution
//! - **Never fatal mid-flight**: Monitoring and ranging failures are reported
//!   and absorbed by the state machine; only startup configuration is fatal

use std::path::PathBuf;
use thiserror::Error;

/// The unified error type for all beaconwatch operations.
#[derive(Debug, Error)]
pub enum BeaconwatchError {
    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configured beacon family UUID could not be parsed.
    #[error(
        "Invalid beacon UUID: '{value}'. Expected an RFC 4122 string such as \
         '90dc5409-c9f4-4854-bc38-94367885850e'."
    )]
    InvalidBeaconUuid {
        /// The string that failed to parse.
        value: String,
        /// The underlying parse error.
        #[source]
        source: uuid::Error,
    },

    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file exists but could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    // =========================================================================
    // MONITORING & RANGING ERRORS
    // =========================================================================
    /// The location service could not start or continue monitoring a region.
    #[error(
        "Monitoring failed for region '{}': {message}",
        .region.as_deref().unwrap_or("<unspecified>")
    )]
    MonitoringFailed {
        /// Identifier of the affected region, when the service reported one.
        region: Option<String>,
        /// Failure description from the location service.
        message: String,
    },

    /// The location service could not range beacons within a region.
    #[error("Ranging failed for region '{region}': {message}")]
    RangingFailed {
        /// Identifier of the affected region.
        region: String,
        /// Failure description from the location service.
        message: String,
    },

    // =========================================================================
    // I/O ERRORS
    // =========================================================================
    /// A low-level I/O error occurred while reading or writing configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for beaconwatch operations.
pub type Result<T> = std::result::Result<T, BeaconwatchError>;

/// Shorthand alias for [`BeaconwatchError`].
pub type Error = BeaconwatchError;

impl BeaconwatchError {
    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidBeaconUuid { .. }
                | Self::ConfigNotFound(_)
                | Self::ConfigParse(_)
                | Self::ConfigValidation(_)
        )
    }

    /// Returns `true` if the state machine can keep operating past this error.
    ///
    /// Monitoring and ranging failures shrink the active set but never halt
    /// the system; configuration errors at startup do.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MonitoringFailed { .. } | Self::RangingFailed { .. })
    }

    /// Returns a machine-readable error code for structured log fields.
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBeaconUuid { .. } => "INVALID_BEACON_UUID",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParse(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidation(_) => "CONFIG_VALIDATION_ERROR",
            Self::MonitoringFailed { .. } => "MONITORING_FAILED",
            Self::RangingFailed { .. } => "RANGING_FAILED",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoErr, ErrorKind};

    fn bad_uuid_error() -> BeaconwatchError {
        let source = "not-a-uuid".parse::<uuid::Uuid>().unwrap_err();
        BeaconwatchError::InvalidBeaconUuid {
            value: "not-a-uuid".into(),
            source,
        }
    }

    #[test]
    fn test_config_error_classification() {
        assert!(bad_uuid_error().is_config_error());
        assert!(BeaconwatchError::ConfigNotFound(PathBuf::from("/test")).is_config_error());
        assert!(BeaconwatchError::ConfigParse("syntax error".into()).is_config_error());
        assert!(BeaconwatchError::ConfigValidation("empty identifier".into()).is_config_error());

        assert!(!BeaconwatchError::RangingFailed {
            region: "MainRegion".into(),
            message: "radio busy".into()
        }
        .is_config_error());
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(BeaconwatchError::MonitoringFailed {
            region: Some("SubRegion-1-1".into()),
            message: "too many regions".into()
        }
        .is_recoverable());
        assert!(BeaconwatchError::RangingFailed {
            region: "MainRegion".into(),
            message: "radio busy".into()
        }
        .is_recoverable());

        assert!(!bad_uuid_error().is_recoverable());
        assert!(!BeaconwatchError::ConfigParse("bad toml".into()).is_recoverable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(bad_uuid_error().error_code(), "INVALID_BEACON_UUID");
        assert_eq!(
            BeaconwatchError::ConfigNotFound(PathBuf::new()).error_code(),
            "CONFIG_NOT_FOUND"
        );
        assert_eq!(
            BeaconwatchError::MonitoringFailed {
                region: None,
                message: "unknown".into()
            }
            .error_code(),
            "MONITORING_FAILED"
        );
    }

    #[test]
    fn test_error_display_messages() {
        let err = bad_uuid_error();
        assert!(format!("{err}").contains("not-a-uuid"));

        let err = BeaconwatchError::MonitoringFailed {
            region: None,
            message: "denied".into(),
        };
        assert!(format!("{err}").contains("<unspecified>"));

        let err = BeaconwatchError::MonitoringFailed {
            region: Some("SubRegion-2-7".into()),
            message: "denied".into(),
        };
        assert!(format!("{err}").contains("SubRegion-2-7"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoErr::new(ErrorKind::NotFound, "file not found");
        let err: BeaconwatchError = io_err.into();
        assert!(matches!(err, BeaconwatchError::Io(_)));
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<BeaconwatchError>();
        assert_sync::<BeaconwatchError>();
    }
}
