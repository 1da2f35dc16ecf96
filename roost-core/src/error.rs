//! Error types for Roost operations

use thiserror::Error;

/// Key/value backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Read failed for key {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Write failed for key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Remove failed for key {key}: {reason}")]
    RemoveFailed { key: String, reason: String },

    #[error("Serialization failed for key {key}: {reason}")]
    SerializationFailed { key: String, reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Errors raised by caller-supplied fetch functions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Remote returned status {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl FetchError {
    /// Shorthand for a transport-level failure.
    pub fn request(reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            reason: reason.into(),
        }
    }
}

/// Malformed input records (reservations, monthly series entries).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidFieldValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown month label: {label}")]
    UnknownMonth { label: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Telemetry initialization failed: {reason}")]
    TelemetryInit { reason: String },
}

/// Master error type for all Roost errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoostError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Roost operations.
pub type RoostResult<T> = Result<T, RoostError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_read_failed() {
        let err = StorageError::ReadFailed {
            key: "@roost_cache:revenue".to_string(),
            reason: "mdb_get".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Read failed"));
        assert!(msg.contains("@roost_cache:revenue"));
        assert!(msg.contains("mdb_get"));
    }

    #[test]
    fn test_fetch_error_display_remote() {
        let err = FetchError::Remote {
            status: 503,
            message: "maintenance".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }

    #[test]
    fn test_fetch_error_request_shorthand() {
        let err = FetchError::request("connection reset");
        assert_eq!(
            err,
            FetchError::RequestFailed {
                reason: "connection reset".to_string()
            }
        );
    }

    #[test]
    fn test_validation_error_display_unknown_month() {
        let err = ValidationError::UnknownMonth {
            label: "Q3".to_string(),
        };
        assert!(format!("{}", err).contains("Q3"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "throttle_window".to_string(),
            value: "0ns".to_string(),
            reason: "must be positive".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("throttle_window"));
        assert!(msg.contains("0ns"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_roost_error_from_variants() {
        let storage = RoostError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, RoostError::Storage(_)));

        let fetch = RoostError::from(FetchError::request("timeout"));
        assert!(matches!(fetch, RoostError::Fetch(_)));

        let validation = RoostError::from(ValidationError::RequiredFieldMissing {
            field: "arrivalDate".to_string(),
        });
        assert!(matches!(validation, RoostError::Validation(_)));

        let config = RoostError::from(ConfigError::MissingRequired {
            field: "key_prefix".to_string(),
        });
        assert!(matches!(config, RoostError::Config(_)));
    }
}
