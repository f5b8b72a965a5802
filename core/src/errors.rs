use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open output {}: {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(#[from] UnsupportedOperation),

    #[error("Row has {actual} fields but the table declares {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to load configuration from {location}: {error}")]
    LoadFailed {
        location: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Operations a write-only sink refuses outright.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedOperation {
    #[error("csv_writer tables cannot be read")]
    Select,

    #[error("csv_writer tables do not support UPDATE")]
    Update,

    #[error("csv_writer tables do not support DELETE")]
    Delete,

    #[error("sink is closed")]
    WriteAfterClose,
}

pub type Result<T> = std::result::Result<T, SinkError>;

impl SinkError {
    /// Errors that keep a table instance from ever being constructed.
    pub fn is_fatal_to_construction(&self) -> bool {
        matches!(self, SinkError::Config(_) | SinkError::SinkOpen { .. })
    }
}

impl ConfigError {
    pub fn missing_field(field: &str) -> Self {
        ConfigError::MissingField {
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::Invalid {
            message: "Test message".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid configuration: Test message");
    }

    #[test]
    fn test_missing_field_display() {
        let error = SinkError::from(ConfigError::missing_field("filename"));
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing required field: filename"
        );
    }

    #[test]
    fn test_unsupported_operation_display() {
        let error = SinkError::from(UnsupportedOperation::Delete);
        assert_eq!(
            error.to_string(),
            "Unsupported operation: csv_writer tables do not support DELETE"
        );
    }

    #[test]
    fn test_construction_errors_are_fatal() {
        let open = SinkError::SinkOpen {
            path: PathBuf::from("/nonexistent/out.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(open.is_fatal_to_construction());
        assert!(SinkError::from(ConfigError::missing_field("columns")).is_fatal_to_construction());

        let write = SinkError::Unsupported(UnsupportedOperation::WriteAfterClose);
        assert!(!write.is_fatal_to_construction());
        let width = SinkError::RowWidth {
            expected: 2,
            actual: 3,
        };
        assert!(!width.is_fatal_to_construction());
    }
}
