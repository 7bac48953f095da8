use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid bouquet document: {message}")]
    InvalidDocumentError { message: String },

    #[error("Name mapping file not found: {path}")]
    MissingNameMappingError { path: String },

    #[error("No document to edit: {message}")]
    NoDocumentError { message: String },

    #[error("Service key '{key}' already exists")]
    DuplicateServiceKeyError { key: String },

    #[error("Service key '{key}' has duplicate device {device_type}/{device_platform}")]
    DuplicateDeviceError {
        key: String,
        device_type: String,
        device_platform: String,
    },

    #[error("Service key '{key}' not found")]
    BouquetNotFoundError { key: String },

    #[error("Device {device_type}/{device_platform} not found in service key '{key}'")]
    DeviceNotFoundError {
        key: String,
        device_type: String,
        device_platform: String,
    },

    #[error("Unknown connectivity flag '{value}'")]
    UnknownConnectivityError { value: String },

    #[error("Cannot add service key '{key}': document has no reference bouquet to copy ids from")]
    NoReferenceBouquetError { key: String },
}

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EditorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EditorError::IoError(_) => ErrorCategory::Io,
            EditorError::SerializationError(_)
            | EditorError::CsvError(_)
            | EditorError::InvalidDocumentError { .. }
            | EditorError::UnknownConnectivityError { .. }
            | EditorError::NoDocumentError { .. } => ErrorCategory::Data,
            EditorError::ConfigValidationError { .. }
            | EditorError::InvalidConfigValueError { .. }
            | EditorError::MissingNameMappingError { .. } => ErrorCategory::Configuration,
            EditorError::DuplicateServiceKeyError { .. }
            | EditorError::DuplicateDeviceError { .. }
            | EditorError::BouquetNotFoundError { .. }
            | EditorError::DeviceNotFoundError { .. }
            | EditorError::NoReferenceBouquetError { .. } => ErrorCategory::Edit,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 重複鍵只是警告，狀態沒有被修改
            EditorError::DuplicateServiceKeyError { .. } => ErrorSeverity::Low,
            EditorError::BouquetNotFoundError { .. }
            | EditorError::DeviceNotFoundError { .. }
            | EditorError::NoReferenceBouquetError { .. } => ErrorSeverity::Medium,
            EditorError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EditorError::IoError(e) => format!("Could not read or write a file: {}", e),
            EditorError::SerializationError(e) => format!("The JSON file could not be parsed: {}", e),
            EditorError::InvalidDocumentError { message } => {
                format!("The bouquet file is not valid: {}", message)
            }
            EditorError::MissingNameMappingError { path } => {
                format!("Could not find name mapping file: {}", path)
            }
            EditorError::DuplicateServiceKeyError { key } => {
                format!("Service Key {} already exists.", key)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the paths exist and are writable, then retry",
            ErrorCategory::Data => "Fix the input JSON so every bouquet has serviceKey, bouquetId, subBouquetId and devices, and every device has deviceConnectivity",
            ErrorCategory::Configuration => "Check the config file and command line flags",
            ErrorCategory::Edit => "Run `keys` or `show <key>` to list what can be edited",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_is_low_severity() {
        let err = EditorError::DuplicateServiceKeyError {
            key: "K1".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Edit);
        assert_eq!(err.user_friendly_message(), "Service Key K1 already exists.");
    }

    #[test]
    fn test_io_error_is_critical() {
        let err = EditorError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Io);
    }
}
