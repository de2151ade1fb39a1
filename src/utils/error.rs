use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitePulseError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("Monitor store is not available")]
    StoreUnavailable,

    #[error("Monitor not found: {id}")]
    NotFound { id: String },
}

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Validation,
    System,
}

/// 錯誤嚴重程度，main 依此決定退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SitePulseError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) => ErrorCategory::Network,
            Self::IoError(_) => ErrorCategory::System,
            Self::SerializationError(_) | Self::StoreError { .. } | Self::StoreUnavailable => {
                ErrorCategory::Storage
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ValidationError { .. } | Self::NotFound { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ValidationError { .. } | Self::NotFound { .. } => ErrorSeverity::Low,
            Self::HttpError(_) => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::SerializationError(_)
            | Self::StoreError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::StoreUnavailable => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the configuration file and command line flags"
            }
            ErrorCategory::Network => "Check network connectivity and the target URL",
            ErrorCategory::Storage => {
                "Check that the store path is writable and the snapshot is valid JSON"
            }
            ErrorCategory::Validation => "Check the request payload",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Self::MissingConfigError { field } => format!("Missing setting '{}'", field),
            Self::ConfigValidationError { field, message } => {
                format!("Invalid setting '{}': {}", field, message)
            }
            Self::ValidationError { message } => message.clone(),
            Self::StoreUnavailable => "Database service not available.".to_string(),
            Self::NotFound { .. } => "Monitor not found.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SitePulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_low_severity() {
        let err = SitePulseError::validation("Missing required fields.");
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.user_friendly_message(), "Missing required fields.");
    }

    #[test]
    fn test_config_errors_map_to_configuration() {
        let err = SitePulseError::InvalidConfigValueError {
            field: "server.port".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("server.port"));
    }

    #[test]
    fn test_store_unavailable_is_critical() {
        let err = SitePulseError::StoreUnavailable;
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.user_friendly_message(), "Database service not available.");
    }
}
