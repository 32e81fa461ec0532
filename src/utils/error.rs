use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Classifier request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to load artifact '{path}': {message}")]
    ArtifactError { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Tickets file '{file}' cannot be updated: {message}")]
    UnreadableTickets { file: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Classifier unavailable: {message}")]
    ClassifierUnavailable { message: String },

    #[error("Ticket #{id} not found")]
    TicketNotFound { id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TriageError {
    pub fn artifact(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ArtifactError {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// 錯誤嚴重程度，決定程序的退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TriageError::ValidationError { .. } | TriageError::TicketNotFound { .. } => {
                ErrorSeverity::Low
            }
            TriageError::HttpError(_) | TriageError::ClassifierUnavailable { .. } => {
                ErrorSeverity::Medium
            }
            TriageError::ConfigError { .. }
            | TriageError::InvalidConfigValueError { .. }
            | TriageError::UnreadableTickets { .. }
            | TriageError::SerializationError(_) => ErrorSeverity::High,
            TriageError::ArtifactError { .. } | TriageError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TriageError::HttpError(_) | TriageError::ClassifierUnavailable { .. } => {
                "The classifier API is not running or did not answer".to_string()
            }
            TriageError::ArtifactError { path, .. } => {
                format!("Model artifacts could not be loaded from {}", path)
            }
            TriageError::TicketNotFound { id } => format!("No ticket with id {}", id),
            TriageError::ValidationError { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
