//! Unified error handling system
//!
//! Provides the request failure taxonomy (network, server, application) plus
//! the ambient configuration/storage errors, each carrying an error context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type PortalResult<T> = Result<T, PortalError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Why an envelope was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationErrorKind {
    /// Envelope code 401: the session is no longer valid
    Unauthorized,
    /// Any other non-200 envelope code
    Other,
}

impl std::fmt::Display for ApplicationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApplicationErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Main error type for the portal client
#[derive(Error, Debug)]
pub enum PortalError {
    /// No transport response was received (connectivity loss, timeout)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Non-2xx transport status without a usable envelope
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    /// Envelope arrived but its code was not 200
    #[error("Application error ({kind}, code {code}): {message}")]
    Application {
        kind: ApplicationErrorKind,
        code: i64,
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Navigation error: {message}")]
    Navigation {
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PortalError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            PortalError::Network { context, .. } => Some(context),
            PortalError::Server { context, .. } => Some(context),
            PortalError::Application { context, .. } => Some(context),
            PortalError::Config { context, .. } => Some(context),
            PortalError::Storage { context, .. } => Some(context),
            PortalError::Validation { context, .. } => Some(context),
            PortalError::Navigation { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True when the failure means the session is no longer valid,
    /// either via envelope code 401 or HTTP status 401.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            PortalError::Application { kind, .. } => *kind == ApplicationErrorKind::Unauthorized,
            PortalError::Server { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// Check if error is recoverable by retrying later
    pub fn is_recoverable(&self) -> bool {
        match self {
            PortalError::Network { .. } => true,
            PortalError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The user-facing message carried by the error, without the variant prefix
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Network { message, .. }
            | PortalError::Server { message, .. }
            | PortalError::Application { message, .. }
            | PortalError::Config { message, .. }
            | PortalError::Storage { message, .. }
            | PortalError::Validation { message, .. }
            | PortalError::Navigation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            _ if self.is_recoverable() => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Request failed at transport level (may be recoverable)"
                );
            }
            PortalError::Server { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Request failed at transport level"
                );
            }
            PortalError::Application { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Backend rejected the request"
                );
            }
            PortalError::Config { .. } | PortalError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::PortalError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'portal config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::PortalError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::PortalError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the token file directory is writable"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::PortalError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}
