//! Custom error types for the DNS manager
//!
//! Provides structured error handling with context for the different failure
//! scenarios: configuration, persistence, the DNS provider API and request
//! validation.

use std::fmt;

/// Main error type for the DNS manager
#[derive(Debug)]
pub enum ManagerError {
    /// Configuration-related errors
    Config(ConfigError),

    /// Database operation errors
    Database(DatabaseError),

    /// DNS provider API errors
    Provider(ProviderError),

    /// Rejected user input
    Validation(ValidationError),

    /// Other errors with context
    Other(String),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Configuration parsing error
    ParseError { path: String, reason: String },
}

/// Database error variants
#[derive(Debug)]
pub enum DatabaseError {
    /// Query execution failed
    QueryFailed { query: String, reason: String },

    /// A stored value could not be mapped back to its domain type
    SerializationError { reason: String },
}

/// A single error entry from the provider's response envelope
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProviderErrorDetail {
    pub code: i64,
    pub message: String,
}

/// DNS provider error variants
#[derive(Debug)]
pub enum ProviderError {
    /// The request never produced a response (connect failure, timeout)
    RequestFailed { operation: String, reason: String },

    /// Non-2xx HTTP status
    HttpStatus {
        operation: String,
        status: u16,
        body: String,
    },

    /// The envelope reported `success: false`
    Api {
        operation: String,
        errors: Vec<ProviderErrorDetail>,
    },

    /// The response body did not have the expected shape
    InvalidResponse { operation: String, reason: String },
}

/// Validation error variants
#[derive(Debug)]
pub enum ValidationError {
    /// A required field is absent or empty
    MissingField { field: String },

    /// A field is present but its value is not acceptable
    InvalidField { field: String, reason: String },
}

impl ValidationError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        ValidationError::MissingField {
            field: field.to_string(),
        }
    }
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerError::Config(e) => write!(f, "Configuration error: {}", e),
            ManagerError::Database(e) => write!(f, "Database error: {}", e),
            ManagerError::Provider(e) => write!(f, "{}", e),
            ManagerError::Validation(e) => write!(f, "Validation failed: {}", e),
            ManagerError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError { path, reason } => {
                write!(f, "Failed to parse config '{}': {}", path, reason)
            }
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::QueryFailed { query, reason } => {
                write!(f, "Query '{}' failed: {}", query, reason)
            }
            DatabaseError::SerializationError { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::RequestFailed { operation, reason } => {
                write!(f, "Cloudflare request failed while {}: {}", operation, reason)
            }
            ProviderError::HttpStatus {
                operation,
                status,
                body,
            } => {
                write!(f, "Cloudflare API error while {}: HTTP {} {}", operation, status, body)
            }
            ProviderError::Api { operation, errors } => {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| format!("[{}] {}", e.code, e.message))
                    .collect();
                write!(
                    f,
                    "Cloudflare API returned errors while {}: {}",
                    operation,
                    messages.join("; ")
                )
            }
            ProviderError::InvalidResponse { operation, reason } => {
                write!(f, "Invalid Cloudflare response while {}: {}", operation, reason)
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField { field } => write!(f, "{} is required", field),
            ValidationError::InvalidField { field, reason } => write!(f, "{}: {}", field, reason),
        }
    }
}

impl std::error::Error for ManagerError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for DatabaseError {}
impl std::error::Error for ProviderError {}
impl std::error::Error for ValidationError {}

impl From<anyhow::Error> for ManagerError {
    fn from(err: anyhow::Error) -> Self {
        ManagerError::Other(err.to_string())
    }
}

impl From<ConfigError> for ManagerError {
    fn from(err: ConfigError) -> Self {
        ManagerError::Config(err)
    }
}

impl From<DatabaseError> for ManagerError {
    fn from(err: DatabaseError) -> Self {
        ManagerError::Database(err)
    }
}

impl From<ProviderError> for ManagerError {
    fn from(err: ProviderError) -> Self {
        ManagerError::Provider(err)
    }
}

impl From<ValidationError> for ManagerError {
    fn from(err: ValidationError) -> Self {
        ManagerError::Validation(err)
    }
}
