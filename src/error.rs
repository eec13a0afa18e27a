//! Error types for Sellus.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Root error type for Sellus operations.
#[derive(Error, Debug)]
pub enum SellusError {
    /// Integration-related errors
    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    /// Registry-related errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `expect_here` was called while no declaration was running
    #[error("expect_here called outside of a declaration")]
    OutsideDeclaration,
}

/// Error raised by a tester while checking an element.
///
/// This is the payload attached to error notifications. It never escapes a
/// guarded tester as a panic or an `Err`. [`TesterError::Delivery`] marks an
/// element notification that an integration failed to deliver.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TesterError {
    /// The tester returned an error
    #[error("tester failed: {0}")]
    Failed(String),

    /// The tester panicked
    #[error("tester panicked: {0}")]
    Panicked(String),

    /// An integration could not deliver the element notification
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl TesterError {
    /// Build a `TesterError` from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TesterError::Panicked(message)
    }

    /// The human-readable message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            TesterError::Failed(msg)
            | TesterError::Panicked(msg)
            | TesterError::Delivery(msg) => msg,
        }
    }
}

/// Errors that can occur while looking up or notifying integrations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    /// No binding exists for the correlation name
    #[error("No integration binding for test: {0}")]
    UnknownTest(String),

    /// A binding refers to an integration that was never registered
    #[error("Integration not registered: {0}")]
    UnknownIntegration(String),

    /// The integration could not deliver the notification
    #[error("Integration {integration} failed to deliver: {message}")]
    DeliveryFailed {
        /// Name of the failing integration
        integration: String,
        /// Reason reported by the integration
        message: String,
    },
}

/// Errors that can occur in registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Entry already registered with this name
    #[error("Integration already registered: {0}")]
    AlreadyRegistered(String),

    /// Invalid entry name
    #[error("Invalid integration name: {0:?}")]
    InvalidName(String),
}

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// IO error while reading or writing a configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type alias for integration operations.
pub type IntegrationResult<T> = Result<T, IntegrationError>;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for general Sellus operations.
pub type SellusResult<T> = Result<T, SellusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tester_error_from_str_panic() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(
            TesterError::from_panic(payload),
            TesterError::Panicked("boom".to_string())
        );
    }

    #[test]
    fn test_tester_error_from_string_panic() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("index out of range"));
        let err = TesterError::from_panic(payload);
        assert_eq!(err.message(), "index out of range");
    }

    #[test]
    fn test_tester_error_from_opaque_panic() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert!(matches!(
            TesterError::from_panic(payload),
            TesterError::Panicked(_)
        ));
    }

    #[test]
    fn test_root_error_conversion() {
        let err: SellusError = IntegrationError::UnknownTest("pscheck".to_string()).into();
        assert!(err.to_string().contains("pscheck"));
    }
}
