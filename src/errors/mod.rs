//! Error types for the request gateway.
//!
//! Configuration and unsupported-method errors surface synchronously; every
//! other failure is delivered as the single error item of a
//! [`ResultStream`](crate::stream::ResultStream).

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error type for gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error (missing base address, invalid header, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// The requested verb is not one of GET, POST, PUT, PATCH or DELETE.
    #[error("Method not supported: {method}")]
    UnsupportedMethod {
        /// The verb as it was supplied.
        method: String,
    },

    /// Failure reported by the underlying transport, forwarded unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("Request failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, lossily decoded as UTF-8.
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl GatewayError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        GatewayError::Configuration {
            message: message.into(),
        }
    }

    /// Returns the HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the error originated in the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
