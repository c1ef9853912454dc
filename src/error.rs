//! Unified error types for Navstack

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Navstack
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Location could not be parsed
    #[error("Invalid location: {0}")]
    InvalidLocation(#[from] url::ParseError),

    /// Content renderer errors
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// Malformed script bridge message
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// Event channel closed
    #[error("Event channel closed")]
    EventChannelClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Create a new renderer error
    pub fn renderer<S: Into<String>>(msg: S) -> Self {
        Error::Renderer(msg.into())
    }

    /// Create a new bridge error
    pub fn bridge<S: Into<String>>(msg: S) -> Self {
        Error::Bridge(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }
}

/// Why a visit's request failed
///
/// Delivered to the session delegate, never returned from the session itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisitFailure {
    /// The renderer could not complete the load
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The load completed but the server reported a failure
    #[error("Request failed with status code {0}")]
    Status(u16),

    /// The content never signalled that it was ready
    #[error("Page load failure")]
    PageLoad,
}

impl VisitFailure {
    /// Status code for status failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            VisitFailure::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<Error> for VisitFailure {
    fn from(err: Error) -> Self {
        VisitFailure::Transport(err.to_string())
    }
}
