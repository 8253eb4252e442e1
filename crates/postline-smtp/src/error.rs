//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error while writing to or reading from an established stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The transport could not be opened.
    #[error("Could not connect to {host}:{port}: {source}")]
    Connect {
        /// Host that was dialled.
        host: String,
        /// Port that was dialled.
        port: u16,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The transport did not open within the connect timeout.
    #[error("Timed out connecting to {host}:{port} after {timeout:?}")]
    ConnectTimeout {
        /// Host that was dialled.
        host: String,
        /// Port that was dialled.
        port: u16,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// Server reply was not of the class the current step requires.
    #[error("SMTP error {code}: {message}")]
    Reply {
        /// Reply code (e.g., 550).
        code: u16,
        /// Message text from the final reply line.
        message: String,
    },

    /// Server sent a line that does not follow the reply grammar.
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// Stream reached end of file while a reply was expected.
    #[error("Connection closed while waiting for a reply")]
    ConnectionClosed,

    /// No complete reply arrived within the I/O timeout.
    #[error("No reply within {0:?}")]
    ReadTimeout(Duration),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Invalid state for operation.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),
}

impl Error {
    /// Creates a reply error from a reply code and message.
    #[must_use]
    pub fn reply(code: u16, message: impl Into<String>) -> Self {
        Self::Reply {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Reply { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Reply { code, .. } if *code >= 400 && *code < 500)
    }

    /// Returns true if the transport failed before or while reading a reply.
    #[must_use]
    pub const fn is_transport_read(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed | Self::ReadTimeout(_) | Self::MalformedReply(_) | Self::Io(_)
        )
    }
}
