//! Error types for the document writer.
//!
//! Protocol misuse, bad options, and sink failures each get their own
//! variant so callers can tell a caller bug from an environment problem.

use crate::geometry::Rect;

/// Result type alias for writer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while writing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested output format is not in the registry
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// An option key or value is malformed for the chosen backend
    #[error("Invalid option '{key}': {reason}")]
    InvalidOption {
        /// The offending option key
        key: String,
        /// Why the key or value was rejected
        reason: String,
    },

    /// A media box with zero or negative extent, or non-finite coordinates
    #[error("Invalid media box: {0}")]
    InvalidGeometry(Rect),

    /// Writer protocol misuse (begin/end/close out of order) - always a
    /// caller bug, never retried
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Sink-level IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend failure while serializing a page
    #[error("{format} encoding error: {reason}")]
    Encode {
        /// Short name of the backend that failed
        format: &'static str,
        /// What went wrong
        reason: String,
    },
}

impl Error {
    /// Shorthand for an [`Error::IllegalState`] with the given message.
    pub(crate) fn illegal(msg: impl Into<String>) -> Self {
        Error::IllegalState(msg.into())
    }

    /// Shorthand for an [`Error::Encode`] in the given backend.
    pub(crate) fn encode(format: &'static str, reason: impl Into<String>) -> Self {
        Error::Encode {
            format,
            reason: reason.into(),
        }
    }
}
