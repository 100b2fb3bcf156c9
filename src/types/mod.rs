#![forbid(unsafe_code)]
//! Shared error and result types.

use std::io;

use thiserror::Error;

/// Errors produced while encoding, decoding, or persisting a store.
#[derive(Debug, Error)]
pub enum RleError {
    /// Underlying stream or filesystem failure.
    #[error("IO: {0}")]
    Io(#[from] io::Error),
    /// Stream does not start with the expected magic tag.
    #[error("stream is not an RLEARRAY store")]
    BadMagic,
    /// A value carried a type tag this decoder does not know.
    #[error("unknown value tag 0x{0:02X}")]
    UnknownTag(u8),
    /// Stream ended inside a header or run record.
    #[error("stream truncated: {0}")]
    Truncated(&'static str),
    /// Decoded data violates a store invariant.
    #[error("corruption: {0}")]
    Corruption(String),
    /// Caller supplied an unusable argument or setting.
    #[error("invalid argument: {0}")]
    Invalid(String),
    /// A typed store decoded a value of a different kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Kind the store holds.
        expected: &'static str,
        /// Kind found in the stream.
        found: &'static str,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RleError>;

impl RleError {
    /// Maps an early end of stream to [`RleError::Truncated`], passing other
    /// I/O errors through unchanged.
    pub(crate) fn from_read(err: io::Error, context: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            RleError::Truncated(context)
        } else {
            RleError::Io(err)
        }
    }

    /// Returns true for errors caused by malformed input rather than I/O.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            RleError::BadMagic
                | RleError::UnknownTag(_)
                | RleError::Truncated(_)
                | RleError::Corruption(_)
                | RleError::TypeMismatch { .. }
        )
    }
}
