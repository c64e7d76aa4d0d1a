//! Leaf value types for fieldwork.
//!
//! This crate defines the scalar types the field adaptation engine needs
//! but that carry no schema knowledge of their own:
//! - [`Timestamp`]: a timezone-aware UTC instant with ISO-8601 and epoch forms
//! - [`ByteString`]: an owned byte sequence with a canonical base64 text form
//!
//! Everything that knows about fields, kinds and entities lives in
//! `fieldwork-model`.

mod bytes;
mod timestamp;

pub use bytes::ByteString;
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid byte encoding: {0}")]
    InvalidBytes(String),
}
