//! Activity Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use crate::models::{CardTypeId, TagId};
use derive_more::{Display, Error};

/// An activity error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for activity operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A serialized criterion could not be read back (or written out).
    /// The criterion it was meant for is left unchanged.
    #[display("invalid criterion data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    #[display("tag already exists: {_0}")]
    DuplicateTag(#[error(not(source))] TagId),
    #[display("tag not found: {_0}")]
    TagNotFound(#[error(not(source))] TagId),
    #[display("card type already exists: {_0}")]
    DuplicateCardType(#[error(not(source))] CardTypeId),
    #[display("card type not found: {_0}")]
    CardTypeNotFound(#[error(not(source))] CardTypeId),
    /// Reading or writing a stored criterion failed.
    #[display("record store error")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }
}
