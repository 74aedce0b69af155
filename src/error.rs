/// Error taxonomy for serial transactions.
///
/// Overflow is deliberately absent: eviction of the oldest buffered bytes is
/// recorded as degraded data on the accumulator, never raised.

use thiserror::Error;

/// Failure of a transaction, generic over the transport's own error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error<E> {
    /// The byte source reported a read or write failure.
    #[error("transport error: {0:?}")]
    Transport(E),

    /// The remote end answered with its declared error token.
    #[error("device reported an error")]
    Protocol,

    /// Neither the expected nor the error token arrived within the poll budget.
    #[error("no response after {polls} polls")]
    Timeout { polls: u32 },

    /// The composed command line does not fit the send buffer.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A sentence field could not be extracted.
    #[error("sentence field error: {0}")]
    Field(#[from] FieldError),
}

impl<E> Error<E> {
    /// True for failures a caller may reasonably retry (timeouts only).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

/// A command line longer than the send buffer.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("command line of {len} bytes exceeds limit of {max}")]
pub struct FormatError {
    pub len: usize,
    pub max: usize,
}

/// Failure to extract a positional field from a sentence.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FieldError {
    /// The sentence tag does not occur in the text.
    #[error("sentence tag not found")]
    NotFound,

    /// The sentence ended before the requested field.
    #[error("field absent from sentence")]
    FieldAbsent,

    /// Fields are numbered from 1.
    #[error("field index must be at least 1")]
    InvalidIndex,

    /// Caller-supplied storage cannot hold the field.
    #[error("field needs {needed} bytes of storage")]
    BufferTooSmall { needed: usize },
}

/// Failure to load a [`LinkConfig`](crate::config::LinkConfig).
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("malformed config JSON")]
    Json,

    #[error("poll budget must allow at least one poll")]
    InvalidPollBudget,
}
