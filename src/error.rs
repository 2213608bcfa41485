//! The error taxonomy (spec §7).
//!
//! One `ApplyError` enum with string payloads, plus the `ApplyResult<T>`
//! alias. All errors are synchronous, none are retried, and every one aborts
//! the apply call before any caller-visible query change is produced.

use thiserror::Error;

/// Every way an apply (or spec-parsing) call can fail.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// A filter specification was malformed or referenced something invalid.
    #[error("bad filter format: {0}")]
    BadFilterFormat(String),

    /// A field reference could not be resolved against the schema.
    #[error("field resolution error: {0}")]
    FieldResolution(String),

    /// A join required by the spec could not be planned automatically.
    #[error("auto-join error: {0}")]
    AutoJoin(String),

    /// A sort specification was malformed.
    #[error("bad sort format: {0}")]
    BadSortFormat(String),

    /// A pagination specification was malformed or out of range.
    #[error("bad pagination: {0}")]
    BadPagination(String),

    /// The spec asked for something the engine does not support.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
}

/// Convenience alias for results carrying an [`ApplyError`].
pub type ApplyResult<T> = Result<T, ApplyError>;
