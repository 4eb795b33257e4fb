//! Public error type returned from [`crate::driver::compile`].
//!
//! Internal constructors throughout the crate (builders, newtypes, grid
//! length parsing) validate eagerly and return `anyhow::Result`; the driver
//! is the single place that classifies a failure by the site it came from
//! and downgrades it into one of these variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("bad geometry: {0}")]
    BadGeometry(String),
    #[error("bad grid length: {0}")]
    BadGridLength(String),
    #[error("internal invariant violated: {0}")]
    OutOfRange(String),
}

/// Typed cause for a `duration`/`margin`-style geometry check (spec §7:
/// NaN width/plateau/duration/margin, `min_duration > max_duration`).
/// Constructed by `ElementCommonBuilder::validate` and `Play`'s width/
/// plateau checks, and unwrapped by [`Error::from_anyhow`] into
/// [`Error::BadGeometry`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GeometryError(pub String);

/// Typed cause for a malformed `GridLength` (spec §7: unparsable grid-length
/// string, or a numerically invalid fixed/star value). Unwrapped by
/// [`Error::from_anyhow`] into [`Error::BadGridLength`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GridLengthError(pub String);

impl Error {
    /// Downgrades an `anyhow::Error` bubbling up from construction,
    /// layout, or sampling into a typed variant, classified by the typed
    /// cause the error chain carries: a handful of call sites that detect
    /// an internal invariant break construct `Self::OutOfRange` directly
    /// and it round-trips here via downcast; `GeometryError`/
    /// `GridLengthError` causes from the `schedule` builders become
    /// `BadGeometry`/`BadGridLength`; everything else reaching this
    /// boundary is a consequence of a malformed request (bad channel/shape
    /// id reference) and is classified as `InvalidRequest`.
    #[must_use]
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let err = match err.downcast::<Self>() {
            Ok(typed) => return typed,
            Err(err) => err,
        };
        let err = match err.downcast::<GeometryError>() {
            Ok(GeometryError(msg)) => return Self::BadGeometry(msg),
            Err(err) => err,
        };
        match err.downcast::<GridLengthError>() {
            Ok(GridLengthError(msg)) => Self::BadGridLength(msg),
            Err(err) => Self::InvalidRequest(err.to_string()),
        }
    }
}
