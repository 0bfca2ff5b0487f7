//! The uniform outcome wrapper for RPC operations.

use crate::error::NearError;

/// Outcome of an RPC operation as seen by observers.
///
/// A request starts as `Loading` and resolves to exactly one of `Success`
/// or `Error`; it never moves between the two resolved variants.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum NearResult<T> {
    /// The request is in flight (or nothing has completed yet).
    #[default]
    Loading,
    /// The request completed with data.
    Success(T),
    /// The request failed with a classified error.
    Error(NearError),
}

impl<T> NearResult<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, NearResult::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, NearResult::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NearResult::Error(_))
    }

    /// Borrow the data, if this is a success.
    pub fn as_ok(&self) -> Option<&T> {
        match self {
            NearResult::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Take the data, if this is a success.
    pub fn ok(self) -> Option<T> {
        match self {
            NearResult::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Borrow the error, if this is a failure.
    pub fn error(&self) -> Option<&NearError> {
        match self {
            NearResult::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Map the success value, leaving `Loading` and `Error` untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> NearResult<U> {
        match self {
            NearResult::Loading => NearResult::Loading,
            NearResult::Success(data) => NearResult::Success(f(data)),
            NearResult::Error(error) => NearResult::Error(error),
        }
    }

    /// Convert a resolved outcome into a `Result`.
    ///
    /// Returns `None` while still loading.
    pub fn into_result(self) -> Option<Result<T, NearError>> {
        match self {
            NearResult::Loading => None,
            NearResult::Success(data) => Some(Ok(data)),
            NearResult::Error(error) => Some(Err(error)),
        }
    }
}

impl<T> From<Result<T, NearError>> for NearResult<T> {
    fn from(result: Result<T, NearError>) -> Self {
        match result {
            Ok(data) => NearResult::Success(data),
            Err(error) => NearResult::Error(error),
        }
    }
}
