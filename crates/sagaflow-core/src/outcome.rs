//! Two-variant outcome type reported by steps and workflows.

use serde::{Deserialize, Serialize};

/// Outcome of a step or a workflow run.
///
/// Exactly one variant is populated. Branch on [`Outcome::is_ok`] /
/// [`Outcome::is_err`] or match on the variant, never on the contents of the
/// payload: an error value may legitimately be "empty".
///
/// Serializes as an internally tagged object so persistence adapters can
/// store it as-is:
///
/// ```
/// use sagaflow_core::Outcome;
///
/// let ok: Outcome<u32, String> = Outcome::success(7);
/// assert!(ok.is_ok());
/// assert!(!ok.is_err());
///
/// let failed: Outcome<u32, String> = Outcome::error(String::new());
/// assert!(failed.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome<T, E> {
    /// The work completed and produced `data`.
    Success {
        /// Value produced by the work.
        data: T,
    },
    /// The work failed with `error`.
    Error {
        /// The original error value.
        error: E,
    },
}

impl<T, E> Outcome<T, E> {
    /// Creates a success outcome.
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    /// Creates an error outcome.
    pub fn error(error: E) -> Self {
        Self::Error { error }
    }

    /// Returns `true` for [`Outcome::Success`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns `true` for [`Outcome::Error`].
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Returns the success payload, discarding an error.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Error { .. } => None,
        }
    }

    /// Returns the error payload, discarding a success.
    pub fn err(self) -> Option<E> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error } => Some(error),
        }
    }

    /// Borrows the payload of whichever variant is populated.
    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Self::Success { data } => Outcome::Success { data },
            Self::Error { error } => Outcome::Error { error },
        }
    }

    /// Maps the success payload.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U, E> {
        match self {
            Self::Success { data } => Outcome::Success { data: f(data) },
            Self::Error { error } => Outcome::Error { error },
        }
    }

    /// Maps the error payload.
    pub fn map_err<F2, F: FnOnce(E) -> F2>(self, f: F) -> Outcome<T, F2> {
        match self {
            Self::Success { data } => Outcome::Success { data },
            Self::Error { error } => Outcome::Error { error: f(error) },
        }
    }

    /// Converts into a standard [`Result`] so callers can use `?`.
    pub fn into_result(self) -> Result<T, E> {
        self.into()
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Success { data },
            Err(error) => Self::Error { error },
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        match outcome {
            Outcome::Success { data } => Ok(data),
            Outcome::Error { error } => Err(error),
        }
    }
}

/// Shorthand for [`Outcome::success`].
pub fn success_result<T, E>(data: T) -> Outcome<T, E> {
    Outcome::success(data)
}

/// Shorthand for [`Outcome::error`].
pub fn error_result<T, E>(error: E) -> Outcome<T, E> {
    Outcome::error(error)
}
