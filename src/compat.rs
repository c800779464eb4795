//! Best-effort results for callers that never want an error.
//!
//! The classic RTIR client returned an empty string, an empty list or
//! `false` whenever something went wrong. [`OrEmpty`] gives the same
//! behavior on top of the typed API:
//!
//! ```ignore
//! use rtir_rest::compat::OrEmpty;
//!
//! let owner = client.get_ticket_owner("123").await.or_empty("get_ticket_owner");
//! ```

use crate::error::RtirError;

/// Converts a failed result into the type's empty value.
pub trait OrEmpty<T> {
    /// Returns the value, or `T::default()` after logging the error.
    ///
    /// `NotLoggedIn` is the silent no-op of an unauthenticated client and
    /// is only logged at debug level.
    fn or_empty(self, operation: &str) -> T;
}

impl<T: Default> OrEmpty<T> for Result<T, RtirError> {
    fn or_empty(self, operation: &str) -> T {
        match self {
            Ok(value) => value,
            Err(RtirError::NotLoggedIn) => {
                tracing::debug!(operation = %operation, "Skipped, not logged in");
                T::default()
            }
            Err(e) => {
                tracing::warn!(operation = %operation, error = %e, "Operation failed");
                T::default()
            }
        }
    }
}
