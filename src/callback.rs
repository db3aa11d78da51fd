//! Operation callbacks and the errors they may raise
//!
//! Every outbound operation can carry one [`OperationCallback`]. It is called
//! exactly once: with [`Resolution::Completed`] when the protocol client
//! reports the operation done, or with [`Resolution::Cancelled`] when the
//! operation is dropped in bulk (for example on disconnect).
//!
//! Callbacks report failures through [`CallbackError`]:
//! - [`CallbackError::Recoverable`] is logged and swallowed by whoever ran the
//!   callback.
//! - [`CallbackError::Fatal`] always propagates to the caller that triggered
//!   the callback.

use crate::types::Mid;
use thiserror::Error;

/// Boxed error accepted by [`CallbackError::recoverable`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result returned by operation callbacks and event handlers
pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Type alias for operation callback functions
pub type OperationCallback = Box<dyn FnOnce(Resolution) -> CallbackResult + Send + 'static>;

/// How a tracked operation was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// The protocol client reported completion
    #[default]
    Completed,
    /// The operation was cancelled before completion was observed
    Cancelled,
}

impl Resolution {
    /// Returns `true` if the operation was cancelled rather than acknowledged
    #[must_use]
    pub fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error that must never be swallowed
///
/// Used for conditions such as shutdown of the surrounding task, where
/// carrying on after the callback would be wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fatal callback error: {reason}")]
pub struct FatalError {
    reason: String,
}

impl FatalError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Error raised from inside a callback or event handler
#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("recoverable callback error: {0}")]
    Recoverable(#[source] BoxError),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl CallbackError {
    /// Wraps any error as recoverable
    pub fn recoverable(err: impl Into<BoxError>) -> Self {
        Self::Recoverable(err.into())
    }

    /// Creates a fatal error with the given reason
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal(FatalError::new(reason))
    }
}

/// Boxes a closure as an [`OperationCallback`]
///
/// # Examples
///
/// ```
/// use mqtt_transport::callback::{operation_callback, Resolution};
///
/// let cb = operation_callback(|resolution: Resolution| {
///     assert!(!resolution.is_cancelled());
///     Ok(())
/// });
/// cb(Resolution::Completed).unwrap();
/// ```
pub fn operation_callback<F>(f: F) -> OperationCallback
where
    F: FnOnce(Resolution) -> CallbackResult + Send + 'static,
{
    Box::new(f)
}

/// Runs an operation callback, swallowing recoverable errors
pub(crate) fn invoke(
    callback: OperationCallback,
    mid: Mid,
    resolution: Resolution,
) -> Result<(), FatalError> {
    tracing::trace!(mid, ?resolution, "Invoking operation callback");
    contain(callback(resolution), "operation callback")
}

/// Applies the recoverable/fatal policy to a callback or handler result
pub(crate) fn contain(result: CallbackResult, source: &'static str) -> Result<(), FatalError> {
    match result {
        Ok(()) => Ok(()),
        Err(CallbackError::Recoverable(e)) => {
            tracing::warn!(source, error = %e, "Recovered from error raised in callback");
            Ok(())
        }
        Err(CallbackError::Fatal(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_resolution_flag() {
        assert!(!Resolution::Completed.is_cancelled());
        assert!(Resolution::Cancelled.is_cancelled());
        assert_eq!(Resolution::default(), Resolution::Completed);
    }

    #[test]
    fn test_invoke_passes_resolution() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let cb = operation_callback(move |resolution| {
            *seen_clone.lock() = Some(resolution);
            Ok(())
        });

        invoke(cb, 7, Resolution::Cancelled).unwrap();
        assert_eq!(*seen.lock(), Some(Resolution::Cancelled));
    }

    #[test]
    fn test_recoverable_is_swallowed() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);
        let cb = operation_callback(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Err(CallbackError::recoverable("boom"))
        });

        assert!(invoke(cb, 1, Resolution::Completed).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fatal_propagates_unchanged() {
        let cb = operation_callback(|_| Err(CallbackError::fatal("process exiting")));

        let err = invoke(cb, 1, Resolution::Completed).unwrap_err();
        assert_eq!(err, FatalError::new("process exiting"));
        assert_eq!(err.reason(), "process exiting");
    }

    #[test]
    fn test_recoverable_source_is_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = CallbackError::recoverable(io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("disk gone"));
    }
}
