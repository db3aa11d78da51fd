//! MID-to-callback correlation for in-flight operations
//!
//! The protocol client hands back a MID only after it has started an
//! operation, while the completion for that MID is delivered from its
//! network task. Completion can therefore arrive before the operation is
//! established. [`OperationManager`] accepts both orderings: a completion for
//! an unknown MID is remembered, and the later `establish_operation` for that
//! MID resolves immediately.
//!
//! All bookkeeping happens under one lock. Callbacks are collected while the
//! lock is held and invoked only after it has been released, so a callback
//! may call back into the manager.

use crate::callback::{invoke, FatalError, OperationCallback, Resolution};
use crate::types::Mid;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Default)]
struct OperationTable {
    /// Callbacks of operations established but not yet completed
    pending: HashMap<Mid, Option<OperationCallback>>,
    /// Completions observed before their operation was established
    unknown_completions: HashSet<Mid>,
}

/// Tracks in-flight operations by MID and resolves their callbacks
///
/// # Examples
///
/// ```
/// use mqtt_transport::callback::operation_callback;
/// use mqtt_transport::OperationManager;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let manager = OperationManager::new();
/// let done = Arc::new(AtomicBool::new(false));
/// let done_clone = Arc::clone(&done);
///
/// // Completion arrives before the MID was handed back
/// manager.complete_operation(42).unwrap();
/// manager
///     .establish_operation(
///         42,
///         Some(operation_callback(move |_| {
///             done_clone.store(true, Ordering::SeqCst);
///             Ok(())
///         })),
///     )
///     .unwrap();
///
/// assert!(done.load(Ordering::SeqCst));
/// assert_eq!(manager.pending_count(), 0);
/// ```
pub struct OperationManager {
    table: Mutex<OperationTable>,
}

impl OperationManager {
    /// Creates a manager with no tracked operations
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Mutex::new(OperationTable::default()),
        }
    }

    /// Starts tracking the operation identified by `mid`
    ///
    /// If a completion for `mid` was already observed, the operation is
    /// resolved on the spot and `callback` is invoked before returning.
    /// Establishing a MID that is still pending replaces the previous
    /// callback, which is dropped without being called.
    ///
    /// # Errors
    ///
    /// Returns the [`FatalError`] raised by the callback, if any.
    pub fn establish_operation(
        &self,
        mid: Mid,
        callback: Option<OperationCallback>,
    ) -> Result<(), FatalError> {
        let (resolved, displaced) = {
            let mut table = self.table.lock();
            if table.unknown_completions.remove(&mid) {
                (Some(callback), None)
            } else {
                (None, table.pending.insert(mid, callback))
            }
        };

        if displaced.is_some() {
            tracing::warn!(mid, "Operation established while already pending, replacing callback");
        }
        drop(displaced);

        match resolved {
            Some(callback) => {
                tracing::trace!(mid, "Resolved operation from earlier completion");
                match callback {
                    Some(callback) => invoke(callback, mid, Resolution::Completed),
                    None => Ok(()),
                }
            }
            None => {
                tracing::debug!(mid, "Operation pending");
                Ok(())
            }
        }
    }

    /// Records completion of the operation identified by `mid`
    ///
    /// Invokes the operation's callback when it is pending. Otherwise the
    /// completion is remembered until the matching `establish_operation`.
    ///
    /// # Errors
    ///
    /// Returns the [`FatalError`] raised by the callback, if any.
    pub fn complete_operation(&self, mid: Mid) -> Result<(), FatalError> {
        let callback = {
            let mut table = self.table.lock();
            match table.pending.remove(&mid) {
                Some(callback) => callback,
                None => {
                    table.unknown_completions.insert(mid);
                    tracing::trace!(mid, "Completion for unknown operation, deferring");
                    return Ok(());
                }
            }
        };

        tracing::debug!(mid, "Operation completed");
        match callback {
            Some(callback) => invoke(callback, mid, Resolution::Completed),
            None => Ok(()),
        }
    }

    /// Cancels every pending operation and forgets all early completions
    ///
    /// Each pending callback is invoked once with [`Resolution::Cancelled`],
    /// in no particular order.
    ///
    /// # Errors
    ///
    /// Returns the first [`FatalError`] raised by a callback. The remaining
    /// callbacks are still invoked before returning, and any fatal errors
    /// they raise are logged and dropped.
    pub fn cancel_all_operations(&self) -> Result<(), FatalError> {
        let cancelled = {
            let mut table = self.table.lock();
            table.unknown_completions.clear();
            std::mem::take(&mut table.pending)
        };

        tracing::debug!(count = cancelled.len(), "Cancelling pending operations");

        let mut first_fatal = None;
        for (mid, callback) in cancelled {
            let Some(callback) = callback else {
                continue;
            };
            if let Err(e) = invoke(callback, mid, Resolution::Cancelled) {
                if first_fatal.is_some() {
                    tracing::warn!(
                        mid,
                        error = %e,
                        "Dropping fatal error from cancelled callback"
                    );
                } else {
                    first_fatal = Some(e);
                }
            }
        }

        match first_fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Returns the number of operations awaiting completion
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.table.lock().pending.len()
    }

    /// Returns the number of completions awaiting their operation
    #[must_use]
    pub fn unknown_completion_count(&self) -> usize {
        self.table.lock().unknown_completions.len()
    }

    /// Returns whether `mid` has an operation awaiting completion
    #[must_use]
    pub fn is_pending(&self, mid: Mid) -> bool {
        self.table.lock().pending.contains_key(&mid)
    }

    /// Returns whether a completion for `mid` arrived before its operation
    #[must_use]
    pub fn has_unknown_completion(&self, mid: Mid) -> bool {
        self.table.lock().unknown_completions.contains(&mid)
    }

    #[cfg(test)]
    fn is_locked(&self) -> bool {
        self.table.is_locked()
    }
}

impl Default for OperationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.lock();
        f.debug_struct("OperationManager")
            .field("pending", &table.pending.len())
            .field("unknown_completions", &table.unknown_completions.len())
            .finish()
    }
}
