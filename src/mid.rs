//! MID allocation for protocol clients

use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::types::Mid;

/// Hands out MIDs to outbound operations and takes them back once the
/// broker acknowledged them
///
/// The lowest free MID is always handed out first, so a MID is reused as
/// soon as its operation has been released. Only in-flight MIDs are
/// guaranteed to be unique. MID 0 is never allocated.
#[derive(Debug, Default)]
pub struct MidAllocator {
    state: Mutex<AllocatorState>,
}

#[derive(Debug, Default)]
struct AllocatorState {
    /// Every MID in `1..=high_water` is in flight unless it is in `released`
    high_water: Mid,
    released: BTreeSet<Mid>,
}

impl AllocatorState {
    fn is_in_flight(&self, mid: Mid) -> bool {
        mid != 0 && mid <= self.high_water && !self.released.contains(&mid)
    }
}

impl MidAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the lowest MID that is not in flight
    ///
    /// Returns `None` when all 65535 MIDs are in flight.
    pub fn allocate(&self) -> Option<Mid> {
        let mut state = self.state.lock();
        if let Some(mid) = state.released.pop_first() {
            return Some(mid);
        }
        if state.high_water == Mid::MAX {
            return None;
        }
        state.high_water += 1;
        Some(state.high_water)
    }

    /// Returns `mid` to the pool
    ///
    /// Returns `false` if `mid` was not in flight.
    pub fn release(&self, mid: Mid) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if !state.is_in_flight(mid) {
            return false;
        }
        if mid == state.high_water {
            state.high_water -= 1;
            // Fold released MIDs at the top back below the high-water mark
            while state.high_water > 0 && state.released.remove(&state.high_water) {
                state.high_water -= 1;
            }
        } else {
            state.released.insert(mid);
        }
        true
    }

    #[must_use]
    pub fn is_in_flight(&self, mid: Mid) -> bool {
        self.state.lock().is_in_flight(mid)
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        let state = self.state.lock();
        usize::from(state.high_water) - state.released.len()
    }
}
