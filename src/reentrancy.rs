//! Debug-only reentrancy guard.
//!
//! A table's lock is not reentrant: a callback that calls back into the same
//! table from inside a critical section would deadlock. In debug builds each
//! table carries a unique id and every thread keeps the ids of the tables it
//! is currently inside; entering one twice panics instead of hanging. In
//! release builds this compiles to a zero-cost no-op.

use core::marker::PhantomData;

#[cfg(debug_assertions)]
use core::sync::atomic::{AtomicU64, Ordering};
#[cfg(debug_assertions)]
use std::cell::RefCell;

#[cfg(debug_assertions)]
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[cfg(debug_assertions)]
thread_local! {
    static HELD: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Per-table reentrancy tracker. Embed this in a table and guard public
/// entry-points with `let _g = self.reentrancy.enter();` before taking the
/// lock.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    id: u64,
}

impl DebugReentrancy {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Enter a guarded section. In debug builds, panics if the current thread
    /// is already inside a section of the same table.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let id = self.id;
            HELD.with(|held| {
                let mut held = held.borrow_mut();
                assert!(
                    !held.contains(&id),
                    "reentrancy detected: nested entry into a locked table"
                );
                held.push(id);
            });
            ReentrancyGuard {
                id,
                _pd: PhantomData,
            }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _pd: PhantomData }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by `DebugReentrancy::enter`. Tied to the entering
/// thread, so it is neither `Send` nor `Sync`.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    id: u64,
    _pd: PhantomData<(&'a (), *const ())>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let id = self.id;
            // try_with: the thread-local may already be gone during thread teardown.
            let _ = HELD.try_with(|held| {
                let mut held = held.borrow_mut();
                if let Some(pos) = held.iter().rposition(|&h| h == id) {
                    held.swap_remove(pos);
                }
            });
        }
    }
}
