use crate::interrupt::Interrupter;

use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Lock-free slot naming the thread that executes a task's computation.
///
/// The slot stores a pointer obtained from [`Arc::into_raw`] and owns that
/// strong reference. Ownership leaves the slot only through an atomic swap,
/// so whichever of the runner (clearing) or a canceller (targeting an
/// interrupt) empties the slot first is the single owner of the reference.
pub(crate) struct RunnerSlot {
    ptr: AtomicPtr<Interrupter>,
}

impl RunnerSlot {
    pub(crate) const fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Attaches `runner` if the slot is empty.
    ///
    /// Returns `false` when another thread already claimed the slot.
    pub(crate) fn claim(&self, runner: Arc<Interrupter>) -> bool {
        let raw = Arc::into_raw(runner) as *mut Interrupter;

        match self
            .ptr
            .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(_) => {
                // Safety: `raw` came from `Arc::into_raw` above and was never published.
                drop(unsafe { Arc::from_raw(raw) });
                false
            }
        }
    }

    /// Empties the slot, returning the runner if one was attached.
    pub(crate) fn take(&self) -> Option<Arc<Interrupter>> {
        let raw = self.ptr.swap(ptr::null_mut(), Ordering::AcqRel);

        if raw.is_null() {
            return None;
        }

        // Safety: a non-null value was stored by `claim` from `Arc::into_raw`, and the
        // swap hands its strong reference to this caller alone.
        Some(unsafe { Arc::from_raw(raw) })
    }
}

impl Drop for RunnerSlot {
    fn drop(&mut self) {
        drop(self.take());
    }
}
