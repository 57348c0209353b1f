use crate::interrupt;

use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};
use crossbeam_utils::sync::Unparker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tag bit set on a link's `next` pointer once the link is logically deleted.
///
/// A marked `next` never changes again, so a compare-and-swap on the `next`
/// of a deleted link always fails.
const MARKED: usize = 1;

/// A thread blocked on a task.
///
/// The node belongs to the waiting thread; the queue holds a second
/// reference through its link. A node is live until it is either woken by a
/// drain or released by its owner. Releasing plays the role of clearing the
/// thread handle: a released node is never unparked again and is unlinked by
/// the next removal pass.
pub(crate) struct WaitNode {
    /// Wakes the thread that created the node.
    unparker: Unparker,

    /// `true` until the node is woken or released.
    live: AtomicBool,
}

impl WaitNode {
    /// Creates a node for the current thread.
    pub(crate) fn current() -> Self {
        Self {
            unparker: interrupt::unparker(),
            live: AtomicBool::new(true),
        }
    }

    /// Marks the node as no longer waiting.
    ///
    /// Returns `true` if this call performed the transition.
    pub(crate) fn release(&self) -> bool {
        self.live.swap(false, Ordering::AcqRel)
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Unparks the owning thread unless the node was already released.
    fn wake(&self) -> bool {
        if self.release() {
            self.unparker.unpark();
            return true;
        }

        false
    }
}

/// One entry of the intrusive stack.
struct Link {
    node: Arc<WaitNode>,
    next: Atomic<Link>,

    /// Set by whichever thread hands the link to the collector.
    retired: AtomicBool,
}

/// Lock-free LIFO of blocked threads.
///
/// - `push` prepends with a compare-and-swap on the head, retrying on
///   contention.
/// - `drain` swaps the head to null in a single step; the winner owns the
///   detached list and wakes every live node in it.
/// - `remove` unlinks released nodes in a single pass and restarts the pass
///   whenever a concurrent update invalidates it.
///
/// Links are reclaimed through `crossbeam-epoch`, so a thread traversing the
/// list never observes freed memory even while other threads unlink or drain.
pub(crate) struct WaitQueue {
    head: Atomic<Link>,
}

impl WaitQueue {
    pub(crate) fn new() -> Self {
        Self {
            head: Atomic::null(),
        }
    }

    /// Pushes `node` on top of the stack.
    pub(crate) fn push(&self, node: Arc<WaitNode>) {
        let guard = &epoch::pin();

        let mut link = Owned::new(Link {
            node,
            next: Atomic::null(),
            retired: AtomicBool::new(false),
        });

        loop {
            let head = self.head.load(Ordering::SeqCst, guard);
            link.next.store(head, Ordering::Relaxed);

            match self
                .head
                .compare_exchange(head, link, Ordering::SeqCst, Ordering::SeqCst, guard)
            {
                Ok(_) => return,
                Err(err) => link = err.new,
            }
        }
    }

    /// Detaches the whole stack and wakes every live node in it.
    ///
    /// Returns the number of threads unparked.
    pub(crate) fn drain(&self) -> usize {
        let guard = &epoch::pin();

        let mut current = self.head.swap(Shared::null(), Ordering::SeqCst, guard);
        let mut woken = 0;

        // Safety: links are only destroyed through deferred destruction, which cannot
        // run while `guard` is pinned.
        while let Some(link) = unsafe { current.as_ref() } {
            if link.node.wake() {
                woken += 1;
            }

            let next = link.next.load(Ordering::Acquire, guard).with_tag(0);

            // Safety: the detached list is unreachable from the head, so no thread
            // pinning after this point can find the link.
            unsafe { retire(current, guard) };

            current = next;
        }

        woken
    }

    /// Releases `node` and unlinks every released node from the stack.
    pub(crate) fn remove(&self, node: &WaitNode) {
        node.release();

        let guard = &epoch::pin();

        'retry: loop {
            let mut pred: Shared<'_, Link> = Shared::null();
            let mut current = self.head.load(Ordering::Acquire, guard);

            // Safety: see `drain`.
            while let Some(link) = unsafe { current.as_ref() } {
                if link.node.is_live() {
                    pred = current;
                    current = link.next.load(Ordering::Acquire, guard).with_tag(0);
                    continue;
                }

                let next = link
                    .next
                    .fetch_or(MARKED, Ordering::AcqRel, guard)
                    .with_tag(0);

                // Safety: see `drain`.
                let unlinked = match unsafe { pred.as_ref() } {
                    Some(pred) => pred
                        .next
                        .compare_exchange(
                            current,
                            next,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                            guard,
                        )
                        .is_ok(),
                    None => self
                        .head
                        .compare_exchange(
                            current,
                            next,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                            guard,
                        )
                        .is_ok(),
                };

                if !unlinked {
                    continue 'retry;
                }

                // Safety: the predecessor was unmarked, so the link is no longer
                // reachable from the head.
                unsafe { retire(current, guard) };

                // Safety: see `drain`.
                if let Some(pred) = unsafe { pred.as_ref() } {
                    if !pred.node.is_live() {
                        continue 'retry;
                    }
                }

                current = next;
            }

            return;
        }
    }
}

impl Drop for WaitQueue {
    fn drop(&mut self) {
        // Safety: `&mut self` rules out concurrent access, and links still in the list
        // have not been handed to the collector.
        unsafe {
            let guard = epoch::unprotected();
            let mut current = self.head.load(Ordering::Relaxed, guard);

            while let Some(link) = current.as_ref() {
                let next = link.next.load(Ordering::Relaxed, guard).with_tag(0);

                if !link.retired.swap(true, Ordering::Relaxed) {
                    drop(current.into_owned());
                }

                current = next;
            }
        }
    }
}

/// Hands `link` to the epoch collector unless another thread already did.
///
/// # Safety
///
/// `link` must be non-null, untagged, and unreachable for threads that pin
/// after this call.
unsafe fn retire(link: Shared<'_, Link>, guard: &Guard) {
    // Safety: guaranteed by the caller.
    let entry = unsafe { link.deref() };

    if !entry.retired.swap(true, Ordering::AcqRel) {
        // Safety: the `retired` flag makes this the only destruction of the link.
        unsafe { guard.defer_destroy(link) };
    }
}
