//! Event FIFO — bounded queue between input producers and the host.
//!
//! A fixed-size ring buffer that collects key events from the scanner
//! (producer, interrupt priority) until the host drains them through the
//! register interface (consumer, task priority).
//!
//! Nothing here blocks waiting for space or data: [`Fifo::enqueue`] fails
//! fast on a full buffer, [`Fifo::enqueue_force`] evicts the oldest entry,
//! and [`Fifo::dequeue`] hands back the sentinel when empty.
//!
//! Every operation runs inside a critical section, so a producer interrupt
//! can never find the ring half-updated by the consumer it preempted.

use bridge_hal::keyboard::{KeyEvent, KeyState};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::KEY_FIFO_SIZE;

struct Ring<T, const N: usize> {
    buf: [T; N],
    read: usize,
    write: usize,
    count: usize,
}

impl<T: Copy, const N: usize> Ring<T, N> {
    fn is_full(&self) -> bool {
        self.count >= N
    }

    /// Store at the write cursor and advance it. Caller checks capacity.
    fn put(&mut self, item: T) {
        self.buf[self.write] = item;
        self.write = (self.write + 1) % N;
    }
}

/// Bounded FIFO of `N` copyable events.
pub struct Fifo<T, const N: usize> {
    ring: Mutex<CriticalSectionRawMutex, RefCell<Ring<T, N>>>,
    /// Returned by `dequeue` on an empty queue.
    sentinel: T,
}

impl<T: Copy, const N: usize> Fifo<T, N> {
    const NONZERO_CAPACITY: () = assert!(N > 0, "FIFO capacity must be non-zero");

    /// Create an empty FIFO. `sentinel` also fills the unused slots.
    pub const fn with_sentinel(sentinel: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NONZERO_CAPACITY;
        Self {
            ring: Mutex::new(RefCell::new(Ring {
                buf: [sentinel; N],
                read: 0,
                write: 0,
                count: 0,
            })),
            sentinel,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued events.
    pub fn count(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().count)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Discard everything.
    pub fn flush(&self) {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            ring.read = 0;
            ring.write = 0;
            ring.count = 0;
        })
    }

    /// Append an event.
    ///
    /// Returns `false` and leaves the queue untouched if it is full.
    pub fn enqueue(&self, item: T) -> bool {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            if ring.is_full() {
                return false;
            }
            ring.put(item);
            ring.count += 1;
            true
        })
    }

    /// Append an event, evicting the oldest one if the queue is full.
    pub fn enqueue_force(&self, item: T) {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            ring.put(item);
            if ring.is_full() {
                // Still full: the slot just written was the oldest entry.
                ring.read = (ring.read + 1) % N;
            } else {
                ring.count += 1;
            }
        })
    }

    /// Remove the oldest event, or return the sentinel if empty.
    pub fn dequeue(&self) -> T {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            if ring.count == 0 {
                return self.sentinel;
            }
            let item = ring.buf[ring.read];
            ring.read = (ring.read + 1) % N;
            ring.count -= 1;
            item
        })
    }
}

impl<T: Copy + Default, const N: usize> Default for Fifo<T, N> {
    fn default() -> Self {
        Self::with_sentinel(T::default())
    }
}

/// The key event queue drained by the host.
pub type KeyFifo = Fifo<KeyEvent, KEY_FIFO_SIZE>;

/// Empty-slot value of the key queue: key 0, idle.
pub const EMPTY_KEY: KeyEvent = KeyEvent::new(0, KeyState::Idle);

impl<const N: usize> Fifo<KeyEvent, N> {
    /// Empty key queue, usable in a `static`.
    pub const fn new() -> Self {
        Self::with_sentinel(EMPTY_KEY)
    }
}
