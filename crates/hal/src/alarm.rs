//! One-shot alarms.
//!
//! The firmware never busy-waits for a pulse to end. Instead it asks an
//! [`AlarmScheduler`] to call back after a delay, and may cancel that
//! callback before it fires.
//!
//! [`TickAlarms`] is the software implementation: a small table of
//! deadlines plus a monotonically increasing microsecond counter that the
//! timer interrupt (or a test) moves forward with [`TickAlarms::advance`].

use core::cell::RefCell;
use core::num::NonZeroU32;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Handle of a scheduled alarm. Never zero, never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmId(NonZeroU32);

impl AlarmId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// A deferred-action scheduler with at-most-once firing per handle.
pub trait AlarmScheduler {
    /// Schedule a one-shot alarm `delay_us` microseconds from now.
    ///
    /// A zero delay is legal: the alarm fires on the next expiry pass.
    /// Returns `None` when no alarm slot is free.
    fn schedule_in_us(&self, delay_us: u64) -> Option<AlarmId>;

    /// Cancel a pending alarm.
    ///
    /// Returns `true` if the alarm was still pending and is now guaranteed
    /// not to fire, `false` if it already fired (or never existed).
    fn cancel(&self, id: AlarmId) -> bool;
}

// ── Software alarm table ──────────────────────────────────────────

#[derive(Clone, Copy)]
struct Slot {
    id: AlarmId,
    deadline_us: u64,
}

struct AlarmTable<const N: usize> {
    slots: [Option<Slot>; N],
    now_us: u64,
    next_id: u32,
}

impl<const N: usize> AlarmTable<N> {
    const fn new() -> Self {
        Self {
            slots: [None; N],
            now_us: 0,
            next_id: 1,
        }
    }

    fn alloc_id(&mut self) -> Option<AlarmId> {
        let raw = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        NonZeroU32::new(raw).map(AlarmId)
    }

    /// Remove and return the earliest alarm due at or before `limit_us`.
    fn take_due(&mut self, limit_us: u64) -> Option<Slot> {
        let (index, _) = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s.deadline_us)))
            .filter(|&(_, deadline)| deadline <= limit_us)
            .min_by_key(|&(_, deadline)| deadline)?;
        self.slots[index].take()
    }
}

/// Tick-driven one-shot alarm table with room for `N` pending alarms.
pub struct TickAlarms<const N: usize> {
    table: Mutex<CriticalSectionRawMutex, RefCell<AlarmTable<N>>>,
}

impl<const N: usize> TickAlarms<N> {
    pub const fn new() -> Self {
        Self {
            table: Mutex::new(RefCell::new(AlarmTable::new())),
        }
    }

    /// Current time in microseconds since the table was created.
    pub fn now_us(&self) -> u64 {
        self.table.lock(|table| table.borrow().now_us)
    }

    /// Number of alarms still waiting to fire.
    pub fn pending(&self) -> usize {
        self.table.lock(|table| table.borrow().slots.iter().flatten().count())
    }

    /// Absolute deadline of a pending alarm.
    pub fn deadline_us(&self, id: AlarmId) -> Option<u64> {
        self.table.lock(|table| {
            table
                .borrow()
                .slots
                .iter()
                .flatten()
                .find(|s| s.id == id)
                .map(|s| s.deadline_us)
        })
    }

    /// Move time forward by `elapsed_us` and fire every alarm that comes due,
    /// earliest deadline first.
    ///
    /// Each alarm is removed from the table before `fire` runs, and `fire`
    /// runs outside the table's critical section, so it may schedule or
    /// cancel.
    pub fn advance(&self, elapsed_us: u64, mut fire: impl FnMut(AlarmId)) {
        let target = self.now_us().saturating_add(elapsed_us);
        loop {
            let due = self.table.lock(|table| {
                let mut table = table.borrow_mut();
                match table.take_due(target) {
                    Some(slot) => {
                        table.now_us = table.now_us.max(slot.deadline_us);
                        Some(slot)
                    }
                    None => {
                        table.now_us = target;
                        None
                    }
                }
            });
            match due {
                Some(slot) => fire(slot.id),
                None => return,
            }
        }
    }
}

impl<const N: usize> Default for TickAlarms<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AlarmScheduler for TickAlarms<N> {
    fn schedule_in_us(&self, delay_us: u64) -> Option<AlarmId> {
        self.table.lock(|table| {
            let mut table = table.borrow_mut();
            let free = table.slots.iter().position(Option::is_none)?;
            let id = table.alloc_id()?;
            let deadline_us = table.now_us.saturating_add(delay_us);
            table.slots[free] = Some(Slot { id, deadline_us });
            Some(id)
        })
    }

    fn cancel(&self, id: AlarmId) -> bool {
        self.table.lock(|table| {
            let mut table = table.borrow_mut();
            match table.slots.iter_mut().find(|s| matches!(s, Some(s) if s.id == id)) {
                Some(slot) => {
                    *slot = None;
                    true
                }
                None => false,
            }
        })
    }
}
