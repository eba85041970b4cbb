//! Bounded callback registration lists.
//!
//! Each input producer keeps one list per event type. Handlers are stored
//! as borrowed trait objects, so registration never allocates.

use crate::error::{HalError, HalResult};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Up to `N` registered handlers of type `T`.
pub struct CallbackList<'a, T: ?Sized, const N: usize> {
    slots: Mutex<CriticalSectionRawMutex, RefCell<[Option<&'a T>; N]>>,
}

impl<'a, T: ?Sized, const N: usize> CallbackList<'a, T, N> {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new([None; N])),
        }
    }

    /// Append a handler. Handlers are invoked in registration order.
    pub fn add(&self, handler: &'a T) -> HalResult<()> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let free = slots
                .iter_mut()
                .find(|s| s.is_none())
                .ok_or(HalError::CallbackListFull)?;
            *free = Some(handler);
            Ok(())
        })
    }

    pub fn len(&self) -> usize {
        self.slots.lock(|slots| slots.borrow().iter().flatten().count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `f` on every registered handler.
    ///
    /// The list is copied out first so a handler never runs inside the
    /// list's critical section.
    pub fn for_each(&self, mut f: impl FnMut(&'a T)) {
        let slots = self.slots.lock(|slots| *slots.borrow());
        for handler in slots.iter().flatten() {
            f(handler);
        }
    }
}

impl<T: ?Sized, const N: usize> Default for CallbackList<'_, T, N> {
    fn default() -> Self {
        Self::new()
    }
}
