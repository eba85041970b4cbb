//! Touchpad producer interface.
//!
//! The optical sensor driver reports relative motion as signed 8-bit
//! deltas, the same shape a PS/2 mouse packet decodes to.

use crate::callback::CallbackList;
use crate::error::HalResult;

/// Receives touch motion samples.
pub trait TouchListener: Sync {
    fn on_touch(&self, dx: i8, dy: i8);
}

/// Registration point for touch listeners.
pub struct Touchpad<'a, const N: usize> {
    listeners: CallbackList<'a, dyn TouchListener + 'a, N>,
}

impl<'a, const N: usize> Touchpad<'a, N> {
    pub const fn new() -> Self {
        Self {
            listeners: CallbackList::new(),
        }
    }

    pub fn add_touch_callback(&self, listener: &'a dyn TouchListener) -> HalResult<()> {
        self.listeners.add(listener)
    }

    /// Called by the sensor driver for each motion sample.
    pub fn emit_touch(&self, dx: i8, dy: i8) {
        self.listeners.for_each(|l| l.on_touch(dx, dy));
    }
}

impl<const N: usize> Default for Touchpad<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
