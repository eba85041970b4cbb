//! GPIO-expander producer interface.
//!
//! The expander poller detects edges on the host-configurable pins and
//! reports the raw GPIO number together with the pin's logical index
//! (its bit position in the GIC / GIN registers).

use crate::callback::CallbackList;
use crate::error::HalResult;

/// Number of expander pins exposed to the host (one register byte).
pub const GPIO_PIN_COUNT: u8 = 8;

/// Receives expander pin events.
pub trait GpioListener: Sync {
    fn on_gpio(&self, gpio: u8, index: u8);
}

/// Registration point for expander listeners.
pub struct GpioExpander<'a, const N: usize> {
    listeners: CallbackList<'a, dyn GpioListener + 'a, N>,
}

impl<'a, const N: usize> GpioExpander<'a, N> {
    pub const fn new() -> Self {
        Self {
            listeners: CallbackList::new(),
        }
    }

    pub fn add_int_callback(&self, listener: &'a dyn GpioListener) -> HalResult<()> {
        self.listeners.add(listener)
    }

    /// Called by the poller for an edge on logical pin `index`.
    ///
    /// Indices outside the register byte are ignored.
    pub fn emit(&self, gpio: u8, index: u8) {
        if index >= GPIO_PIN_COUNT {
            return;
        }
        self.listeners.for_each(|l| l.on_gpio(gpio, index));
    }
}

impl<const N: usize> Default for GpioExpander<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
