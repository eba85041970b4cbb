//! Digital output pins.

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// A GPIO driven by the firmware.
///
/// The interrupt line is active-low: `Level::Low` means "asserted".
pub trait OutputPin {
    /// Switch the pin to output mode with the internal pull-up enabled.
    fn configure_output(&mut self);

    /// Drive the pin to `level`.
    fn set(&mut self, level: Level);

    fn set_low(&mut self) {
        self.set(Level::Low);
    }

    fn set_high(&mut self) {
        self.set(Level::High);
    }
}
