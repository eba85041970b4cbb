//! PWM output channel (backlight).

/// A PWM slice/channel bound to one GPIO.
pub trait PwmOutput {
    /// Enable the channel with the default wrap value (16-bit counter).
    fn enable(&mut self);

    /// Set the compare level. 0 = always low, 0xFFFF = always high.
    fn set_level(&mut self, level: u16);
}
