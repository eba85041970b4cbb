//! Keyboard backlight.
//!
//! The BKL register holds the duty the host asked for. The LED driver is
//! wired active-low, so the PWM level is inverted and scaled from 8 to
//! 16 bits.

use bridge_hal::pwm::PwmOutput;

use crate::reg::{RegId, RegisterStore};

pub struct Backlight<P> {
    pwm: P,
}

/// PWM compare level for a BKL register value.
pub fn pwm_level(duty: u8) -> u16 {
    u16::from(255 - duty) * 0x80
}

impl<P: PwmOutput> Backlight<P> {
    pub const fn new(pwm: P) -> Self {
        Self { pwm }
    }

    /// Enable the PWM channel and apply the current BKL value.
    pub fn init(&mut self, regs: &impl RegisterStore) {
        self.pwm.enable();
        self.sync(regs);
    }

    /// Re-apply BKL after the host wrote it.
    pub fn sync(&mut self, regs: &impl RegisterStore) {
        self.pwm.set_level(pwm_level(regs.get(RegId::Bkl)));
    }
}
