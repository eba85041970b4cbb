//! Hardware Abstraction Layer.
//!
//! Everything the firmware core touches but does not own: the interrupt
//! output pin, the backlight PWM channel, the one-shot alarm scheduler, and
//! the callback registration points of each input producer.
#![cfg_attr(not(test), no_std)]

pub mod alarm;
pub mod callback;
pub mod error;
pub mod gpioexp;
pub mod keyboard;
pub mod pin;
pub mod pwm;
pub mod touchpad;

pub use alarm::{AlarmId, AlarmScheduler, TickAlarms};
pub use error::{HalError, HalResult};
pub use pin::{Level, OutputPin};
pub use pwm::PwmOutput;
