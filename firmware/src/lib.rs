// =============================================================================
// keybridge — Firmware Core
// =============================================================================
//
// The bridge sits between a keyboard matrix, a touch sensor, a GPIO
// expander and a host that only sees a register map plus one interrupt line.
//
// FLOW:
//   producer fires (interrupt priority)
//     → KeyReporter queues key events in the FIFO
//     → PulseController adapters check CFG / CF2 / GIC enable bits
//     → matching INT (and GIN) status bits are set
//     → the interrupt line is pulled low, release alarm (re)scheduled
//   host reads KEY / FIF, acknowledges INT (task priority, via HostPort)
//
// All board-specific pieces (pins, PWM, timer) come in through the traits
// of `bridge-hal`, so this crate builds and tests on the host as well.
// =============================================================================

#![cfg_attr(not(test), no_std)]

pub mod backlight;
pub mod config;
pub mod fifo;
pub mod host;
pub mod interrupt;
pub mod keys;
pub mod reg;

use bridge_hal::alarm::AlarmScheduler;
use bridge_hal::gpioexp::GpioExpander;
use bridge_hal::keyboard::Keyboard;
use bridge_hal::pin::OutputPin;
use bridge_hal::touchpad::Touchpad;
use bridge_hal::HalResult;

pub use fifo::{Fifo, KeyFifo};
pub use host::HostPort;
pub use interrupt::PulseController;
pub use keys::KeyReporter;
pub use reg::{RegId, RegisterFile, RegisterStore};

/// Hook the core into the producers.
///
/// The key reporter goes first so an event is queued before its
/// interrupt reaches the host.
pub fn init<'b, R, P, S, const N: usize, const K: usize, const T: usize, const G: usize>(
    reporter: &'b KeyReporter<'_, R, N>,
    pulse: &'b PulseController<'_, R, P, S>,
    keyboard: &Keyboard<'b, K>,
    touchpad: &Touchpad<'b, T>,
    gpioexp: &GpioExpander<'b, G>,
) -> HalResult<()>
where
    R: RegisterStore,
    P: OutputPin + Send,
    S: AlarmScheduler + Sync,
{
    keyboard.add_key_callback(reporter)?;
    pulse.init(keyboard, touchpad, gpioexp)
}
