//! Key event reporting — scanner → FIFO.
//!
//! Registered on the keyboard ahead of the pulse controller, so by the time
//! the host sees the interrupt the event is already queued.

use bridge_hal::keyboard::{KeyEvent, KeyListener};
use log::debug;

use crate::fifo::Fifo;
use crate::reg::{Cfg, Int, RegId, RegisterStore};

/// Queues every key transition for the host.
///
/// On overflow the CFG register decides: `OVERFLOW_INT` flags the loss in
/// INT, `OVERFLOW_ON` keeps the new event by evicting the oldest one.
pub struct KeyReporter<'a, R, const N: usize> {
    regs: &'a R,
    fifo: &'a Fifo<KeyEvent, N>,
}

impl<'a, R: RegisterStore, const N: usize> KeyReporter<'a, R, N> {
    pub const fn new(regs: &'a R, fifo: &'a Fifo<KeyEvent, N>) -> Self {
        Self { regs, fifo }
    }
}

impl<R: RegisterStore, const N: usize> KeyListener for KeyReporter<'_, R, N> {
    fn on_key(&self, event: KeyEvent) {
        if self.fifo.enqueue(event) {
            return;
        }

        let cfg = self.regs.cfg();
        debug!("keys: fifo full, key {:#04x} (cfg {:?})", event.key, cfg);

        if cfg.contains(Cfg::OVERFLOW_INT) {
            self.regs.set_bit(RegId::Int, Int::OVERFLOW.bits());
        }
        if cfg.contains(Cfg::OVERFLOW_ON) {
            self.fifo.enqueue_force(event);
        }
    }
}
