//! Host-facing read path.
//!
//! The bus handler calls into here when the host reads the KEY or FIF
//! registers, acknowledges interrupts, or requests a reset. Framing and
//! addressing stay with the bus driver.

use bridge_hal::keyboard::KeyEvent;
use log::info;

use crate::fifo::Fifo;
use crate::reg::{self, Int, RegId, RegisterStore, KEY_COUNT_MASK};

pub struct HostPort<'a, R, const N: usize> {
    regs: &'a R,
    fifo: &'a Fifo<KeyEvent, N>,
}

impl<'a, R: RegisterStore, const N: usize> HostPort<'a, R, N> {
    pub const fn new(regs: &'a R, fifo: &'a Fifo<KeyEvent, N>) -> Self {
        Self { regs, fifo }
    }

    /// Current KEY register value: queued event count in the low bits.
    ///
    /// Also refreshes the stored KEY register.
    pub fn key_status(&self) -> u8 {
        let count = self.fifo.count().min(usize::from(KEY_COUNT_MASK)) as u8;
        let value = (self.regs.get(RegId::Key) & !KEY_COUNT_MASK) | count;
        self.regs.set(RegId::Key, value);
        value
    }

    /// Pop one event as `[state, key]`. An empty queue reads `[0, 0]`.
    pub fn read_fifo(&self) -> [u8; 2] {
        let event = self.fifo.dequeue();
        [event.state.as_u8(), event.key]
    }

    /// Clear the given INT bits (host write-to-clear).
    ///
    /// Only INT is touched. The per-pin GIN bits are the host's to clear
    /// with its own register write.
    pub fn ack_interrupts(&self, mask: Int) {
        self.regs.clear_bit(RegId::Int, mask.bits());
    }

    /// Host-requested reset: drop queued events and restore defaults.
    pub fn reset(&self) {
        self.fifo.flush();
        reg::load_defaults(self.regs);
        info!("host: reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::RegisterFile;
    use bridge_hal::keyboard::KeyState;

    #[test]
    fn key_status_tracks_queue_length() {
        let regs = RegisterFile::new();
        let fifo: Fifo<KeyEvent, 4> = Fifo::new();
        let host = HostPort::new(&regs, &fifo);

        assert_eq!(host.key_status(), 0);
        fifo.enqueue(KeyEvent::new(b'x', KeyState::Pressed));
        fifo.enqueue(KeyEvent::new(b'x', KeyState::Released));
        assert_eq!(host.key_status(), 2);
        assert_eq!(regs.get(RegId::Key), 2);
    }

    #[test]
    fn read_fifo_encodes_state_then_key() {
        let regs = RegisterFile::new();
        let fifo: Fifo<KeyEvent, 4> = Fifo::new();
        let host = HostPort::new(&regs, &fifo);

        fifo.enqueue(KeyEvent::new(b'x', KeyState::Released));
        assert_eq!(host.read_fifo(), [3, b'x']);
        assert_eq!(host.read_fifo(), [0, 0]);
    }

    #[test]
    fn ack_clears_only_requested_bits() {
        let regs = RegisterFile::new();
        let fifo: Fifo<KeyEvent, 4> = Fifo::new();
        let host = HostPort::new(&regs, &fifo);
        regs.set(RegId::Int, (Int::KEY | Int::GPIO | Int::TOUCH).bits());
        regs.set(RegId::Gin, 0b1001);

        host.ack_interrupts(Int::KEY);
        assert_eq!(regs.int(), Int::GPIO | Int::TOUCH);
        assert_eq!(regs.get(RegId::Gin), 0b1001);

        host.ack_interrupts(Int::GPIO);
        assert_eq!(regs.int(), Int::TOUCH);
        assert_eq!(regs.get(RegId::Gin), 0b1001);
    }

    #[test]
    fn reset_flushes_and_restores_defaults() {
        let regs = RegisterFile::new();
        let fifo: Fifo<KeyEvent, 4> = Fifo::new();
        let host = HostPort::new(&regs, &fifo);
        fifo.enqueue(KeyEvent::new(b'z', KeyState::Pressed));
        regs.set(RegId::Int, Int::KEY.bits());
        regs.set(RegId::Ind, 9);

        host.reset();

        assert_eq!(fifo.count(), 0);
        assert!(regs.int().is_empty());
        assert_eq!(regs.get(RegId::Ind), crate::config::DEFAULT_IND_MS);
        assert_eq!(host.read_fifo(), [0, 0]);
    }
}
