//! Host-visible register map.
//!
//! The host reads and writes these bytes over the bus; the firmware reads
//! configuration from them and reports pending interrupt reasons back
//! through them. Every accessor runs in its own critical section, so a
//! read-modify-write from the bus handler cannot interleave with a producer
//! interrupt setting a status bit. This needs no compare-and-swap, which
//! Cortex-M0+ parts lack.

use crate::config;
use bitflags::bitflags;
use core::cell::Cell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Register identifiers (bus addresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RegId {
    /// Firmware version.
    Ver = 0x01,
    /// Configuration, see [`Cfg`].
    Cfg = 0x02,
    /// Interrupt status, see [`Int`].
    Int = 0x03,
    /// Key status: FIFO length.
    Key = 0x04,
    /// Backlight duty.
    Bkl = 0x05,
    /// GPIO interrupt enable, one bit per expander pin.
    Gic = 0x0F,
    /// GPIO interrupt status, one bit per expander pin.
    Gin = 0x10,
    /// Interrupt pulse duration in milliseconds.
    Ind = 0x13,
    /// Configuration 2, see [`Cf2`].
    Cf2 = 0x14,
}

/// One past the highest register address.
pub const REG_COUNT: usize = 0x20;

bitflags! {
    /// CFG register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cfg: u8 {
        /// On FIFO overflow, drop the oldest event instead of the newest.
        const OVERFLOW_ON  = 1 << 0;
        /// Raise INT.OVERFLOW when the FIFO overflows.
        const OVERFLOW_INT = 1 << 1;
        const CAPSLOCK_INT = 1 << 2;
        const NUMLOCK_INT  = 1 << 3;
        const KEY_INT      = 1 << 4;
        const PANIC_INT    = 1 << 5;
        const REPORT_MODS  = 1 << 6;
        const USE_MODS     = 1 << 7;
    }
}

bitflags! {
    /// INT register bits (pending interrupt reasons).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Int: u8 {
        const OVERFLOW = 1 << 0;
        const CAPSLOCK = 1 << 1;
        const NUMLOCK  = 1 << 2;
        const KEY      = 1 << 3;
        const PANIC    = 1 << 4;
        const GPIO     = 1 << 5;
        const TOUCH    = 1 << 6;
    }
}

bitflags! {
    /// CF2 register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cf2: u8 {
        const TOUCH_INT    = 1 << 0;
        const USB_KEYB_ON  = 1 << 1;
        const USB_MOUSE_ON = 1 << 2;
    }
}

/// KEY register: mask of the FIFO length field.
pub const KEY_COUNT_MASK: u8 = 0x1F;

/// Power-on CFG value.
pub const DEFAULT_CFG: Cfg = Cfg::OVERFLOW_INT.union(Cfg::KEY_INT).union(Cfg::USE_MODS);

/// Power-on CF2 value.
pub const DEFAULT_CF2: Cf2 = Cf2::TOUCH_INT.union(Cf2::USB_KEYB_ON).union(Cf2::USB_MOUSE_ON);

/// Access to the register map.
///
/// Each call is individually atomic; callers that need a consistent view
/// of several registers must not assume one.
pub trait RegisterStore: Sync {
    fn get(&self, id: RegId) -> u8;

    fn set(&self, id: RegId, value: u8);

    /// OR `bits` into the register.
    fn set_bit(&self, id: RegId, bits: u8);

    /// Clear `bits` in the register.
    fn clear_bit(&self, id: RegId, bits: u8);

    /// `true` if any of `bits` is set.
    fn is_bit_set(&self, id: RegId, bits: u8) -> bool {
        self.get(id) & bits != 0
    }

    fn cfg(&self) -> Cfg {
        Cfg::from_bits_retain(self.get(RegId::Cfg))
    }

    fn cf2(&self) -> Cf2 {
        Cf2::from_bits_retain(self.get(RegId::Cf2))
    }

    fn int(&self) -> Int {
        Int::from_bits_retain(self.get(RegId::Int))
    }
}

/// Write the power-on defaults and clear all status registers.
pub fn load_defaults(regs: &impl RegisterStore) {
    regs.set(RegId::Ver, config::VERSION);
    regs.set(RegId::Cfg, DEFAULT_CFG.bits());
    regs.set(RegId::Int, 0);
    regs.set(RegId::Key, 0);
    regs.set(RegId::Bkl, config::DEFAULT_BKL);
    regs.set(RegId::Gic, 0);
    regs.set(RegId::Gin, 0);
    regs.set(RegId::Ind, config::DEFAULT_IND_MS);
    regs.set(RegId::Cf2, DEFAULT_CF2.bits());
}

/// In-memory register file.
pub struct RegisterFile {
    regs: Mutex<CriticalSectionRawMutex, [Cell<u8>; REG_COUNT]>,
}

impl RegisterFile {
    /// All registers zero. Call [`load_defaults`] before use.
    pub const fn new() -> Self {
        Self {
            regs: Mutex::new([const { Cell::new(0) }; REG_COUNT]),
        }
    }

    fn update(&self, id: RegId, f: impl FnOnce(u8) -> u8) {
        self.regs.lock(|regs| {
            let slot = &regs[id as usize];
            slot.set(f(slot.get()));
        })
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterStore for RegisterFile {
    fn get(&self, id: RegId) -> u8 {
        self.regs.lock(|regs| regs[id as usize].get())
    }

    fn set(&self, id: RegId, value: u8) {
        self.update(id, |_| value);
    }

    fn set_bit(&self, id: RegId, bits: u8) {
        self.update(id, |old| old | bits);
    }

    fn clear_bit(&self, id: RegId, bits: u8) {
        self.update(id, |old| old & !bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_power_on_values() {
        let regs = RegisterFile::new();
        load_defaults(&regs);

        assert!(regs.cfg().contains(Cfg::KEY_INT));
        assert!(!regs.cfg().contains(Cfg::CAPSLOCK_INT));
        assert!(regs.cf2().contains(Cf2::TOUCH_INT));
        assert_eq!(regs.get(RegId::Ind), 1);
        assert_eq!(regs.get(RegId::Gic), 0);
        assert!(regs.int().is_empty());
    }

    #[test]
    fn bit_operations_touch_only_named_bits() {
        let regs = RegisterFile::new();
        regs.set(RegId::Int, Int::KEY.bits());

        regs.set_bit(RegId::Int, Int::TOUCH.bits());
        assert_eq!(regs.int(), Int::KEY | Int::TOUCH);

        regs.clear_bit(RegId::Int, Int::KEY.bits());
        assert_eq!(regs.int(), Int::TOUCH);
        assert!(regs.is_bit_set(RegId::Int, Int::TOUCH.bits()));
        assert!(!regs.is_bit_set(RegId::Int, Int::KEY.bits()));
    }

    #[test]
    fn registers_are_independent() {
        let regs = RegisterFile::new();
        regs.set(RegId::Gic, 0xFF);
        assert_eq!(regs.get(RegId::Gin), 0);
    }

    #[test]
    fn concurrent_bit_updates_are_not_lost() {
        use std::thread;

        let regs = RegisterFile::new();
        thread::scope(|s| {
            for bit in 0..8u8 {
                let regs = &regs;
                s.spawn(move || {
                    for _ in 0..500 {
                        regs.set_bit(RegId::Gin, 1 << bit);
                        regs.clear_bit(RegId::Gin, 1 << bit);
                    }
                    regs.set_bit(RegId::Gin, 1 << bit);
                });
            }
        });
        assert_eq!(regs.get(RegId::Gin), 0xFF);
    }
}
