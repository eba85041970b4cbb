//! Board and firmware configuration.
//!
//! Compile-time only. Everything the host may change at runtime lives in
//! the register map instead (see [`crate::reg`]).

/// Capacity of the key event FIFO.
///
/// The host reads the queue length from the low five bits of the KEY
/// register, so this must stay below 32.
pub const KEY_FIFO_SIZE: usize = 31;

/// Listener slots per producer event type.
pub const MAX_CALLBACKS: usize = 4;

/// Firmware version reported in the VER register (major << 4 | minor).
pub const VERSION: u8 = 0x10;

// ── Register power-on defaults ────────────────────────────────────

/// Interrupt pulse length in milliseconds.
pub const DEFAULT_IND_MS: u8 = 1;

/// Backlight duty, 0 (off) to 255 (full).
pub const DEFAULT_BKL: u8 = 255;

const _: () = assert!(KEY_FIFO_SIZE > 0 && KEY_FIFO_SIZE < 32);
