//! Keyboard producer interface.
//!
//! The scan-matrix driver owns debouncing and decoding; what it hands the
//! rest of the firmware is a stream of structured [`KeyEvent`]s plus lock
//! toggles (Caps Lock / Num Lock). Interested parties register a listener
//! here and are called synchronously, from whatever context the scanner
//! runs in.

use crate::callback::CallbackList;
use crate::error::HalResult;

/// Key lifecycle state as reported to the host.
///
/// `Idle` doubles as the "no event" value of an empty queue slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum KeyState {
    #[default]
    Idle = 0,
    Pressed = 1,
    Hold = 2,
    Released = 3,
}

impl KeyState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A single key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEvent {
    /// Key code as seen by the host (ASCII for printable keys).
    pub key: u8,
    pub state: KeyState,
}

impl KeyEvent {
    pub const fn new(key: u8, state: KeyState) -> Self {
        Self { key, state }
    }
}

/// Receives every key transition.
pub trait KeyListener: Sync {
    fn on_key(&self, event: KeyEvent);
}

/// Receives lock-key toggles. Both flags may be set in a single call.
pub trait LockListener: Sync {
    fn on_lock(&self, caps_changed: bool, num_changed: bool);
}

/// Registration point for keyboard listeners.
pub struct Keyboard<'a, const N: usize> {
    keys: CallbackList<'a, dyn KeyListener + 'a, N>,
    locks: CallbackList<'a, dyn LockListener + 'a, N>,
}

impl<'a, const N: usize> Keyboard<'a, N> {
    pub const fn new() -> Self {
        Self {
            keys: CallbackList::new(),
            locks: CallbackList::new(),
        }
    }

    pub fn add_key_callback(&self, listener: &'a dyn KeyListener) -> HalResult<()> {
        self.keys.add(listener)
    }

    pub fn add_lock_callback(&self, listener: &'a dyn LockListener) -> HalResult<()> {
        self.locks.add(listener)
    }

    /// Called by the scanner for each decoded key transition.
    pub fn emit_key(&self, event: KeyEvent) {
        self.keys.for_each(|l| l.on_key(event));
    }

    /// Called by the lock tracker when Caps Lock and/or Num Lock toggled.
    pub fn emit_lock(&self, caps_changed: bool, num_changed: bool) {
        if !caps_changed && !num_changed {
            return;
        }
        self.locks.for_each(|l| l.on_lock(caps_changed, num_changed));
    }
}

impl<const N: usize> Default for Keyboard<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
