//! HAL error type.

use core::fmt;

/// Errors raised while wiring the hardware layer together.
///
/// None of these can happen on the event path itself; they only surface
/// during initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// A producer's callback list has no free slot.
    CallbackListFull,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalError::CallbackListFull => f.write_str("callback list full"),
        }
    }
}

pub type HalResult<T> = Result<T, HalError>;
