//! What the interrupt pipeline may touch while running inside the peripheral's
//! interrupt handler. Every method must be callable from interrupt context:
//! no blocking, no allocation.
use embassy_time::Instant;

use crate::frame::TwaiFrame;
use crate::platform::StatusInfo;

/// Interrupt-safe view of the peripheral and scheduler.
pub trait IsrContext {
    /// Status snapshot, read once per interrupt.
    fn status(&self) -> StatusInfo;

    /// Pop the next received frame without waiting.
    fn try_receive(&mut self) -> Option<TwaiFrame>;

    /// Current scheduler tick. Read once per event, so frames drained in the
    /// same interrupt carry their own timestamps.
    fn now(&self) -> Instant;

    /// Request a context switch on interrupt exit so a woken consumer runs next.
    fn yield_from_isr(&mut self);
}
