//! `twai-object` library: driver layer for a TWAI (CAN) controller peripheral
//! in a `no_std` environment. The crate exposes the controller lifecycle facade,
//! the interrupt-fed event queue, acceptance filter management, and the
//! physical-layer transceiver abstraction. Register-level programming stays with
//! the platform, plugged in through the traits of [`platform`].
#![no_std]
//==================================================================================
/// Bring-up configuration: pins, supported baud rate presets, operating modes.
pub mod config;
/// Controller lifecycle facade tying configuration, filters and events together.
pub mod controller;
/// Error types shared across the crate.
pub mod error;
/// Events produced by the interrupt pipeline and the bounded queue carrying them.
pub mod events;
/// Acceptance filter table and its translation into hardware filter form.
pub mod filter;
/// Classic CAN frame as exchanged with the TWAI peripheral.
pub mod frame;
/// Interrupt-context receive pipeline.
pub mod interrupt;
/// Capabilities the platform provides: peripheral driver, ISR access, timer.
pub mod platform;
/// Physical-layer transceiver control.
pub mod transceiver;
//==================================================================================
pub use controller::{ControllerState, TwaiController};
pub use error::TwaiError;
pub use events::{Event, EventQueue, EventReceiver};
pub use frame::TwaiFrame;
