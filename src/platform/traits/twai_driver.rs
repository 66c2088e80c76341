//! Peripheral capability consumed by the controller facade. Implementations
//! own the register-level work (bit timing, filter registers, mailboxes); the
//! core only decides which configuration to request and in which order.
use embassy_time::Duration;

use crate::config::{GeneralConfig, TimingConfig};
use crate::filter::programmer::{FilterBanks, HardwareFilter};
use crate::frame::TwaiFrame;
use crate::platform::StatusInfo;

/// Contract for installing, starting and operating the TWAI peripheral.
pub trait TwaiDriver {
    type Error: core::fmt::Debug;

    /// Install the peripheral with the given pin/mode, timing and acceptance filter.
    /// The peripheral is left stopped.
    fn install(
        &mut self,
        general: &GeneralConfig,
        timing: &TimingConfig,
        filter: &HardwareFilter,
    ) -> Result<(), Self::Error>;

    /// Release the installed configuration. Only valid on a stopped peripheral.
    fn uninstall(&mut self) -> Result<(), Self::Error>;

    /// Enter the running state: reception and transmission begin.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Leave the running state. Frames in flight are discarded.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Queue a frame for transmission, blocking up to `timeout` for space in the
    /// transmit path. A zero timeout must return immediately.
    fn transmit(&mut self, frame: &TwaiFrame, timeout: Duration) -> Result<(), Self::Error>;

    /// Fresh status snapshot.
    fn status(&self) -> StatusInfo;

    /// Ask the peripheral to leave bus-off.
    fn initiate_recovery(&mut self) -> Result<(), Self::Error>;

    /// Acceptance filter banks available on this variant.
    fn filter_banks(&self) -> FilterBanks {
        FilterBanks::Single
    }

    /// Program the secondary acceptance bank. Called between install and start,
    /// and only when [`filter_banks`](Self::filter_banks) reports [`FilterBanks::Dual`].
    fn write_secondary_filter(&mut self, _filter: &HardwareFilter) -> Result<(), Self::Error> {
        Ok(())
    }
}
