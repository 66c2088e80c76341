//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (configuration, filter table,
//! controller lifecycle, transceiver pins). Nothing is retried internally: every
//! failure is reported synchronously and the retry policy belongs to the caller.
use crate::controller::ControllerState;
use thiserror_no_std::Error;

//==================================================================================CONFIG_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised while resolving a [`ControllerConfig`](crate::config::ControllerConfig).
pub enum ConfigError {
    /// The requested rate is not one of the supported timing presets.
    #[error("Unsupported baud rate: {0} bit/s")]
    UnsupportedBaudRate(u32),
}

//==================================================================================FILTER_TABLE_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised by [`FilterTable`](crate::filter::table::FilterTable) mutations.
/// The table is left unchanged whenever one of these is returned.
pub enum FilterTableError {
    /// Appending one more rule would exceed the fixed capacity.
    #[error("Filter table is full")]
    CapacityExceeded,
    /// Bulk replacement asked for more rules than the table can hold.
    #[error("Invalid filter count: {requested}")]
    InvalidArgument { requested: usize },
    /// A rule identifier does not fit its 11-bit or 29-bit addressing width.
    #[error("Filter id {id:#x} out of range")]
    IdOutOfRange { id: u32 },
}

//==================================================================================TWAI_ERROR
#[derive(Error, Debug)]
/// Errors reported by [`TwaiController`](crate::controller::TwaiController).
///
/// `E` is the error type of the platform driver.
pub enum TwaiError<E: core::fmt::Debug> {
    /// Requested rate is not in the preset table. Raised before any hardware access.
    #[error("Unsupported baud rate: {baud_rate} bit/s")]
    UnsupportedBaudRate { baud_rate: u32 },
    /// The event queue could not be claimed. No peripheral install was attempted.
    #[error("Event queue unavailable")]
    ResourceExhausted,
    /// The peripheral refused the install or start request. Nothing was retained.
    #[error("Driver install/start rejected: {0:?}")]
    DriverInitFailed(E),
    /// The filter table already holds its maximum number of rules.
    #[error("Filter capacity exceeded")]
    CapacityExceeded,
    /// Malformed filter request: too many rules, or an id wider than its addressing mode.
    #[error("Invalid argument")]
    InvalidArgument,
    /// Reinstalling or restarting the peripheral failed; the controller is stopped.
    #[error("Filter reprogramming failed, controller stopped: {0:?}")]
    FilterApplyFailed(E),
    /// Operation not allowed in the current controller state.
    #[error("Operation not allowed in state {state:?}")]
    InvalidState { state: ControllerState },
    /// The transmit path did not accept the frame within the timeout.
    #[error("Transmit rejected: {0:?}")]
    Transmit(E),
    /// The peripheral refused to start bus-off recovery.
    #[error("Recovery request rejected: {0:?}")]
    Recovery(E),
}

impl<E: core::fmt::Debug> From<ConfigError> for TwaiError<E> {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnsupportedBaudRate(baud_rate) => Self::UnsupportedBaudRate { baud_rate },
        }
    }
}

impl<E: core::fmt::Debug> From<FilterTableError> for TwaiError<E> {
    fn from(err: FilterTableError) -> Self {
        match err {
            FilterTableError::CapacityExceeded => Self::CapacityExceeded,
            FilterTableError::InvalidArgument { .. } | FilterTableError::IdOutOfRange { .. } => {
                Self::InvalidArgument
            }
        }
    }
}

//==================================================================================TRANSCEIVER_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised while driving transceiver pins.
pub enum TransceiverError {
    /// Mode change requested before [`configure`](crate::transceiver::Transceiver::configure).
    #[error("Transceiver not configured")]
    NotConfigured,
    /// A GPIO write was rejected by the HAL.
    #[error("Pin error: {0:?}")]
    Pin(embedded_hal::digital::ErrorKind),
}
