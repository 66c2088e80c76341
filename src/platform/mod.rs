//! Boundary between the driver core and the platform: the peripheral driver
//! capability, interrupt-context access, timer, and the status snapshot the
//! peripheral reports.
pub mod traits;

//==================================================================================BUS_STATE
/// Controller state as reported by the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// Not participating in bus activity (not started, or stopped after recovery).
    #[default]
    Stopped,
    /// Error active or error passive, taking part in bus activity.
    Running,
    /// Transmit error counter exceeded 255; the controller left the bus.
    BusOff,
    /// Waiting for 128 occurrences of 11 recessive bits after a recovery request.
    Recovering,
}

//==================================================================================STATUS_INFO
/// Point-in-time snapshot of the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusInfo {
    pub state: BusState,
    /// Frames waiting in the transmit path.
    pub msgs_to_tx: u32,
    /// Frames waiting in the receive path.
    pub msgs_to_rx: u32,
    pub tx_error_counter: u32,
    pub rx_error_counter: u32,
    pub tx_failed_count: u32,
    pub rx_missed_count: u32,
    pub rx_overrun_count: u32,
    pub arb_lost_count: u32,
    pub bus_error_count: u32,
}

impl StatusInfo {
    #[inline]
    pub fn is_bus_off(&self) -> bool {
        self.state == BusState::BusOff
    }
}
