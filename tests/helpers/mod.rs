/// Test doubles standing in for the TWAI peripheral, its interrupt context and the timer.
use embassy_time::{Duration, Instant};
use embedded_can::{ExtendedId, StandardId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use twai_object::{
    config::{GeneralConfig, TimingConfig},
    filter::programmer::{FilterBanks, HardwareFilter},
    frame::TwaiFrame,
    platform::{
        traits::{isr_context::IsrContext, twai_driver::TwaiDriver, twai_timer::TwaiTimer},
        BusState, StatusInfo,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
/// Failures the simulated peripheral can report.
pub enum MockError {
    AlreadyInstalled,
    NotInstalled,
    NotRunning,
    InstallRejected,
    StartRejected,
    TxQueueFull,
    RecoveryRejected,
    SecondaryRejected,
}

#[derive(Debug, Default)]
#[allow(dead_code)]
/// Everything the simulated peripheral recorded, plus failure switches.
pub struct DriverLog {
    pub installed: bool,
    pub running: bool,
    /// Primary filter of every install, in order.
    pub installs: Vec<HardwareFilter>,
    pub secondary_writes: Vec<HardwareFilter>,
    pub last_general: Option<GeneralConfig>,
    pub last_timing: Option<TimingConfig>,
    pub starts: usize,
    pub stops: usize,
    pub uninstalls: usize,
    pub transmitted: Vec<TwaiFrame>,
    pub recoveries: usize,
    pub banks: FilterBanks,
    /// Overrides the bus state reported while running.
    pub bus_state: Option<BusState>,
    pub fail_install: bool,
    pub fail_start: bool,
    pub fail_recovery: bool,
    pub fail_secondary: bool,
    /// Transmit path has no free slot.
    pub tx_full: bool,
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// In-memory TWAI peripheral. Clones share the same log, so a test keeps a
/// handle after moving the driver into the controller.
pub struct MockDriver {
    log: Arc<Mutex<DriverLog>>,
}

#[allow(dead_code)]
impl MockDriver {
    /// Variant with two acceptance banks (C3/C6 style).
    pub fn dual_bank() -> Self {
        let driver = Self::default();
        driver.log().banks = FilterBanks::Dual;
        driver
    }

    pub fn log(&self) -> MutexGuard<'_, DriverLog> {
        self.log.lock().unwrap()
    }
}

impl TwaiDriver for MockDriver {
    type Error = MockError;

    fn install(
        &mut self,
        general: &GeneralConfig,
        timing: &TimingConfig,
        filter: &HardwareFilter,
    ) -> Result<(), Self::Error> {
        let mut log = self.log();
        if log.installed {
            return Err(MockError::AlreadyInstalled);
        }
        if log.fail_install {
            return Err(MockError::InstallRejected);
        }
        log.installed = true;
        log.installs.push(*filter);
        log.last_general = Some(*general);
        log.last_timing = Some(*timing);
        Ok(())
    }

    fn uninstall(&mut self) -> Result<(), Self::Error> {
        let mut log = self.log();
        if !log.installed {
            return Err(MockError::NotInstalled);
        }
        log.installed = false;
        log.uninstalls += 1;
        Ok(())
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        let mut log = self.log();
        if !log.installed {
            return Err(MockError::NotInstalled);
        }
        if log.fail_start {
            return Err(MockError::StartRejected);
        }
        log.running = true;
        log.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        let mut log = self.log();
        if !log.running {
            return Err(MockError::NotRunning);
        }
        log.running = false;
        log.stops += 1;
        Ok(())
    }

    fn transmit(&mut self, frame: &TwaiFrame, _timeout: Duration) -> Result<(), Self::Error> {
        let mut log = self.log();
        if !log.running {
            return Err(MockError::NotRunning);
        }
        // A full path never frees up in the simulation, whatever the timeout.
        if log.tx_full {
            return Err(MockError::TxQueueFull);
        }
        log.transmitted.push(*frame);
        Ok(())
    }

    fn status(&self) -> StatusInfo {
        let log = self.log();
        let state = match (log.running, log.bus_state) {
            (true, Some(state)) => state,
            (true, None) => BusState::Running,
            (false, _) => BusState::Stopped,
        };
        StatusInfo {
            state,
            msgs_to_tx: log.transmitted.len() as u32,
            ..StatusInfo::default()
        }
    }

    fn initiate_recovery(&mut self) -> Result<(), Self::Error> {
        let mut log = self.log();
        if log.fail_recovery || log.bus_state != Some(BusState::BusOff) {
            return Err(MockError::RecoveryRejected);
        }
        log.recoveries += 1;
        log.bus_state = Some(BusState::Recovering);
        Ok(())
    }

    fn filter_banks(&self) -> FilterBanks {
        self.log().banks
    }

    fn write_secondary_filter(&mut self, filter: &HardwareFilter) -> Result<(), Self::Error> {
        let mut log = self.log();
        if log.fail_secondary {
            return Err(MockError::SecondaryRejected);
        }
        log.secondary_writes.push(*filter);
        Ok(())
    }
}

#[allow(dead_code)]
/// Interrupt context with a scripted receive FIFO.
pub struct MockIsr {
    pub state: BusState,
    pub pending: VecDeque<TwaiFrame>,
    pub tick: u64,
    pub yields: usize,
}

#[allow(dead_code)]
impl MockIsr {
    pub fn new() -> Self {
        Self {
            state: BusState::Running,
            pending: VecDeque::new(),
            tick: 0,
            yields: 0,
        }
    }

    /// Queue a standard data frame on the simulated receive path.
    pub fn deliver(&mut self, raw_id: u16, data: &[u8]) {
        let id = StandardId::new(raw_id).unwrap();
        self.pending.push_back(TwaiFrame::new(id, data).unwrap());
    }

    /// Queue an extended data frame on the simulated receive path.
    pub fn deliver_extended(&mut self, raw_id: u32, data: &[u8]) {
        let id = ExtendedId::new(raw_id).unwrap();
        self.pending.push_back(TwaiFrame::new(id, data).unwrap());
    }
}

impl IsrContext for MockIsr {
    fn status(&self) -> StatusInfo {
        StatusInfo {
            state: self.state,
            msgs_to_rx: self.pending.len() as u32,
            ..StatusInfo::default()
        }
    }

    fn try_receive(&mut self) -> Option<TwaiFrame> {
        self.pending.pop_front()
    }

    fn now(&self) -> Instant {
        Instant::from_ticks(self.tick)
    }

    fn yield_from_isr(&mut self) {
        self.yields += 1;
    }
}

#[allow(dead_code)]
/// Timer based on `tokio::time::sleep` to drive bounded waits in tests.
pub struct MockTimer;

impl TwaiTimer for MockTimer {
    async fn delay_ms(&mut self, millis: u32) {
        tokio::time::sleep(std::time::Duration::from_millis(millis as u64)).await;
    }
}
