//! Controller lifecycle facade.
//!
//! [`TwaiController`] owns the platform driver for the duration of a session and
//! ties together the pieces around it: the resolved configuration, the filter
//! table and its hardware form, the event queue shared with the interrupt
//! pipeline, and an optional link to the physical-layer transceiver.
//!
//! ```rust,ignore
//! static EVENTS: EventQueue = EventQueue::new();
//!
//! let mut twai = TwaiController::new(driver, &EVENTS);
//! twai.bring_up(ControllerConfig::builder().baud_rate(250_000).build())?;
//! twai.add_filter(FilterRule::mask(0x123, 0x00F, false))?;
//! let mut rx = twai.event_queue().unwrap();
//! ```
use embassy_time::Duration;

use crate::config::{BaudRate, ControllerConfig, GeneralConfig, TimingConfig};
use crate::error::TwaiError;
use crate::events::{EventQueue, EventReceiver, DEFAULT_EVENT_QUEUE_CAPACITY};
use crate::filter::programmer::{FilterProgrammer, HardwareFilter};
use crate::filter::table::{FilterCoverage, FilterRule, FilterTable};
use crate::frame::TwaiFrame;
use crate::interrupt::InterruptPipeline;
use crate::platform::traits::twai_driver::TwaiDriver;
use crate::platform::{BusState, StatusInfo};
use crate::transceiver::TransceiverControl;

//==================================================================================CONTROLLER_STATE
/// Externally visible controller state.
///
/// `BusOff` and `Recovering` are observed from the peripheral status, never
/// driven by the controller itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerState {
    /// No session: nothing installed, the queue is not held.
    Uninitialized,
    Running,
    BusOff,
    Recovering,
    /// Session held but the peripheral is stopped after a failed reprogram.
    Stopped,
}

/// Lifecycle the controller drives directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Running,
    Stopped,
}

/// Configuration resolved at bring-up and held for the session.
#[derive(Debug, Clone, Copy)]
struct Session {
    config: ControllerConfig,
    baud: BaudRate,
    general: GeneralConfig,
    timing: TimingConfig,
}

//==================================================================================TWAI_CONTROLLER
/// Facade over one TWAI peripheral.
pub struct TwaiController<'a, D: TwaiDriver, const N: usize = DEFAULT_EVENT_QUEUE_CAPACITY> {
    driver: D,
    queue: &'a EventQueue<N>,
    session: Option<Session>,
    lifecycle: Lifecycle,
    filters: FilterTable,
    programmed: HardwareFilter,
    transceiver: Option<&'a dyn TransceiverControl>,
}

impl<'a, D: TwaiDriver, const N: usize> TwaiController<'a, D, N> {
    /// Wrap a driver. Nothing is touched until [`bring_up`](Self::bring_up).
    pub fn new(driver: D, queue: &'a EventQueue<N>) -> Self {
        Self {
            driver,
            queue,
            session: None,
            lifecycle: Lifecycle::Uninitialized,
            filters: FilterTable::new(),
            programmed: HardwareFilter::ACCEPT_ALL,
            transceiver: None,
        }
    }

    //==============================================================================LIFECYCLE
    /// Install and start the peripheral with an accept-all filter, then arm the
    /// interrupt pipeline.
    ///
    /// On failure nothing is retained: the queue is released and the controller
    /// stays [`ControllerState::Uninitialized`].
    pub fn bring_up(&mut self, config: ControllerConfig) -> Result<(), TwaiError<D::Error>> {
        if self.lifecycle != Lifecycle::Uninitialized {
            return Err(TwaiError::InvalidState {
                state: self.state(),
            });
        }

        let baud = config.baud()?;
        let general = config.general();
        let timing = baud.timing();

        if !self.queue.claim() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Event queue already held by another controller");
            return Err(TwaiError::ResourceExhausted);
        }

        let filter = HardwareFilter::ACCEPT_ALL;
        if let Err(err) = self.driver.install(&general, &timing, &filter) {
            self.queue.release();
            return Err(TwaiError::DriverInitFailed(err));
        }
        if let Err(err) = self.driver.start() {
            let _ = self.driver.uninstall();
            self.queue.release();
            return Err(TwaiError::DriverInitFailed(err));
        }

        self.filters.clear();
        self.programmed = filter;
        self.session = Some(Session {
            config,
            baud,
            general,
            timing,
        });
        self.lifecycle = Lifecycle::Running;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "TWAI{} up: {} bit/s, tx={} rx={}",
            general.controller_index,
            baud.bits_per_second(),
            general.tx_pin,
            general.rx_pin
        );
        Ok(())
    }

    /// Release the queue, then stop and uninstall the peripheral.
    ///
    /// Idempotent: does nothing on a controller that is already down.
    pub fn shut_down(&mut self) {
        if self.lifecycle == Lifecycle::Uninitialized {
            return;
        }
        self.queue.release();
        let _ = self.driver.stop();
        let _ = self.driver.uninstall();
        self.session = None;
        self.lifecycle = Lifecycle::Uninitialized;
        self.programmed = HardwareFilter::ACCEPT_ALL;

        #[cfg(feature = "defmt")]
        defmt::info!("TWAI down");
    }

    /// Current state, combining the session lifecycle with a fresh peripheral status.
    pub fn state(&self) -> ControllerState {
        match self.lifecycle {
            Lifecycle::Uninitialized => ControllerState::Uninitialized,
            Lifecycle::Stopped => ControllerState::Stopped,
            Lifecycle::Running => match self.driver.status().state {
                BusState::Running => ControllerState::Running,
                BusState::BusOff => ControllerState::BusOff,
                BusState::Recovering => ControllerState::Recovering,
                BusState::Stopped => ControllerState::Stopped,
            },
        }
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    fn require_running(&self) -> Result<(), TwaiError<D::Error>> {
        match self.lifecycle {
            Lifecycle::Running => Ok(()),
            _ => Err(TwaiError::InvalidState {
                state: self.state(),
            }),
        }
    }

    //==============================================================================BUS
    /// Hand a frame to the peripheral transmit path, waiting up to `timeout` for
    /// space. Success means accepted for transmission, not acknowledged.
    pub fn transmit(
        &mut self,
        frame: &TwaiFrame,
        timeout: Duration,
    ) -> Result<(), TwaiError<D::Error>> {
        self.require_running()?;
        self.driver.transmit(frame, timeout).map_err(|err| {
            #[cfg(feature = "defmt")]
            defmt::trace!("Transmit of {=u32:#x} rejected", frame.raw_id());
            TwaiError::Transmit(err)
        })
    }

    /// Fresh peripheral status. Never cached.
    pub fn status(&self) -> StatusInfo {
        self.driver.status()
    }

    pub fn is_bus_off(&self) -> bool {
        self.status().is_bus_off()
    }

    /// One-shot bus-off recovery request. The controller does not wait for it
    /// to complete; progress shows up in [`state`](Self::state).
    pub fn initiate_recovery(&mut self) -> Result<(), TwaiError<D::Error>> {
        self.require_running()?;
        self.driver.initiate_recovery().map_err(TwaiError::Recovery)?;

        #[cfg(feature = "defmt")]
        defmt::info!("Bus-off recovery requested");
        Ok(())
    }

    //==============================================================================EVENTS
    /// Report bus-off conditions as events from the next interrupt on.
    pub fn enable_error_events(&self, enable: bool) {
        self.queue.set_error_events(enable);
    }

    pub fn error_events_enabled(&self) -> bool {
        self.queue.error_events_enabled()
    }

    /// Consumer handle on the event queue, `None` without a session.
    pub fn event_queue(&self) -> Option<EventReceiver<'a, N>> {
        match self.lifecycle {
            Lifecycle::Uninitialized => None,
            _ => Some(self.queue.receiver()),
        }
    }

    /// Interrupt-side handle bound to this controller's queue.
    pub fn interrupt_pipeline(&self) -> InterruptPipeline<'a, N> {
        InterruptPipeline::new(self.queue)
    }

    //==============================================================================FILTERS
    /// Replace every rule with a single mask rule and reprogram.
    pub fn set_single_filter(
        &mut self,
        code: u32,
        mask: u32,
        extended: bool,
    ) -> Result<(), TwaiError<D::Error>> {
        self.require_session()?;
        self.filters.set_single(FilterRule::mask(code, mask, extended))?;
        self.apply_hardware_filters()
    }

    /// Append a rule and reprogram. A full table is left untouched.
    pub fn add_filter(&mut self, rule: FilterRule) -> Result<(), TwaiError<D::Error>> {
        self.require_session()?;
        self.filters.push(rule)?;
        self.apply_hardware_filters()
    }

    /// Replace the whole table and reprogram. All or nothing.
    pub fn replace_filters(&mut self, rules: &[FilterRule]) -> Result<(), TwaiError<D::Error>> {
        self.require_session()?;
        self.filters.replace(rules)?;
        self.apply_hardware_filters()
    }

    /// Drop every rule and reprogram to accept-all.
    pub fn clear_filters(&mut self) -> Result<(), TwaiError<D::Error>> {
        self.require_session()?;
        self.filters.clear();
        self.apply_hardware_filters()
    }

    /// Tracked rules, in insertion order.
    pub fn filters(&self) -> &FilterTable {
        &self.filters
    }

    /// Primary filter currently programmed in hardware.
    pub fn programmed_filter(&self) -> HardwareFilter {
        self.programmed
    }

    /// How many tracked rules this peripheral variant enforces in hardware.
    pub fn filter_coverage(&self) -> FilterCoverage {
        self.filters.coverage(self.driver.filter_banks().count())
    }

    fn require_session(&self) -> Result<&Session, TwaiError<D::Error>> {
        match (&self.session, self.lifecycle) {
            (Some(session), Lifecycle::Running | Lifecycle::Stopped) => Ok(session),
            _ => Err(TwaiError::InvalidState {
                state: self.state(),
            }),
        }
    }

    /// Stop, reinstall with the table's hardware form, restart.
    ///
    /// Any failure leaves the peripheral stopped; the next successful filter
    /// call brings it back.
    fn apply_hardware_filters(&mut self) -> Result<(), TwaiError<D::Error>> {
        let session = *self.require_session()?;
        self.lifecycle = Lifecycle::Stopped;

        let programmer = FilterProgrammer::new(&mut self.driver, &session.general, &session.timing);
        match programmer.apply(&self.filters) {
            Ok(filter) => {
                self.programmed = filter;
                self.lifecycle = Lifecycle::Running;
                Ok(())
            }
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Filter reprogramming failed, controller stopped");
                Err(TwaiError::FilterApplyFailed(err))
            }
        }
    }

    //==============================================================================TRANSCEIVER
    /// Associate a transceiver. Returns the previous link, if any.
    pub fn link_transceiver(
        &mut self,
        transceiver: &'a dyn TransceiverControl,
    ) -> Option<&'a dyn TransceiverControl> {
        self.transceiver.replace(transceiver)
    }

    /// Forget the linked transceiver.
    pub fn unlink_transceiver(&mut self) -> Option<&'a dyn TransceiverControl> {
        self.transceiver.take()
    }

    pub fn transceiver(&self) -> Option<&'a dyn TransceiverControl> {
        self.transceiver
    }

    //==============================================================================ACCESSORS
    /// Configuration of the current session.
    pub fn config(&self) -> Option<&ControllerConfig> {
        self.session.as_ref().map(|session| &session.config)
    }

    /// Resolved baud preset of the current session.
    pub fn baud_rate(&self) -> Option<BaudRate> {
        self.session.as_ref().map(|session| session.baud)
    }

    pub fn controller_index(&self) -> Option<u8> {
        self.session.as_ref().map(|session| session.config.controller_index)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: TwaiDriver, const N: usize> Drop for TwaiController<'_, D, N> {
    fn drop(&mut self) {
        self.shut_down();
    }
}
