//! Physical-layer transceiver control.
//!
//! Maps a transceiver part family to the pin levels of its mode transitions and
//! provides a best-effort connectivity self-test. Pins are `embedded-hal` 1.0
//! digital pins and live behind a critical-section mutex, so every method takes
//! `&self` and a transceiver can be shared with a controller through
//! [`TransceiverControl`].
//!
//! | family        | normal              | standby   | silent(b)  |
//! |---------------|---------------------|-----------|------------|
//! | TJA1050       | STBY low, EN high   | STBY high | STBY = b   |
//! | MCP2551       | STBY high           | STBY low  | -          |
//! | SN65HVD23x    | -                   | -         | -          |
//! | user defined  | -                   | -         | -          |
use core::cell::RefCell;
use core::convert::Infallible;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, ErrorType, InputPin, OutputPin};

use crate::error::TransceiverError;

/// Settle time before reading back a toggled standby pin.
pub const SELF_TEST_SETTLE_US: u32 = 50;

//==================================================================================TRANSCEIVER_KIND
/// Supported transceiver part families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransceiverKind {
    Tja1050,
    Mcp2551,
    /// Pins are taken but mode calls do nothing.
    Sn65hvd23x,
    /// Pins are taken but mode calls do nothing.
    UserDefined,
}

//==================================================================================NO_PIN
/// Placeholder for a pin that is not wired. Writes are accepted and ignored,
/// reads report low.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

//==================================================================================CONFIG
/// Transceiver wiring.
///
/// The standby pin must be readable back (`InputPin`) for the connectivity check.
pub struct TransceiverConfig<S, EN> {
    pub kind: TransceiverKind,
    pub standby_pin: Option<S>,
    pub enable_pin: Option<EN>,
    /// Opaque bytes for user-defined parts; not interpreted.
    pub custom_init: [u8; 4],
}

impl<S, EN> TransceiverConfig<S, EN> {
    /// Configuration with no pins attached.
    pub const fn new(kind: TransceiverKind) -> Self {
        Self {
            kind,
            standby_pin: None,
            enable_pin: None,
            custom_init: [0; 4],
        }
    }

    pub fn with_standby_pin(mut self, pin: S) -> Self {
        self.standby_pin = Some(pin);
        self
    }

    pub fn with_enable_pin(mut self, pin: EN) -> Self {
        self.enable_pin = Some(pin);
        self
    }

    pub fn with_custom_init(mut self, bytes: [u8; 4]) -> Self {
        self.custom_init = bytes;
        self
    }
}

//==================================================================================CONTROL_TRAIT
/// Narrow interface a controller uses to reach its linked transceiver.
pub trait TransceiverControl {
    fn set_normal_mode(&self) -> Result<(), TransceiverError>;
    fn set_standby_mode(&self) -> Result<(), TransceiverError>;
    fn set_silent_mode(&self, silent: bool) -> Result<(), TransceiverError>;
    /// Best-effort link check. `false` means "could not confirm", not "broken".
    fn is_connected(&self, delay: &mut dyn DelayNs) -> bool;
}

//==================================================================================TRANSCEIVER
/// A transceiver and the pins driving it.
pub struct Transceiver<S, EN = NoPin> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<TransceiverConfig<S, EN>>>>,
}

impl<S, EN> Default for Transceiver<S, EN> {
    fn default() -> Self {
        Self::new()
    }
}

fn write<P: OutputPin>(pin: &mut Option<P>, high: bool) -> Result<(), TransceiverError> {
    let Some(pin) = pin.as_mut() else {
        return Ok(());
    };
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|err| TransceiverError::Pin(err.kind()))
}

impl<S, EN> Transceiver<S, EN> {
    /// Unconfigured transceiver; suitable for a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().is_some())
    }

    pub fn kind(&self) -> Option<TransceiverKind> {
        self.inner
            .lock(|cell| cell.borrow().as_ref().map(|config| config.kind))
    }

    /// Take the pins back, leaving the transceiver unconfigured.
    pub fn release(&self) -> Option<TransceiverConfig<S, EN>> {
        self.inner.lock(|cell| cell.borrow_mut().take())
    }
}

impl<S: OutputPin + InputPin, EN: OutputPin> Transceiver<S, EN> {
    /// Take the pins and drive the family's initial levels.
    ///
    /// A second call replaces the previous configuration, whose pins are dropped.
    pub fn configure(&self, config: TransceiverConfig<S, EN>) -> Result<(), TransceiverError> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Transceiver configured as {}", config.kind);

        self.inner.lock(|cell| {
            let mut slot = cell.borrow_mut();
            let config = slot.insert(config);
            Self::drive_normal(config)
        })
    }

    /// TJA1050 and MCP2551 share their init levels with normal mode.
    fn drive_normal(config: &mut TransceiverConfig<S, EN>) -> Result<(), TransceiverError> {
        match config.kind {
            TransceiverKind::Tja1050 => {
                write(&mut config.standby_pin, false)?;
                write(&mut config.enable_pin, true)
            }
            TransceiverKind::Mcp2551 => write(&mut config.standby_pin, true),
            TransceiverKind::Sn65hvd23x | TransceiverKind::UserDefined => Ok(()),
        }
    }

    fn with_config<R>(
        &self,
        f: impl FnOnce(&mut TransceiverConfig<S, EN>) -> Result<R, TransceiverError>,
    ) -> Result<R, TransceiverError> {
        self.inner.lock(|cell| match cell.borrow_mut().as_mut() {
            Some(config) => f(config),
            None => Err(TransceiverError::NotConfigured),
        })
    }

    /// Toggle STBY, let it settle, read it back and restore it.
    fn probe_standby(pin: &mut S, delay: &mut dyn DelayNs) -> Option<bool> {
        let original = pin.is_high().ok()?;
        let toggled = if original { pin.set_low() } else { pin.set_high() };
        toggled.ok()?;
        delay.delay_us(SELF_TEST_SETTLE_US);
        let observed = pin.is_high().ok();
        let restored = if original { pin.set_high() } else { pin.set_low() };
        restored.ok()?;
        Some(observed? != original)
    }
}

impl<S: OutputPin + InputPin, EN: OutputPin> TransceiverControl for Transceiver<S, EN> {
    fn set_normal_mode(&self) -> Result<(), TransceiverError> {
        self.with_config(Self::drive_normal)
    }

    fn set_standby_mode(&self) -> Result<(), TransceiverError> {
        self.with_config(|config| match config.kind {
            TransceiverKind::Tja1050 => write(&mut config.standby_pin, true),
            TransceiverKind::Mcp2551 => write(&mut config.standby_pin, false),
            TransceiverKind::Sn65hvd23x | TransceiverKind::UserDefined => Ok(()),
        })
    }

    fn set_silent_mode(&self, silent: bool) -> Result<(), TransceiverError> {
        self.with_config(|config| match config.kind {
            TransceiverKind::Tja1050 => write(&mut config.standby_pin, silent),
            _ => Ok(()),
        })
    }

    fn is_connected(&self, delay: &mut dyn DelayNs) -> bool {
        self.inner.lock(|cell| {
            let mut slot = cell.borrow_mut();
            let Some(config) = slot.as_mut() else {
                return false;
            };

            if let Some(pin) = config.standby_pin.as_mut() {
                if pin.is_high().is_err() {
                    return false;
                }
            }

            if config.kind == TransceiverKind::Tja1050 {
                let responded = config
                    .standby_pin
                    .as_mut()
                    .and_then(|pin| Self::probe_standby(pin, delay))
                    .unwrap_or(false);
                if !responded {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("TJA1050 standby pin did not follow the toggle");
                    return false;
                }
            }

            true
        })
    }
}
