//! Bring-up configuration for the TWAI controller: pins, operating mode and the
//! fixed set of supported bit-timing presets.
//!
//! The core never computes bit timings. A requested rate either matches one of
//! the presets of [`BaudRate`] or bring-up is refused; rates are never
//! approximated.
//!
//! | Preset  | brp | tseg_1 | tseg_2 | sjw |
//! |---------|-----|--------|--------|-----|
//! | 100 k   | 40  | 15     | 4      | 3   |
//! | 125 k   | 32  | 15     | 4      | 3   |
//! | 250 k   | 16  | 15     | 4      | 3   |
//! | 500 k   | 8   | 15     | 4      | 3   |
//! | 800 k   | 4   | 16     | 8      | 3   |
//! | 1 M     | 4   | 15     | 4      | 3   |
//!
//! Values assume the 80 MHz APB source clock of the TWAI peripheral.
use crate::error::ConfigError;

/// Default TX GPIO.
pub const DEFAULT_TX_PIN: u8 = 21;
/// Default RX GPIO.
pub const DEFAULT_RX_PIN: u8 = 22;
/// Default bus speed (bit/s).
pub const DEFAULT_BAUD_RATE: u32 = 500_000;
/// Default depth of the peripheral's own transmit and receive queues.
pub const DEFAULT_PERIPHERAL_QUEUE_LEN: u32 = 5;

//==================================================================================BAUD_RATE
/// Supported bus speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudRate {
    B100K,
    B125K,
    B250K,
    #[default]
    B500K,
    B800K,
    B1M,
}

impl BaudRate {
    /// Every supported preset, slowest first.
    pub const ALL: [BaudRate; 6] = [
        BaudRate::B100K,
        BaudRate::B125K,
        BaudRate::B250K,
        BaudRate::B500K,
        BaudRate::B800K,
        BaudRate::B1M,
    ];

    /// Resolve a raw rate in bit/s. Only exact preset values are accepted.
    pub const fn from_bits_per_second(rate: u32) -> Result<Self, ConfigError> {
        match rate {
            100_000 => Ok(BaudRate::B100K),
            125_000 => Ok(BaudRate::B125K),
            250_000 => Ok(BaudRate::B250K),
            500_000 => Ok(BaudRate::B500K),
            800_000 => Ok(BaudRate::B800K),
            1_000_000 => Ok(BaudRate::B1M),
            other => Err(ConfigError::UnsupportedBaudRate(other)),
        }
    }

    /// Nominal rate in bit/s.
    pub const fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B100K => 100_000,
            BaudRate::B125K => 125_000,
            BaudRate::B250K => 250_000,
            BaudRate::B500K => 500_000,
            BaudRate::B800K => 800_000,
            BaudRate::B1M => 1_000_000,
        }
    }

    /// Bit-timing parameters for this preset.
    pub const fn timing(self) -> TimingConfig {
        match self {
            BaudRate::B100K => TimingConfig::preset(40, 15, 4),
            BaudRate::B125K => TimingConfig::preset(32, 15, 4),
            BaudRate::B250K => TimingConfig::preset(16, 15, 4),
            BaudRate::B500K => TimingConfig::preset(8, 15, 4),
            BaudRate::B800K => TimingConfig::preset(4, 16, 8),
            BaudRate::B1M => TimingConfig::preset(4, 15, 4),
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = ConfigError;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        Self::from_bits_per_second(rate)
    }
}

//==================================================================================TIMING
/// Bit-timing request handed to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Baud rate prescaler.
    pub brp: u32,
    /// Timing segment 1 (time quanta).
    pub tseg_1: u8,
    /// Timing segment 2 (time quanta).
    pub tseg_2: u8,
    /// Synchronization jump width.
    pub sjw: u8,
    /// Sample each bit three times.
    pub triple_sampling: bool,
}

impl TimingConfig {
    const fn preset(brp: u32, tseg_1: u8, tseg_2: u8) -> Self {
        Self {
            brp,
            tseg_1,
            tseg_2,
            sjw: 3,
            triple_sampling: false,
        }
    }
}

//==================================================================================MODE
/// Controller operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwaiMode {
    /// Transmit, receive and acknowledge.
    #[default]
    Normal,
    /// Transmit without requiring acknowledgement (self-test).
    NoAck,
    /// Receive only; never drives the bus, not even for acknowledgement.
    ListenOnly,
}

//==================================================================================GENERAL
/// Pin, mode and queue request handed to the platform at install time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeneralConfig {
    pub mode: TwaiMode,
    pub tx_pin: u8,
    pub rx_pin: u8,
    pub controller_index: u8,
    /// Depth of the peripheral's transmit queue.
    pub tx_queue_len: u32,
    /// Depth of the peripheral's receive queue.
    pub rx_queue_len: u32,
}

//==================================================================================CONTROLLER_CONFIG
/// Per-session controller configuration, held from bring-up to shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    pub tx_pin: u8,
    pub rx_pin: u8,
    /// Raw bus speed in bit/s; validated against [`BaudRate`] at bring-up.
    pub baud_rate: u32,
    pub mode: TwaiMode,
    /// Controller index on multi-controller chips. Informational only.
    pub controller_index: u8,
    pub tx_queue_len: u32,
    pub rx_queue_len: u32,
}

impl ControllerConfig {
    /// Create a builder pre-loaded with the defaults.
    pub const fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::new()
    }

    /// Resolve the configured rate into a preset.
    pub const fn baud(&self) -> Result<BaudRate, ConfigError> {
        BaudRate::from_bits_per_second(self.baud_rate)
    }

    /// Pin/mode/queue part of the install request.
    pub const fn general(&self) -> GeneralConfig {
        GeneralConfig {
            mode: self.mode,
            tx_pin: self.tx_pin,
            rx_pin: self.rx_pin,
            controller_index: self.controller_index,
            tx_queue_len: self.tx_queue_len,
            rx_queue_len: self.rx_queue_len,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfigBuilder::new().build()
    }
}

/// Fluent builder for [`ControllerConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    /// Start from the defaults (TX 21, RX 22, 500 kbit/s, normal mode, controller 0).
    pub const fn new() -> Self {
        Self {
            config: ControllerConfig {
                tx_pin: DEFAULT_TX_PIN,
                rx_pin: DEFAULT_RX_PIN,
                baud_rate: DEFAULT_BAUD_RATE,
                mode: TwaiMode::Normal,
                controller_index: 0,
                tx_queue_len: DEFAULT_PERIPHERAL_QUEUE_LEN,
                rx_queue_len: DEFAULT_PERIPHERAL_QUEUE_LEN,
            },
        }
    }

    pub const fn tx_pin(mut self, pin: u8) -> Self {
        self.config.tx_pin = pin;
        self
    }

    pub const fn rx_pin(mut self, pin: u8) -> Self {
        self.config.rx_pin = pin;
        self
    }

    /// Raw rate in bit/s. Not validated until bring-up.
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.config.baud_rate = rate;
        self
    }

    /// Select one of the presets directly.
    pub const fn preset(mut self, baud: BaudRate) -> Self {
        self.config.baud_rate = baud.bits_per_second();
        self
    }

    pub const fn mode(mut self, mode: TwaiMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub const fn controller_index(mut self, index: u8) -> Self {
        self.config.controller_index = index;
        self
    }

    pub const fn tx_queue_len(mut self, len: u32) -> Self {
        self.config.tx_queue_len = len;
        self
    }

    pub const fn rx_queue_len(mut self, len: u32) -> Self {
        self.config.rx_queue_len = len;
        self
    }

    pub const fn build(self) -> ControllerConfig {
        self.config
    }
}

impl Default for ControllerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
