//! Unit tests for baud rate resolution and the configuration builder.
use super::*;

//==================================================================================BAUD_RATE
#[test]
/// Every preset resolves from its own nominal rate.
fn test_presets_resolve_from_nominal_rate() {
    for baud in BaudRate::ALL {
        assert_eq!(BaudRate::try_from(baud.bits_per_second()), Ok(baud));
    }
}

#[test]
/// Close-but-not-exact rates are refused rather than rounded.
fn test_unsupported_rates_are_rejected() {
    for rate in [0, 50_000, 500_001, 499_999, 2_000_000, 83_333] {
        assert_eq!(
            BaudRate::from_bits_per_second(rate),
            Err(ConfigError::UnsupportedBaudRate(rate))
        );
    }
}

#[test]
/// Spot-check the timing table against the 80 MHz reference values.
fn test_timing_table() {
    let t = BaudRate::B500K.timing();
    assert_eq!((t.brp, t.tseg_1, t.tseg_2, t.sjw), (8, 15, 4, 3));
    assert!(!t.triple_sampling);

    let t = BaudRate::B800K.timing();
    assert_eq!((t.brp, t.tseg_1, t.tseg_2), (4, 16, 8));

    let t = BaudRate::B100K.timing();
    assert_eq!(t.brp, 40);
}

#[test]
/// 80 MHz / (brp * (1 + tseg_1 + tseg_2)) must give back the nominal rate.
fn test_timing_matches_nominal_rate() {
    const APB_HZ: u32 = 80_000_000;
    for baud in BaudRate::ALL {
        let t = baud.timing();
        let quanta = 1 + t.tseg_1 as u32 + t.tseg_2 as u32;
        assert_eq!(APB_HZ / (t.brp * quanta), baud.bits_per_second());
    }
}

//==================================================================================CONFIG
#[test]
/// Defaults mirror the usual ESP32 wiring.
fn test_default_config() {
    let config = ControllerConfig::default();
    assert_eq!(config.tx_pin, 21);
    assert_eq!(config.rx_pin, 22);
    assert_eq!(config.baud_rate, 500_000);
    assert_eq!(config.mode, TwaiMode::Normal);
    assert_eq!(config.controller_index, 0);
    assert_eq!(config.baud(), Ok(BaudRate::B500K));
}

#[test]
/// The builder only validates the rate when asked to resolve it.
fn test_builder_and_general() {
    let config = ControllerConfig::builder()
        .tx_pin(5)
        .rx_pin(4)
        .preset(BaudRate::B250K)
        .mode(TwaiMode::ListenOnly)
        .controller_index(1)
        .rx_queue_len(12)
        .build();

    let general = config.general();
    assert_eq!(general.tx_pin, 5);
    assert_eq!(general.rx_pin, 4);
    assert_eq!(general.mode, TwaiMode::ListenOnly);
    assert_eq!(general.controller_index, 1);
    assert_eq!(general.rx_queue_len, 12);
    assert_eq!(general.tx_queue_len, DEFAULT_PERIPHERAL_QUEUE_LEN);

    let bad = ControllerConfig::builder().baud_rate(42).build();
    assert_eq!(bad.baud(), Err(ConfigError::UnsupportedBaudRate(42)));
}
