//! Translation of the filter table into the TWAI acceptance filter and the
//! stop → reinstall → restart sequence that applies it to live hardware.
//!
//! The TWAI filter compares a 32-bit acceptance code against the incoming
//! identifier field under a 32-bit mask (set bit = don't care). Standard ids sit
//! in the top 11 bits of that field, so their code and mask are shifted left by
//! [`STANDARD_ID_SHIFT`]; extended ids are programmed unshifted.
//!
//! Reprogramming is destructive: the controller is stopped and uninstalled for
//! the duration of the sequence and frames arriving in that window are lost.
use crate::config::{GeneralConfig, TimingConfig};
use crate::filter::table::{FilterKind, FilterRule, FilterTable};
use crate::platform::traits::twai_driver::TwaiDriver;

/// Left shift aligning an 11-bit identifier inside the 32-bit filter field.
pub const STANDARD_ID_SHIFT: u32 = 21;

//==================================================================================FILTER_BANKS
/// Acceptance filter banks present on a peripheral variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterBanks {
    /// One acceptance filter (original ESP32, S2, S3).
    #[default]
    Single,
    /// A second, independently programmable filter (C3, C6).
    Dual,
}

impl FilterBanks {
    /// Number of rules hardware can realize.
    pub const fn count(self) -> usize {
        match self {
            FilterBanks::Single => 1,
            FilterBanks::Dual => 2,
        }
    }
}

//==================================================================================HARDWARE_FILTER
/// Acceptance filter in the peripheral's native representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareFilter {
    pub acceptance_code: u32,
    /// Set bits are ignored during comparison.
    pub acceptance_mask: u32,
    /// Single-filter mode (one 32-bit comparison instead of two 16-bit ones).
    pub single_filter: bool,
}

impl HardwareFilter {
    /// Filter accepting every frame.
    pub const ACCEPT_ALL: HardwareFilter = HardwareFilter {
        acceptance_code: 0,
        acceptance_mask: u32::MAX,
        single_filter: true,
    };

    /// Hardware form of a single rule.
    ///
    /// List and range rules cannot be expressed as one code/mask pair; they keep
    /// the aligned code but open the mask completely, which accepts everything in
    /// that bank. Software filtering has to finish the job for those.
    pub const fn from_rule(rule: &FilterRule) -> Self {
        let shift = if rule.extended { 0 } else { STANDARD_ID_SHIFT };
        let acceptance_mask = match rule.kind {
            FilterKind::Mask => rule.mask_or_end << shift,
            FilterKind::List | FilterKind::Range => u32::MAX,
        };
        Self {
            acceptance_code: rule.id << shift,
            acceptance_mask,
            single_filter: true,
        }
    }

    /// Primary-bank filter for a whole table: its first rule, or accept-all.
    pub fn for_table(table: &FilterTable) -> Self {
        table.primary().map_or(Self::ACCEPT_ALL, Self::from_rule)
    }

    /// `true` when this filter lets every frame through.
    pub const fn is_accept_all(&self) -> bool {
        self.acceptance_mask == u32::MAX
    }
}

impl Default for HardwareFilter {
    fn default() -> Self {
        Self::ACCEPT_ALL
    }
}

//==================================================================================PROGRAMMER
/// Runs the reprogramming sequence against a driver.
///
/// The sequence is finite and not restartable: a failure part-way leaves the
/// peripheral stopped, and the previous filter is never reinstalled
/// automatically.
pub(crate) struct FilterProgrammer<'a, D: TwaiDriver> {
    driver: &'a mut D,
    general: &'a GeneralConfig,
    timing: &'a TimingConfig,
}

impl<'a, D: TwaiDriver> FilterProgrammer<'a, D> {
    pub(crate) fn new(driver: &'a mut D, general: &'a GeneralConfig, timing: &'a TimingConfig) -> Self {
        Self {
            driver,
            general,
            timing,
        }
    }

    /// Apply `table` and return the primary filter that was programmed.
    pub(crate) fn apply(self, table: &FilterTable) -> Result<HardwareFilter, D::Error> {
        // 1. Stop and release. Either call may fail on an already stopped or
        //    uninstalled peripheral; the reinstall below is the real check.
        let _ = self.driver.stop();
        let _ = self.driver.uninstall();

        // 2-3. First rule only, accept-all for an empty table.
        let primary = HardwareFilter::for_table(table);

        // 4. Reinstall with the new filter.
        self.driver.install(self.general, self.timing, &primary)?;

        if self.driver.filter_banks() == FilterBanks::Dual {
            if let Some(rule) = table.secondary() {
                let secondary = HardwareFilter::from_rule(rule);
                if self.driver.write_secondary_filter(&secondary).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Secondary filter bank rejected, primary bank only");
                }
            }
        }

        // 5. Restart; success only once the controller runs again.
        self.driver.start()?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Filters applied: code={=u32:#x} mask={=u32:#x} ({} rules tracked)",
            primary.acceptance_code,
            primary.acceptance_mask,
            table.len()
        );

        Ok(primary)
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
