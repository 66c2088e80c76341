//! Insertion-ordered table of user acceptance rules. Owns no hardware state.
use crate::error::FilterTableError;
use embedded_can::Id;

/// Maximum number of tracked rules.
pub const FILTER_CAPACITY: usize = 32;

/// Mask covering the 11 bits of a standard identifier.
pub const STANDARD_ID_MASK: u32 = 0x7FF;
/// Mask covering the 29 bits of an extended identifier.
pub const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

//==================================================================================FILTER_KIND
/// How a rule interprets its two numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterKind {
    /// `id` is an acceptance code, `mask_or_end` marks don't-care bits (set bit = ignored).
    Mask,
    /// Accepts exactly `id` or `mask_or_end`.
    List,
    /// Accepts every identifier in `id..=mask_or_end`.
    Range,
}

//==================================================================================FILTER_RULE
/// One acceptance rule.
///
/// Mask rules follow the TWAI convention: a `1` in the mask means "don't care",
/// so a mask of all ones accepts every identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterRule {
    /// Acceptance code, first list entry or range start.
    pub id: u32,
    /// Don't-care mask, second list entry or range end.
    pub mask_or_end: u32,
    pub kind: FilterKind,
    /// `true` for 29-bit identifiers, `false` for 11-bit ones.
    pub extended: bool,
}

impl FilterRule {
    /// Mask rule: accepts ids equal to `code` on every bit cleared in `mask`.
    pub const fn mask(code: u32, mask: u32, extended: bool) -> Self {
        Self {
            id: code,
            mask_or_end: mask,
            kind: FilterKind::Mask,
            extended,
        }
    }

    /// List rule: accepts exactly `first` or `second`.
    pub const fn list(first: u32, second: u32, extended: bool) -> Self {
        Self {
            id: first,
            mask_or_end: second,
            kind: FilterKind::List,
            extended,
        }
    }

    /// Range rule: accepts `start..=end`.
    pub const fn range(start: u32, end: u32, extended: bool) -> Self {
        Self {
            id: start,
            mask_or_end: end,
            kind: FilterKind::Range,
            extended,
        }
    }

    const fn id_bits(&self) -> u32 {
        if self.extended {
            EXTENDED_ID_MASK
        } else {
            STANDARD_ID_MASK
        }
    }

    /// `true` when the identifiers of the rule fit its addressing width.
    /// Mask bits outside the width are don't-care and always allowed.
    pub const fn fits_width(&self) -> bool {
        let bits = self.id_bits();
        match self.kind {
            FilterKind::Mask => self.id & !bits == 0,
            FilterKind::List | FilterKind::Range => {
                self.id & !bits == 0 && self.mask_or_end & !bits == 0
            }
        }
    }

    fn validate(&self) -> Result<(), FilterTableError> {
        if self.fits_width() {
            Ok(())
        } else {
            Err(FilterTableError::IdOutOfRange { id: self.id })
        }
    }

    /// Software evaluation of the rule against a received identifier.
    ///
    /// A rule only ever matches identifiers of its own addressing width.
    pub fn accepts(&self, id: Id) -> bool {
        let raw = match (id, self.extended) {
            (Id::Standard(id), false) => u32::from(id.as_raw()),
            (Id::Extended(id), true) => id.as_raw(),
            _ => return false,
        };
        match self.kind {
            FilterKind::Mask => (raw ^ self.id) & !self.mask_or_end & self.id_bits() == 0,
            FilterKind::List => raw == self.id || raw == self.mask_or_end,
            FilterKind::Range => self.id <= raw && raw <= self.mask_or_end,
        }
    }
}

//==================================================================================FILTER_TABLE
/// Fixed-capacity, insertion-ordered rule table.
#[derive(Debug, Clone)]
pub struct FilterTable {
    rules: [FilterRule; FILTER_CAPACITY],
    len: usize,
}

impl Default for FilterTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterTable {
    const EMPTY_SLOT: FilterRule = FilterRule::mask(0, u32::MAX, false);

    /// Create an empty table (accept-all).
    pub const fn new() -> Self {
        Self {
            rules: [Self::EMPTY_SLOT; FILTER_CAPACITY],
            len: 0,
        }
    }

    /// Number of tracked rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == FILTER_CAPACITY
    }

    /// Tracked rules in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[FilterRule] {
        &self.rules[..self.len]
    }

    /// Rule destined for the primary hardware bank.
    pub fn primary(&self) -> Option<&FilterRule> {
        self.as_slice().first()
    }

    /// Rule destined for the secondary hardware bank, where one exists.
    pub fn secondary(&self) -> Option<&FilterRule> {
        self.as_slice().get(1)
    }

    /// Append a rule. Fails without touching the table once it is full or when
    /// the rule does not fit its addressing width.
    pub fn push(&mut self, rule: FilterRule) -> Result<(), FilterTableError> {
        if self.is_full() {
            return Err(FilterTableError::CapacityExceeded);
        }
        rule.validate()?;
        self.rules[self.len] = rule;
        self.len += 1;
        Ok(())
    }

    /// Replace every rule with `rules`, all or nothing.
    pub fn replace(&mut self, rules: &[FilterRule]) -> Result<(), FilterTableError> {
        if rules.len() > FILTER_CAPACITY {
            return Err(FilterTableError::InvalidArgument {
                requested: rules.len(),
            });
        }
        for rule in rules {
            rule.validate()?;
        }
        self.clear();
        self.rules[..rules.len()].copy_from_slice(rules);
        self.len = rules.len();
        Ok(())
    }

    /// Replace the table with a single rule. An out-of-range rule leaves the
    /// table untouched.
    pub fn set_single(&mut self, rule: FilterRule) -> Result<(), FilterTableError> {
        rule.validate()?;
        self.clear();
        self.rules[0] = rule;
        self.len = 1;
        Ok(())
    }

    /// Drop every rule.
    pub fn clear(&mut self) {
        self.rules = [Self::EMPTY_SLOT; FILTER_CAPACITY];
        self.len = 0;
    }

    /// Whether the logical table accepts `id`: any rule matches, or the table is empty.
    pub fn accepts(&self, id: Id) -> bool {
        self.is_empty() || self.as_slice().iter().any(|rule| rule.accepts(id))
    }

    /// Split of tracked rules between hardware enforcement and software tracking.
    pub fn coverage(&self, hardware_banks: usize) -> FilterCoverage {
        let enforced = self
            .as_slice()
            .iter()
            .take(hardware_banks)
            .filter(|rule| rule.kind == FilterKind::Mask)
            .count();
        FilterCoverage {
            tracked: self.len,
            enforced,
        }
    }
}

//==================================================================================COVERAGE
/// How much of the logical table the hardware actually enforces.
///
/// Only mask rules occupying a hardware bank are enforced. List and range rules
/// program an open filter, and rules past the available banks are tracked only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterCoverage {
    /// Rules held in the table.
    pub tracked: usize,
    /// Rules realized by a hardware acceptance filter.
    pub enforced: usize,
}

impl FilterCoverage {
    /// Rules the hardware does not enforce.
    pub fn unenforced(&self) -> usize {
        self.tracked - self.enforced
    }

    /// `true` when hardware filtering is equivalent to the logical table.
    pub fn is_complete(&self) -> bool {
        self.enforced == self.tracked
    }
}
