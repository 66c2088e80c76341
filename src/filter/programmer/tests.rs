//! Unit tests for the rule → hardware filter translation.
use super::*;

#[test]
/// Standard ids are aligned into the top eleven bits of the filter field.
fn test_standard_mask_rule_is_shifted() {
    let filter = HardwareFilter::from_rule(&FilterRule::mask(0x123, 0x00F, false));
    assert_eq!(filter.acceptance_code, 0x123 << 21);
    assert_eq!(filter.acceptance_mask, 0x00F << 21);
    assert!(filter.single_filter);
}

#[test]
/// Extended ids are programmed as-is.
fn test_extended_mask_rule_is_unshifted() {
    let filter = HardwareFilter::from_rule(&FilterRule::mask(0x123, 0xFF, true));
    assert_eq!(filter.acceptance_code, 0x123);
    assert_eq!(filter.acceptance_mask, 0xFF);
}

#[test]
/// List and range rules open the mask completely.
fn test_non_mask_rules_fall_back_to_widest_mask() {
    let range = HardwareFilter::from_rule(&FilterRule::range(0x100, 0x1FF, false));
    assert_eq!(range.acceptance_code, 0x100 << 21);
    assert_eq!(range.acceptance_mask, u32::MAX);
    assert!(range.is_accept_all());

    let list = HardwareFilter::from_rule(&FilterRule::list(0x10, 0x20, true));
    assert_eq!(list.acceptance_code, 0x10);
    assert!(list.is_accept_all());
}

#[test]
/// Only the first rule of a table reaches the primary bank.
fn test_for_table_uses_first_rule() {
    let mut table = FilterTable::new();
    assert_eq!(HardwareFilter::for_table(&table), HardwareFilter::ACCEPT_ALL);

    table.push(FilterRule::mask(0x1, 0, false)).unwrap();
    table.push(FilterRule::mask(0x2, 0, false)).unwrap();
    assert_eq!(
        HardwareFilter::for_table(&table).acceptance_code,
        0x1 << STANDARD_ID_SHIFT
    );
}

#[test]
fn test_bank_count() {
    assert_eq!(FilterBanks::Single.count(), 1);
    assert_eq!(FilterBanks::Dual.count(), 2);
    assert_eq!(FilterBanks::default(), FilterBanks::Single);
}
