//! Acceptance filtering: the logical rule table owned by the controller and the
//! programmer that turns it into the peripheral's single acceptance filter.
//!
//! # Hardware asymmetry
//!
//! The table tracks up to [`FILTER_CAPACITY`](table::FILTER_CAPACITY) rules, but the
//! TWAI peripheral only has one acceptance filter (two on dual-bank variants).
//! Only the first rule reaches the primary bank; the second reaches the secondary
//! bank where one exists. Later rules are tracked but not enforced by hardware.
//! [`FilterCoverage`](table::FilterCoverage) reports the split, and
//! [`FilterTable::accepts`](table::FilterTable::accepts) evaluates every rule in
//! software for consumers that need the full table enforced.
pub mod programmer;
pub mod table;
