//! Cross-cutting scenario and property tests (§8), layered on top of each
//! module's own inline `#[cfg(test)]` unit tests the way `pco`'s
//! `tests/{atomicity,compatibility,low_level,stability}.rs` sit above its
//! per-module unit tests.

mod scenarios;
