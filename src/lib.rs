//! RSS release feed reconciliation with duplicate-episode suppression
//!
//! The crate ingests feed entries describing release files, parses their
//! free-text names into a structured (series, season, episode) identity, and
//! consults the persisted acquisition ledger to decide whether a candidate
//! duplicates an episode that was already downloaded — regardless of release
//! group, resolution, or container.

pub mod config;
pub mod db;
pub mod services;
