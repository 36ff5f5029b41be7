//! Integration tests for the journal codec.
//!
//! These tests drive the public facade end to end: registering types,
//! encoding commits and snapshots into both buffer backends, and decoding
//! them back on other workers.

#[path = "../common/mod.rs"]
mod common;

mod backends;
mod scenarios;
mod workers;
