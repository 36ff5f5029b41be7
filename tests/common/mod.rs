//! Shared test utilities for the journal integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use strata_journal::prelude::*;

// ============================================================================
// Message types
// ============================================================================

/// Credit to an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub account: u64,
    pub amount: i64,
}

/// Free-form annotation attached to a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    pub author: String,
    pub text: String,
    pub tags: Vec<String>,
}

/// Full state of every account, written as a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub as_of: u64,
    pub balances: Vec<(u64, i64)>,
}

pub const DEPOSIT_ID: u32 = 0x0100;
pub const MEMO_ID: u32 = 0x0101;

// ============================================================================
// Fixtures
// ============================================================================

/// Registry with both record types and the snapshot schema.
pub fn ledger_registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    registry
        .register_with_id(DEPOSIT_ID, BincodeSchema::<Deposit>::new("ledger.Deposit"))
        .unwrap();
    registry
        .register_with_id(MEMO_ID, BincodeSchema::<Memo>::new("ledger.Memo"))
        .unwrap();
    registry
        .register_snapshot(BincodeSchema::<LedgerSnapshot>::new("ledger.Snapshot"))
        .unwrap();
    Arc::new(registry)
}

pub fn deposit(account: u64, amount: i64) -> Deposit {
    Deposit { account, amount }
}

pub fn memo(text: &str) -> Memo {
    Memo {
        author: "teller-3".to_string(),
        text: text.to_string(),
        tags: vec!["audit".to_string(), text.len().to_string()],
    }
}
