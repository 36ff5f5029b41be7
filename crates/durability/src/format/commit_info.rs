//! Transaction commit envelope.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────┬──────────────┬─────────────┬───────────────────────┐
//! │ TxnId (8)    │ Timestamp (8)│ Count (4)   │ Record * Count        │
//! └──────────────┴──────────────┴─────────────┴───────────────────────┘
//! ```

use crate::codec::{AnyMessage, Message};
use std::any::Any;
use std::fmt;

/// One committed transaction: its id, commit time and the records it wrote.
///
/// The codec reads and writes the id and time as signed 64-bit fields; the
/// bit pattern is kept, so values above `i64::MAX` roundtrip unchanged.
#[derive(Default)]
pub struct TransactionCommitInfo {
    /// Transaction identifier
    pub transaction_id: u64,
    /// Commit time, in whatever unit the caller uses
    pub time: u64,
    /// Records written by the transaction, in commit order
    pub commits: Vec<AnyMessage>,
}

impl TransactionCommitInfo {
    /// Empty commit for a transaction.
    pub fn new(transaction_id: u64, time: u64) -> Self {
        TransactionCommitInfo {
            transaction_id,
            time,
            commits: Vec::new(),
        }
    }

    /// Replace the records.
    pub fn with_commits(mut self, commits: Vec<AnyMessage>) -> Self {
        self.commits = commits;
        self
    }

    /// Append one record.
    pub fn with_commit<M: Message>(mut self, commit: M) -> Self {
        self.commits.push(Box::new(commit));
        self
    }

    /// Append one record in place.
    pub fn push<M: Message>(&mut self, commit: M) {
        self.commits.push(Box::new(commit));
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the transaction wrote nothing.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Record `index` as a `T`, if it is one.
    pub fn commit_as<T: Any>(&self, index: usize) -> Option<&T> {
        self.commits.get(index).and_then(|c| c.downcast_ref::<T>())
    }
}

impl fmt::Debug for TransactionCommitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionCommitInfo")
            .field("transaction_id", &self.transaction_id)
            .field("time", &self.time)
            .field("commits", &self.commits)
            .finish()
    }
}
