//! Contiguous byte region backing a [`GrowableBuffer`](crate::GrowableBuffer).
//!
//! A region is a fixed-size allocation with a position and a limit, the unit
//! that extension and continuation strategies swap in and out.

use strata_core::{Error, Result};

/// Fixed-capacity byte region with a cursor.
///
/// Invariant: `position <= limit <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    bytes: Vec<u8>,
    position: usize,
    limit: usize,
}

impl Region {
    /// Allocate a zeroed region of `capacity` bytes.
    ///
    /// Allocation failure is reported as [`Error::GrowthFailure`].
    pub fn allocate(capacity: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| Error::GrowthFailure {
                requested: capacity,
                max: capacity,
            })?;
        bytes.resize(capacity, 0);
        Ok(Region {
            bytes,
            position: 0,
            limit: capacity,
        })
    }

    /// Wrap existing bytes, positioned at 0 and limited to their length.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let limit = bytes.len();
        Region {
            bytes,
            position: 0,
            limit,
        }
    }

    /// Allocated size.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Cursor position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Usable upper bound.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes between position and limit.
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Move the cursor. Fails if `position > limit`.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(Error::InvalidState(format!(
                "position {} beyond limit {}",
                position, self.limit
            )));
        }
        self.position = position;
        Ok(())
    }

    /// Move the limit, pulling the cursor back if it ends up past it.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity() {
            return Err(Error::InvalidState(format!(
                "limit {} beyond capacity {}",
                limit,
                self.capacity()
            )));
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    /// `[0, position)`.
    pub fn written(&self) -> &[u8] {
        &self.bytes[..self.position]
    }

    /// `[position, limit)`.
    pub fn unread(&self) -> &[u8] {
        &self.bytes[self.position..self.limit]
    }

    /// Whole allocation, for strategies that fill regions directly.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Copy `data` at the cursor and advance. Fails without room.
    pub fn put(&mut self, data: &[u8]) -> Result<()> {
        let end = self.position + data.len();
        if end > self.limit {
            return Err(Error::InvalidState(format!(
                "{} bytes do not fit before limit {}",
                data.len(),
                self.limit
            )));
        }
        self.bytes[self.position..end].copy_from_slice(data);
        self.position = end;
        Ok(())
    }

    /// Overwrite bytes at an absolute offset below the limit. Cursor is untouched.
    pub(crate) fn put_at(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Borrow `len` bytes at the cursor and advance. Caller checks bounds.
    pub(crate) fn take(&mut self, len: usize) -> &[u8] {
        let start = self.position;
        self.position += len;
        &self.bytes[start..start + len]
    }

    /// Reserve `len` bytes at the cursor for writing and advance. Caller checks bounds.
    pub(crate) fn take_mut(&mut self, len: usize) -> &mut [u8] {
        let start = self.position;
        self.position += len;
        &mut self.bytes[start..start + len]
    }

    /// limit := position, position := 0.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    /// position := 0, limit := capacity.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
    }

    /// Move unread bytes to the front; position lands after them and the
    /// limit opens up to capacity, ready to be refilled.
    pub fn compact(&mut self) {
        let unread = self.remaining();
        self.bytes.copy_within(self.position..self.limit, 0);
        self.position = unread;
        self.limit = self.capacity();
    }

    /// Deallocate. The region is consumed so it cannot be touched again.
    pub fn release(self) {
        drop(self.bytes);
    }
}
