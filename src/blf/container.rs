//! Bounded staging buffer for log container payloads.
//!
//! Encoded records accumulate here until the configured capacity would be
//! exceeded, at which point the writer drains the buffer into one log
//! container record. The buffer owns all offset bookkeeping: callers can
//! only append whole records, read the staged bytes, and clear after a
//! successful drain.

use crate::error::{BlfError, Result};

/// Default staging capacity. One container per ~340 classic records.
pub const DEFAULT_CONTAINER_CAPACITY: usize = 16 * 1024;

/// Smallest accepted capacity; leaves headroom above the largest record.
pub const MIN_CONTAINER_CAPACITY: usize = 1024;

/// Fixed-capacity staging area for encoded records.
///
/// A record is either staged whole or not at all; the buffer never splits a
/// record across two containers.
#[derive(Debug)]
pub struct ContainerBuffer {
    staged: Vec<u8>,
    capacity: usize,
}

impl ContainerBuffer {
    /// Creates a buffer with the given capacity in bytes.
    ///
    /// Capacities below [`MIN_CONTAINER_CAPACITY`] are a configuration
    /// error: they could make a legal record unstageable.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity < MIN_CONTAINER_CAPACITY {
            return Err(BlfError::ContainerCapacity {
                requested: capacity,
                minimum: MIN_CONTAINER_CAPACITY,
            });
        }
        Ok(Self { staged: Vec::with_capacity(capacity), capacity })
    }

    /// Stages `record`, or reports that the buffer must drain first.
    ///
    /// Returns `Ok(true)` when the record was staged, `Ok(false)` when it
    /// would overflow the remaining space (nothing is staged; flush and
    /// retry). A record at least as large as the whole capacity can never be
    /// staged and is a hard error.
    pub fn try_append(&mut self, record: &[u8]) -> Result<bool> {
        if record.len() >= self.capacity {
            return Err(BlfError::RecordTooLarge {
                size: record.len(),
                capacity: self.capacity,
            });
        }
        if record.len() > self.free() {
            return Ok(false);
        }
        self.staged.extend_from_slice(record);
        Ok(true)
    }

    /// Bytes staged so far, in append order.
    pub fn staged(&self) -> &[u8] {
        &self.staged
    }

    /// Empties the buffer. Call only after the staged bytes reached the
    /// sink; a failed flush must keep them for the retry.
    pub fn clear(&mut self) {
        self.staged.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remaining space before the next append overflows.
    pub fn free(&self) -> usize {
        self.capacity - self.staged.len()
    }
}
