//! Score log data types
//!
//! The header and records are persisted as separate keys. Counts and ids
//! are stored as 2-byte little-endian values, times as 4-byte
//! little-endian values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use reflex_hal::StorageKey;

use super::ScoreError;

/// Average reported when a record inside `[0, entry_count)` is missing
pub const AVERAGE_UNAVAILABLE: f64 = 9999.0;

/// Value stored under [`StorageKey::Initialised`]
pub const INITIALISED_MARKER: i32 = 1;

/// Persisted score log header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreHeader {
    /// Number of records written since the last reset
    pub entry_count: u16,
    /// Id of the record with the lowest time
    ///
    /// Meaningless while `entry_count` is zero.
    pub best_time_id: u16,
}

impl ScoreHeader {
    /// Header written by a reset
    pub const EMPTY: Self = Self {
        entry_count: 0,
        best_time_id: 0,
    };

    /// Id the next record will be stored under
    pub const fn next_entry_id(&self) -> u16 {
        self.entry_count
    }

    /// Check if no records have been written since the last reset
    pub const fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}

/// A single finishing time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreRecord {
    /// Record id, also the persisted key
    pub id: u16,
    /// Finishing time (lower is better)
    pub time: u32,
}

impl ScoreRecord {
    /// Create a new record
    pub const fn new(id: u16, time: u32) -> Self {
        Self { id, time }
    }

    /// Key this record is persisted under
    pub const fn key(&self) -> StorageKey {
        StorageKey::Record(self.id)
    }
}

pub(crate) fn decode_u16(key: StorageKey, bytes: &[u8]) -> Result<u16, ScoreError> {
    match bytes {
        [lo, hi] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(ScoreError::Corrupted(key)),
    }
}

pub(crate) fn decode_u32(key: StorageKey, bytes: &[u8]) -> Result<u32, ScoreError> {
    let raw: [u8; 4] = bytes.try_into().map_err(|_| ScoreError::Corrupted(key))?;
    Ok(u32::from_le_bytes(raw))
}
