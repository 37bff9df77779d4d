//! Key-value storage abstractions
//!
//! Provides the persistent string-keyed byte store the score log is built
//! on. Platforms back it with flash; [`MemoryStore`] backs it with RAM for
//! host simulation and tests.

use heapless::{LinearMap, Vec};

/// Longest serialized key (`"Initialised"`)
pub const MAX_KEY_SIZE: usize = 11;

/// Largest value the game ever persists
pub const MAX_VALUE_SIZE: usize = 8;

const INITIALISED_KEY: &[u8] = b"Initialised";
const ENTRY_COUNT_KEY: &[u8] = b"NumEntries";
const BEST_TIME_ID_KEY: &[u8] = b"BestTimeID";

/// Keys persisted by the firmware
///
/// Header keys are stored under fixed ASCII names. Score records are
/// stored under the raw two little-endian bytes of their id, so record
/// keys never collide with the (longer) header names.
///
/// Backends store keys in this serialized form (see
/// [`serialize_into`](Self::serialize_into)), so a log written by one
/// backend reads back on any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    /// Sentinel written once the score header has been laid down
    Initialised,
    /// Number of score records written since the last reset
    EntryCount,
    /// Id of the record holding the fastest time
    BestTimeId,
    /// A single score record
    Record(u16),
}

impl StorageKey {
    /// Serialize the key into `buffer`
    ///
    /// Returns the number of bytes written.
    pub fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let id_bytes;
        let bytes: &[u8] = match self {
            StorageKey::Initialised => INITIALISED_KEY,
            StorageKey::EntryCount => ENTRY_COUNT_KEY,
            StorageKey::BestTimeId => BEST_TIME_ID_KEY,
            StorageKey::Record(id) => {
                id_bytes = id.to_le_bytes();
                &id_bytes
            }
        };

        if buffer.len() < bytes.len() {
            return Err(StorageError::BufferTooSmall);
        }
        buffer[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Serialized form of the key
    pub fn to_bytes(&self) -> Vec<u8, MAX_KEY_SIZE> {
        let mut buffer = [0u8; MAX_KEY_SIZE];
        let mut bytes = Vec::new();
        // Every key fits in MAX_KEY_SIZE
        if let Ok(len) = self.serialize_into(&mut buffer) {
            let _ = bytes.extend_from_slice(&buffer[..len]);
        }
        bytes
    }

    /// Parse a serialized key
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            INITIALISED_KEY => Some(StorageKey::Initialised),
            ENTRY_COUNT_KEY => Some(StorageKey::EntryCount),
            BEST_TIME_ID_KEY => Some(StorageKey::BestTimeId),
            [lo, hi] => Some(StorageKey::Record(u16::from_le_bytes([*lo, *hi]))),
            _ => None,
        }
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Key not found
    NotFound,
    /// Underlying storage operation failed
    Storage,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
}

/// Persistent key-value store
///
/// Values are opaque byte strings. `put` is an unconditional upsert with
/// no versioning; `get` reports an absent key as [`StorageError::NotFound`].
/// All calls block until the underlying medium has completed the operation.
pub trait KeyValueStore {
    /// Read a value by key into the provided buffer
    ///
    /// # Returns
    /// The number of bytes read, or an error.
    fn get(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value by key, replacing any previous value
    fn put(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        (**self).get(key, buffer)
    }

    fn put(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        (**self).put(key, data)
    }
}

/// Serialized key as held by a backend
pub type RawKey = Vec<u8, MAX_KEY_SIZE>;

/// RAM-backed key-value store
///
/// Holds up to `N` keys under their serialized names. Contents are lost on
/// drop, which makes it a stand-in for flash on the host rather than a
/// persistence layer.
#[derive(Debug, Clone)]
pub struct MemoryStore<const N: usize> {
    entries: LinearMap<RawKey, Vec<u8, MAX_VALUE_SIZE>, N>,
    write_protected: bool,
}

impl<const N: usize> Default for MemoryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryStore<N> {
    /// Create an empty store
    pub const fn new() -> Self {
        Self {
            entries: LinearMap::new(),
            write_protected: false,
        }
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove a key, returning whether it was present
    pub fn remove(&mut self, key: StorageKey) -> bool {
        self.entries.remove(&key.to_bytes()).is_some()
    }

    /// Borrow the raw value stored under a key
    pub fn raw(&self, key: StorageKey) -> Option<&[u8]> {
        self.entries.get(&key.to_bytes()).map(|v| v.as_slice())
    }

    /// Keys currently stored, decoded from their serialized names
    ///
    /// Names that do not parse as a [`StorageKey`] are skipped.
    pub fn keys(&self) -> impl Iterator<Item = StorageKey> + '_ {
        self.entries.keys().filter_map(|raw| StorageKey::from_bytes(raw))
    }

    /// Make every subsequent `put` fail with [`StorageError::Storage`]
    ///
    /// Simulates a worn or locked flash partition.
    pub fn set_write_protected(&mut self, protected: bool) {
        self.write_protected = protected;
    }
}

impl<const N: usize> KeyValueStore for MemoryStore<N> {
    fn get(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let value = self
            .entries
            .get(&key.to_bytes())
            .ok_or(StorageError::NotFound)?;
        let len = value.len();
        if buffer.len() < len {
            return Err(StorageError::BufferTooSmall);
        }
        buffer[..len].copy_from_slice(value);
        Ok(len)
    }

    fn put(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        if self.write_protected {
            return Err(StorageError::Storage);
        }

        let value = Vec::from_slice(data).map_err(|_| StorageError::BufferTooSmall)?;
        self.entries
            .insert(key.to_bytes(), value)
            .map(|_| ())
            .map_err(|_| StorageError::Full)
    }
}
