//! High-score log on top of a key-value store
//!
//! Keys written by the log:
//! - `Initialised` once the header has been laid down
//! - `NumEntries` and `BestTimeID` forming the header
//! - one record key per finishing time, keyed by its id
//!
//! Header fields and records are written as independent operations. A
//! power loss between two writes can leave them inconsistent; the next
//! `initialise` resets the header if either field is missing.

use reflex_hal::storage::MAX_VALUE_SIZE;
use reflex_hal::{KeyValueStore, StorageError, StorageKey};

use super::record::{decode_u16, decode_u32, AVERAGE_UNAVAILABLE, INITIALISED_MARKER};
use super::{ScoreHeader, ScoreRecord};

/// Score log errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScoreError {
    /// Key-value store operation failed
    Storage(StorageError),
    /// Stored value has the wrong width for its key
    Corrupted(StorageKey),
    /// Every record id has been used since the last reset
    LogFull,
}

impl From<StorageError> for ScoreError {
    fn from(e: StorageError) -> Self {
        ScoreError::Storage(e)
    }
}

/// Persistent high-score log
///
/// Owns the key-value store. The header is mirrored in memory and written
/// through on every change. The average is computed once by
/// [`initialise`](Self::initialise) and is not refreshed by
/// [`add_entry`](Self::add_entry); it reflects the log as it was at load.
pub struct HighScoreStore<S> {
    store: S,
    header: ScoreHeader,
    average: f64,
}

impl<S: KeyValueStore> HighScoreStore<S> {
    /// Load the score log, laying down a fresh header if needed
    ///
    /// A store without the `Initialised` sentinel is treated as pristine:
    /// the header is reset and the sentinel written. A store with the
    /// sentinel but a missing or malformed header field is reset too.
    pub fn initialise(store: S) -> Result<Self, ScoreError> {
        let mut scores = Self {
            store,
            header: ScoreHeader::EMPTY,
            average: 0.0,
        };

        if !scores.contains(StorageKey::Initialised)? {
            info!("No score log found, writing default header");
            scores.reset()?;
            scores
                .store
                .put(StorageKey::Initialised, &INITIALISED_MARKER.to_le_bytes())?;
        } else {
            match scores.load_header()? {
                Some(header) => scores.header = header,
                None => {
                    warn!("Score header inconsistent, resetting");
                    scores.reset()?;
                }
            }
        }

        scores.average = scores.calculate_average();
        info!(
            "Score log loaded: {} entries, best id {}",
            scores.header.entry_count,
            scores.header.best_time_id
        );

        Ok(scores)
    }

    /// Record a finishing time
    ///
    /// Returns the id the time was stored under.
    pub fn add_entry(&mut self, time: u32) -> Result<u16, ScoreError> {
        let id = self.header.next_entry_id();
        let entry_count = id.checked_add(1).ok_or(ScoreError::LogFull)?;
        let record = ScoreRecord::new(id, time);

        self.store.put(record.key(), &time.to_le_bytes())?;
        self.store
            .put(StorageKey::EntryCount, &entry_count.to_le_bytes())?;
        self.header.entry_count = entry_count;

        debug!("Recorded time {} as entry {}", time, id);

        // Nothing to compare the first entry against
        if id == 0 {
            return Ok(id);
        }

        // The entry is already committed; an unreadable best compares as 0
        let current_best = match self.get_score(self.header.best_time_id) {
            Ok(Some(best)) => best,
            Ok(None) => {
                warn!("Best entry {} missing", self.header.best_time_id);
                0
            }
            Err(e) => {
                warn!("Failed to read best entry {}: {}", self.header.best_time_id, e);
                0
            }
        };

        if time < current_best {
            self.store.put(StorageKey::BestTimeId, &id.to_le_bytes())?;
            self.header.best_time_id = id;
            info!("New best time {} (entry {})", time, id);
        }

        Ok(id)
    }

    /// Look up the time stored under `id`
    ///
    /// Returns `None` for ids outside `[0, entry_count)` and for records
    /// missing from the store.
    pub fn get_score(&mut self, id: u16) -> Result<Option<u32>, ScoreError> {
        if id >= self.header.entry_count {
            return Ok(None);
        }

        let key = StorageKey::Record(id);
        let mut buffer = [0u8; MAX_VALUE_SIZE];
        match self.store.get(key, &mut buffer) {
            Ok(len) => decode_u32(key, &buffer[..len]).map(Some),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewind the log to empty
    ///
    /// Only the header is rewritten. Previously written records stay in
    /// the store, unreachable, until new entries reuse their ids.
    pub fn reset(&mut self) -> Result<(), ScoreError> {
        let header = ScoreHeader::EMPTY;
        self.store
            .put(StorageKey::EntryCount, &header.entry_count.to_le_bytes())?;
        self.store
            .put(StorageKey::BestTimeId, &header.best_time_id.to_le_bytes())?;
        self.header = header;

        info!("Score log reset");
        Ok(())
    }

    /// Average time as of the last [`initialise`](Self::initialise)
    ///
    /// `0.0` for an empty log, [`AVERAGE_UNAVAILABLE`] if a record was
    /// missing at load.
    pub fn get_average(&self) -> f64 {
        self.average
    }

    /// Lowest recorded time, if any
    pub fn get_best_time(&mut self) -> Result<Option<u32>, ScoreError> {
        if self.header.is_empty() {
            return Ok(None);
        }
        self.get_score(self.header.best_time_id)
    }

    /// Id the next entry will be stored under
    pub fn next_entry_id(&self) -> u16 {
        self.header.next_entry_id()
    }

    /// Number of entries since the last reset
    pub fn entry_count(&self) -> u16 {
        self.header.entry_count
    }

    /// Id of the fastest entry
    pub fn best_time_id(&self) -> u16 {
        self.header.best_time_id
    }

    /// Current header
    pub fn header(&self) -> ScoreHeader {
        self.header
    }

    /// Borrow the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the log and return the underlying store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Read both header fields
    ///
    /// `None` if either is missing or malformed.
    fn load_header(&mut self) -> Result<Option<ScoreHeader>, ScoreError> {
        let entry_count = self.read_u16(StorageKey::EntryCount)?;
        let best_time_id = self.read_u16(StorageKey::BestTimeId)?;

        Ok(match (entry_count, best_time_id) {
            (Some(entry_count), Some(best_time_id)) => Some(ScoreHeader {
                entry_count,
                best_time_id,
            }),
            _ => None,
        })
    }

    fn read_u16(&mut self, key: StorageKey) -> Result<Option<u16>, ScoreError> {
        let mut buffer = [0u8; MAX_VALUE_SIZE];
        match self.store.get(key, &mut buffer) {
            Ok(len) => match decode_u16(key, &buffer[..len]) {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    warn!("Malformed header field {}", key);
                    Ok(None)
                }
            },
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Check for a key, propagating I/O errors other than `NotFound`
    fn contains(&mut self, key: StorageKey) -> Result<bool, ScoreError> {
        let mut buffer = [0u8; MAX_VALUE_SIZE];
        match self.store.get(key, &mut buffer) {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn calculate_average(&mut self) -> f64 {
        let entry_count = self.header.entry_count;
        if entry_count == 0 {
            return 0.0;
        }

        let mut sum = 0.0;
        for id in 0..entry_count {
            match self.get_score(id) {
                Ok(Some(time)) => sum += f64::from(time),
                Ok(None) => {
                    warn!("Entry {} missing, average unavailable", id);
                    return AVERAGE_UNAVAILABLE;
                }
                Err(e) => {
                    warn!("Failed to read entry {}: {}, average unavailable", id, e);
                    return AVERAGE_UNAVAILABLE;
                }
            }
        }

        sum / f64::from(entry_count)
    }
}
