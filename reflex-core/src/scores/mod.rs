//! Persistent high-score log
//!
//! Stores every finishing time under its own key, plus a small header
//! tracking how many times have been recorded and which one is fastest.
//! Statistics are derived from the records at load time.

pub mod record;
pub mod store;

pub use record::{ScoreHeader, ScoreRecord, AVERAGE_UNAVAILABLE, INITIALISED_MARKER};
pub use store::{HighScoreStore, ScoreError};
