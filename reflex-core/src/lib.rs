//! Board-agnostic core logic for the reaction game firmware
//!
//! This crate contains the application logic that does not depend on
//! specific hardware implementations:
//!
//! - Persistent high-score log with best and average statistics
//! - Button wiring configuration

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod scores;

pub use scores::{HighScoreStore, ScoreError, ScoreHeader, ScoreRecord};
