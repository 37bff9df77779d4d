//! Reflex Hardware Abstraction Layer
//!
//! This crate defines the platform seams the game firmware is written
//! against. The board support package supplies a blocking two-wire bus
//! and a persistent key-value store; the drivers and score log only ever
//! see these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Game control layer (menu, game modes)  │
//! └─────────────────────────────────────────┘
//!           │                     │
//!           ▼                     ▼
//! ┌──────────────────┐  ┌──────────────────┐
//! │  reflex-drivers  │  │   reflex-core    │
//! │   (MCP23017)     │  │  (score log)     │
//! └──────────────────┘  └──────────────────┘
//!           │                     │
//!           ▼                     ▼
//! ┌─────────────────────────────────────────┐
//! │  reflex-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`storage::KeyValueStore`] - Persistent key-value storage

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod storage;

// Re-export key traits at crate root for convenience
pub use i2c::I2cBus;
pub use storage::{KeyValueStore, MemoryStore, RawKey, StorageError, StorageKey};
