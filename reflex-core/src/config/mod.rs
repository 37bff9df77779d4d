//! Configuration types
//!
//! Board wiring shared by the game layer and the drivers.

pub mod buttons;

pub use buttons::*;
