//! Hardware driver implementations
//!
//! This crate provides drivers for the peripherals on the game board:
//!
//! - GPIO expander (MCP23017) for button LEDs and switches
//! - Adapter from `embedded-hal` I2C masters to the Reflex bus trait

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod bus;
pub mod expander;

pub use bus::HalBus;
pub use expander::{is_bit_set, is_bit_set_exclusive, ExpanderConfig, ExpanderError, Mcp23017};
