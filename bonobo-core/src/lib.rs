//! Board-agnostic core logic for the foam cutter firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (stepper bank, clock)
//! - Position state and unit conversion
//! - Motion planning (per-axis step counts and periods)
//! - The coordinated pulse loop and the homing sweep
//! - Command dispatch for the serial console
//! - Configuration types and the `machine.toml` parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod motion;
pub mod traits;

#[cfg(any(test, feature = "sim"))]
pub mod sim;
