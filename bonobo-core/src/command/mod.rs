//! Command dispatch
//!
//! Maps decoded console commands to motion, state changes and replies.

pub mod controller;

pub use controller::{Controller, Executed, Outcome, MAX_DWELL_S};
