//! Configuration types
//!
//! Machine configuration and the `machine.toml` parser.

pub mod hardware;
pub mod parse;

pub use hardware::*;
pub use parse::{parse_config, parse_pin};
