//! Bonobo console protocol
//!
//! This crate defines the text protocol spoken over the serial console of
//! the foam cutter controller. The host (a terminal or a sender program)
//! writes one command per line; the controller answers with an optional
//! reply and a ready marker once the command has fully completed.
//!
//! # Protocol Overview
//!
//! ```text
//! host  → G1 X12.5 Y-3 F200\n
//! ctrl  ← CFC\r\n
//! ctrl  ← >\r\n
//! ```
//!
//! Grammar of one line: `<G|M><int> [<KEY><float>]*`, tokens separated by
//! single spaces, `KEY` one of `X Y Z E F P`. There is no line
//! continuation and no command chaining.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod parser;
pub mod reply;

pub use command::{GCode, MCode, NO_CODE};
pub use line::{Line, LineBuffer, MAX_LINE_LEN};
pub use parser::parse_number;
pub use reply::{PROMPT, READY_MARKER};
