//! Command word decoding
//!
//! Each line may carry one G word and one M word. Both are looked up with
//! [`parse_number`] and decoded independently; a code this controller does
//! not know decodes to `None` and is ignored by the caller.

use crate::parser::parse_number;

/// Parameter keys
pub const KEY_G: u8 = b'G';
pub const KEY_M: u8 = b'M';
pub const KEY_X: u8 = b'X';
pub const KEY_Y: u8 = b'Y';
pub const KEY_Z: u8 = b'Z';
pub const KEY_E: u8 = b'E';
pub const KEY_F: u8 = b'F';
pub const KEY_P: u8 = b'P';

/// Code value used when a command word is absent
pub const NO_CODE: i32 = -1;

/// Preparatory (G) commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GCode {
    /// G1: coordinated linear move
    LinearMove,
    /// G2 / G4: dwell for P seconds
    Dwell,
    /// G28: homing sweep
    Home,
    /// G90: absolute positioning
    AbsolutePositioning,
    /// G91: relative positioning
    RelativePositioning,
    /// G92: set logical position without motion
    SetPosition,
}

impl GCode {
    /// Decode a numeric G code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(GCode::LinearMove),
            2 | 4 => Some(GCode::Dwell),
            28 => Some(GCode::Home),
            90 => Some(GCode::AbsolutePositioning),
            91 => Some(GCode::RelativePositioning),
            92 => Some(GCode::SetPosition),
            _ => None,
        }
    }

    /// Find and decode the G word of a line
    pub fn from_line(line: &[u8]) -> Option<Self> {
        Self::from_code(word(line, KEY_G))
    }
}

/// Miscellaneous (M) commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MCode {
    /// M17: enable all motor drivers
    EnableMotors,
    /// M18: disable all motor drivers
    DisableMotors,
    /// M100: print the help text
    Help,
    /// M114: report the current position and mode
    ReportPosition,
}

impl MCode {
    /// Decode a numeric M code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            17 => Some(MCode::EnableMotors),
            18 => Some(MCode::DisableMotors),
            100 => Some(MCode::Help),
            114 => Some(MCode::ReportPosition),
            _ => None,
        }
    }

    /// Find and decode the M word of a line
    pub fn from_line(line: &[u8]) -> Option<Self> {
        Self::from_code(word(line, KEY_M))
    }
}

/// Read a command word's integer code, [`NO_CODE`] if absent
pub fn word(line: &[u8], key: u8) -> i32 {
    parse_number(line, key, NO_CODE as f32) as i32
}
