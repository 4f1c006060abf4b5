//! Reply markers and fixed console text.

/// Firmware version reported in the banner
pub const VERSION: u8 = 1;

/// Printed after every command once it has completed
pub const READY_MARKER: &str = "CFC";

/// User prompt printed after the ready marker
pub const PROMPT: &str = ">";

/// Prefix of a reply line reporting a rejected command
pub const ERROR_PREFIX: &str = "error: ";

/// Line terminator for replies
pub const NEWLINE: &str = "\r\n";

/// Help text lines (M100 and startup banner, after the version line)
pub const HELP_LINES: &[&str] = &[
    "RC airplanes foam cutter firmware",
    "Supported commands:",
    "G1 [X/Y/Z/E(coords in mm)] [F(feedrate in mm/sec)] - move to new position",
    "G4 P[seconds] - delay",
    "G28 - homing cycle",
    "G90 - absolute mode",
    "G91 - relative mode",
    "G92 [X/Y/Z/E(coords in mm)] - set new position",
    "M17 - enable motors",
    "M18 - disable motors",
    "M100 - this help message",
    "M114 - report position",
    "All commands must end with a newline.",
];

/// Write the help banner
pub fn write_help<W: core::fmt::Write>(out: &mut W) -> core::fmt::Result {
    write!(out, "Bonobo {}{}", VERSION, NEWLINE)?;
    for line in HELP_LINES {
        out.write_str(line)?;
        out.write_str(NEWLINE)?;
    }
    Ok(())
}

/// Write the ready marker and prompt
pub fn write_ready<W: core::fmt::Write>(out: &mut W) -> core::fmt::Result {
    out.write_str(READY_MARKER)?;
    out.write_str(NEWLINE)?;
    out.write_str(PROMPT)?;
    out.write_str(NEWLINE)
}
