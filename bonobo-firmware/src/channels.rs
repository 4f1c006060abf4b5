//! Inter-task communication channels
//!
//! The serial receive task frames lines; the controller task consumes them
//! one at a time.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use bonobo_protocol::Line;

/// Lines waiting for the controller
///
/// A single slot: the receiver stops reading the UART while the controller
/// is busy, leaving further bytes in the UART ring buffer.
const LINE_CHANNEL_SIZE: usize = 1;

/// Complete command lines from the serial console
pub static LINE_CHANNEL: Channel<CriticalSectionRawMutex, Line, LINE_CHANNEL_SIZE> =
    Channel::new();
