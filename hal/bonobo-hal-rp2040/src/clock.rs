//! Time base backed by the embassy time driver

use embassy_time::{Duration, Instant};

use bonobo_core::traits::Clock;

/// Microsecond clock on the RP2040 timer
///
/// Delays busy-wait: the motion core runs synchronously and owns the CPU
/// for the length of a move or dwell.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl EmbassyClock {
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for EmbassyClock {
    fn now_us(&mut self) -> u64 {
        Instant::now().as_micros()
    }

    fn delay_us(&mut self, us: u64) {
        // Deadline saturates instead of overflowing the tick counter
        let deadline = Instant::now()
            .checked_add(Duration::from_micros(us))
            .unwrap_or(Instant::MAX);
        while Instant::now() < deadline {}
    }
}
