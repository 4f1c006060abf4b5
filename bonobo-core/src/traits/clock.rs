//! Time base trait

/// Monotonic microsecond clock with blocking delays
///
/// The pulse loop samples `now_us` once per scheduling pass; dwell and the
/// homing sweep block through `delay_us`.
pub trait Clock {
    /// Microseconds since an arbitrary fixed point
    fn now_us(&mut self) -> u64;

    /// Block for at least `us` microseconds
    fn delay_us(&mut self, us: u64);

    /// Block for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(u64::from(ms) * 1000);
    }
}
