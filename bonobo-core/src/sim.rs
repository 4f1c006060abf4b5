//! Simulated hardware for host-side testing
//!
//! A recording stepper bank and a deterministic clock, so the pulse loop,
//! the homing sweep and the dispatcher can be exercised without a board.

use heapless::Vec;

use crate::motion::{Axis, AXIS_COUNT};
use crate::traits::{Clock, Direction, StepperBank};

/// Capacity of the pin event log
pub const EVENT_LOG_LEN: usize = 256;

/// One recorded pin operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Enable(bool),
    Direction(Axis, Direction),
    Step(Axis),
}

/// Stepper bank that records every operation
#[derive(Debug, Clone)]
pub struct RecordingStepperBank {
    /// Current enable level
    pub enabled: bool,
    /// Last direction driven per axis
    pub directions: [Option<Direction>; AXIS_COUNT],
    /// Pulses emitted per axis
    pub steps: [u32; AXIS_COUNT],
    /// Signed pulse count per axis (direction applied)
    pub net_steps: [i64; AXIS_COUNT],
    /// Limit asserts once the axis has taken this many pulses; `None` never
    pub limit_after: [Option<u32>; AXIS_COUNT],
    /// Operations in call order; further events are counted but dropped
    pub events: Vec<PinEvent, EVENT_LOG_LEN>,
    /// Events that did not fit in the log
    pub dropped_events: usize,
}

impl RecordingStepperBank {
    /// Bank with motors disabled and no limit switches
    pub fn new() -> Self {
        Self {
            enabled: false,
            directions: [None; AXIS_COUNT],
            steps: [0; AXIS_COUNT],
            net_steps: [0; AXIS_COUNT],
            limit_after: [None; AXIS_COUNT],
            events: Vec::new(),
            dropped_events: 0,
        }
    }

    /// Forget recorded activity, keeping limit settings
    pub fn clear(&mut self) {
        self.steps = [0; AXIS_COUNT];
        self.net_steps = [0; AXIS_COUNT];
        self.events.clear();
        self.dropped_events = 0;
    }

    fn record(&mut self, event: PinEvent) {
        if self.events.push(event).is_err() {
            self.dropped_events += 1;
        }
    }
}

impl Default for RecordingStepperBank {
    fn default() -> Self {
        Self::new()
    }
}

impl StepperBank for RecordingStepperBank {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.record(PinEvent::Enable(enabled));
    }

    fn set_direction(&mut self, axis: Axis, direction: Direction) {
        self.directions[axis.index()] = Some(direction);
        self.record(PinEvent::Direction(axis, direction));
    }

    fn step(&mut self, axis: Axis) {
        let i = axis.index();
        self.steps[i] += 1;
        self.net_steps[i] += match self.directions[i] {
            Some(Direction::Positive) => 1,
            Some(Direction::Negative) => -1,
            None => 0,
        };
        self.record(PinEvent::Step(axis));
    }

    fn limit_triggered(&mut self, axis: Axis) -> bool {
        let i = axis.index();
        self.limit_after[i].is_some_and(|after| self.steps[i] >= after)
    }
}

/// Deterministic clock
///
/// Every `now_us` read advances time by a fixed tick, so busy-wait loops
/// make progress. Delays advance time by exactly the requested amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    /// Current time
    pub now: u64,
    /// Advance per read
    pub tick_us: u64,
    /// Sum of all requested delays
    pub total_delay_us: u64,
}

impl SimClock {
    /// Clock at time zero
    pub fn new(tick_us: u64) -> Self {
        Self {
            now: 0,
            tick_us,
            total_delay_us: 0,
        }
    }
}

impl Clock for SimClock {
    fn now_us(&mut self) -> u64 {
        self.now += self.tick_us;
        self.now
    }

    fn delay_us(&mut self, us: u64) {
        self.now += us;
        self.total_delay_us += us;
    }
}
