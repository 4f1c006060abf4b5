//! Homing sweep
//!
//! A fixed-rate, single-axis sweep toward the limit switch. Unlike a
//! coordinated move there is no shared time base: each axis is stepped
//! with a fixed delay until its limit input asserts.

use super::position::{Axis, Position, PositionState, AXIS_COUNT};
use crate::traits::{Clock, Direction, StepperBank};

/// Default wait between homing steps
pub const DEFAULT_STEP_DELAY_MS: u32 = 5;

/// Default per-axis step budget
pub const DEFAULT_MAX_STEPS: u32 = 100_000;

/// Homing sweep parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingConfig {
    /// Wait after each step
    pub step_delay_ms: u32,
    /// Steps allowed per axis before giving up
    pub max_steps: u32,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Homing failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingError {
    /// The axis used its whole step budget without reaching the switch
    EndstopNotTriggered(Axis),
}

impl core::fmt::Display for HomingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HomingError::EndstopNotTriggered(axis) => {
                write!(f, "homing: {} endstop not triggered", axis.name())
            }
        }
    }
}

/// Steps taken per axis during a successful sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingReport {
    pub steps: [u32; AXIS_COUNT],
}

/// Home one axis, returning the number of steps taken
pub fn home_axis<S, C>(
    axis: Axis,
    bank: &mut S,
    clock: &mut C,
    config: &HomingConfig,
) -> Result<u32, HomingError>
where
    S: StepperBank,
    C: Clock,
{
    bank.set_direction(axis, Direction::Negative);

    let mut steps = 0u32;
    while !bank.limit_triggered(axis) {
        if steps >= config.max_steps {
            return Err(HomingError::EndstopNotTriggered(axis));
        }
        bank.step(axis);
        clock.delay_ms(config.step_delay_ms);
        steps += 1;
    }
    Ok(steps)
}

/// Home every axis in index order
///
/// On success the logical position becomes the origin. A failed sweep
/// stops at the failing axis and leaves the logical position untouched.
pub fn home_all<S, C>(
    bank: &mut S,
    clock: &mut C,
    config: &HomingConfig,
    state: &mut PositionState,
) -> Result<HomingReport, HomingError>
where
    S: StepperBank,
    C: Clock,
{
    let mut report = HomingReport::default();
    for axis in Axis::ALL {
        report.steps[axis.index()] = home_axis(axis, bank, clock, config)?;
    }
    state.set_position(Position::ORIGIN);
    Ok(report)
}
