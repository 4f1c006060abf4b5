//! Motion planner for coordinated moves
//!
//! Translates a target position and feedrate into per-axis pulse counts and
//! step periods so that every participating axis finishes at the same time.
//!
//! Axes are coupled in pairs: X/Y and Z/E. Each pair's travel time is the
//! Euclidean length of its displacement divided by the feedrate, and the
//! slower pair governs the whole move.

use micromath::F32Ext;

use super::position::{Axis, Position, UnitConversion, AXIS_COUNT};
use crate::traits::Direction;

/// Microseconds per second
const US_PER_S: f64 = 1_000_000.0;

/// Longest governing duration the microsecond clock can measure
const MAX_DURATION_US: f64 = u64::MAX as f64;

/// How the four axes relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisCoupling {
    /// Four independent axes (X/Y and Z/E pairs)
    Independent,
    /// Z and E replicate X and Y (two-column foam cutter)
    #[default]
    Mirrored,
}

/// Per-axis pulse schedule for one move
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMotion {
    /// Pulses still to emit in this move
    pub steps_remaining: u32,
    /// Direction signal for this move
    pub direction: Direction,
    /// Time between pulses; zero when the axis does not move
    pub period_us: f64,
    /// Elapsed-time mark at which the next pulse is due
    pub next_pulse_us: f64,
}

impl AxisMotion {
    /// An axis that does not take part in the move
    pub const IDLE: AxisMotion = AxisMotion {
        steps_remaining: 0,
        direction: Direction::Negative,
        period_us: 0.0,
        next_pulse_us: 0.0,
    };

    fn new(steps: u32, direction: Direction, duration_s: f32) -> Self {
        Self {
            steps_remaining: steps,
            direction,
            period_us: step_period_us(steps, duration_s),
            next_pulse_us: 0.0,
        }
    }

    /// Check if this axis emits pulses in the move
    pub fn is_active(&self) -> bool {
        self.period_us > 0.0
    }
}

/// A planned move, ready for the executor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionPlan {
    /// Per-axis schedules in service order
    pub axes: [AxisMotion; AXIS_COUNT],
    /// Governing duration in seconds
    pub duration_s: f32,
    /// Position committed once the move completes
    pub target: Position,
}

impl MotionPlan {
    /// Governing duration in microseconds
    pub fn duration_us(&self) -> f64 {
        f64::from(self.duration_s) * US_PER_S
    }

    /// Planned pulse count per axis
    pub fn planned_steps(&self) -> [u32; AXIS_COUNT] {
        self.axes.map(|axis| axis.steps_remaining)
    }
}

/// Reasons a move is rejected before any pulse is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// Feedrate is zero, negative or not a number
    InvalidFeedrate,
    /// A target coordinate is infinite or not a number
    NonFiniteTarget,
    /// Displacement, step count or duration is out of range
    MoveTooLong,
}

impl core::fmt::Display for PlanError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlanError::InvalidFeedrate => f.write_str("feedrate must be a positive number"),
            PlanError::NonFiniteTarget => f.write_str("target coordinates must be finite"),
            PlanError::MoveTooLong => f.write_str("move exceeds the step or time range"),
        }
    }
}

/// Motion planner
///
/// Holds the read-only machine geometry; planning itself is a pure
/// function of the current position, the target and the feedrate.
#[derive(Debug, Clone, Copy)]
pub struct MotionPlanner {
    units: UnitConversion,
    coupling: AxisCoupling,
}

impl MotionPlanner {
    /// Create a planner for the given geometry
    pub fn new(units: UnitConversion, coupling: AxisCoupling) -> Self {
        Self { units, coupling }
    }

    /// Axis-coupling mode
    pub fn coupling(&self) -> AxisCoupling {
        self.coupling
    }

    /// Unit conversion in use
    pub fn units(&self) -> &UnitConversion {
        &self.units
    }

    /// Plan a move from `current` to `target` at `feedrate` mm/s
    ///
    /// Returns `Ok(None)` when no axis has a step to take; the caller must
    /// then leave the position untouched.
    pub fn plan(
        &self,
        current: &Position,
        target: &Position,
        feedrate: f32,
    ) -> Result<Option<MotionPlan>, PlanError> {
        if !target.is_finite() {
            return Err(PlanError::NonFiniteTarget);
        }

        let delta = |axis: Axis| target[axis] - current[axis];
        let steps_for = |axis: Axis, distance: f32| {
            self.units
                .steps_for(axis, distance)
                .ok_or(PlanError::MoveTooLong)
        };
        let (dx, dy) = (delta(Axis::X), delta(Axis::Y));

        // Displacement and scale seen by the Z/E pair
        let (dz, de, steps_z, steps_e) = match self.coupling {
            AxisCoupling::Independent => {
                let (dz, de) = (delta(Axis::Z), delta(Axis::E));
                (dz, de, steps_for(Axis::Z, dz)?, steps_for(Axis::E, de)?)
            }
            AxisCoupling::Mirrored => (dx, dy, steps_for(Axis::X, dx)?, steps_for(Axis::Y, dy)?),
        };

        // A span wider than f32 range overflows the delta itself
        let steps = [steps_for(Axis::X, dx)?, steps_for(Axis::Y, dy)?, steps_z, steps_e];

        if steps.iter().all(|&s| s == 0) {
            return Ok(None);
        }

        if !(feedrate.is_finite() && feedrate > 0.0) {
            return Err(PlanError::InvalidFeedrate);
        }

        let xy_time = pair_norm(dx, dy) / feedrate;
        let ze_time = pair_norm(dz, de) / feedrate;
        let duration_s = xy_time.max(ze_time);
        if !(duration_s.is_finite() && f64::from(duration_s) * US_PER_S < MAX_DURATION_US) {
            return Err(PlanError::MoveTooLong);
        }

        let deltas = [dx, dy, dz, de];
        let axes = core::array::from_fn(|i| {
            AxisMotion::new(steps[i], Direction::from_delta(deltas[i]), duration_s)
        });

        Ok(Some(MotionPlan {
            axes,
            duration_s,
            target: *target,
        }))
    }
}

/// Time between pulses so that `steps` pulses span `duration_s`
///
/// Zero steps means the axis does not pulse at all.
pub fn step_period_us(steps: u32, duration_s: f32) -> f64 {
    if steps == 0 {
        0.0
    } else {
        f64::from(duration_s) * US_PER_S / f64::from(steps)
    }
}

/// Euclidean length of a pair displacement
///
/// The smaller component is scaled by the larger one so squaring stays in
/// `[1, 2]` and cannot overflow. micromath's square root is a fast
/// estimate; two Newton iterations bring it to full `f32` precision.
pub fn pair_norm(a: f32, b: f32) -> f32 {
    let (a, b) = (F32Ext::abs(a), F32Ext::abs(b));
    let (large, small) = if a >= b { (a, b) } else { (b, a) };
    if small == 0.0 {
        return large;
    }
    let ratio = small / large;
    let square = 1.0 + ratio * ratio;
    let mut root = F32Ext::sqrt(square);
    root = 0.5 * (root + square / root);
    root = 0.5 * (root + square / root);
    large * root
}
