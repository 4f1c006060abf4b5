//! Coordinated pulse loop
//!
//! Runs the interleaved pulse train of a [`MotionPlan`] against a single
//! elapsed-time reference, then commits the target as the new logical
//! position. The loop blocks for the whole move; nothing else runs until
//! it returns.

use super::planner::{AxisMotion, MotionPlan};
use super::position::{Axis, PositionState, AXIS_COUNT};
use crate::traits::{Clock, StepperBank};

/// Summary of one executed move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    /// Pulses the planner asked for, per axis
    pub planned_steps: [u32; AXIS_COUNT],
    /// Pulses actually emitted, per axis
    pub emitted_steps: [u32; AXIS_COUNT],
    /// Governing duration
    pub duration_us: u64,
    /// Measured time from first sample to loop exit
    pub elapsed_us: u64,
    /// Number of scheduling passes
    pub passes: u32,
}

impl MoveReport {
    /// Check every planned pulse was emitted
    pub fn is_complete(&self) -> bool {
        self.planned_steps == self.emitted_steps
    }

    /// Total pulses emitted across all axes
    pub fn total_emitted(&self) -> u32 {
        self.emitted_steps.iter().sum()
    }
}

/// Execute a planned move
///
/// Direction signals are driven before the first pulse. On every pass the
/// clock is sampled once and axes are serviced in index order; an axis
/// pulses when its next pulse is due and it still has budget. The loop
/// exits once the elapsed time exceeds the governing duration.
///
/// The position is committed unconditionally: logical position reflects
/// the commanded target, not what the motors did.
pub fn execute_move<S, C>(
    plan: &MotionPlan,
    bank: &mut S,
    clock: &mut C,
    state: &mut PositionState,
) -> MoveReport
where
    S: StepperBank,
    C: Clock,
{
    let mut axes: [AxisMotion; AXIS_COUNT] = plan.axes;
    let duration_us = plan.duration_us();

    let mut report = MoveReport {
        planned_steps: plan.planned_steps(),
        duration_us: duration_us as u64,
        ..MoveReport::default()
    };

    for (axis, motion) in Axis::ALL.into_iter().zip(axes.iter()) {
        bank.set_direction(axis, motion.direction);
    }

    let start = clock.now_us();
    loop {
        let elapsed = clock.now_us().saturating_sub(start);
        let elapsed_f = elapsed as f64;
        if elapsed_f > duration_us {
            report.elapsed_us = elapsed;
            break;
        }

        for (i, motion) in axes.iter_mut().enumerate() {
            if motion.is_active() && motion.steps_remaining > 0 && elapsed_f >= motion.next_pulse_us
            {
                bank.step(Axis::ALL[i]);
                motion.steps_remaining -= 1;
                motion.next_pulse_us += motion.period_us;
                report.emitted_steps[i] += 1;
            }
        }
        report.passes = report.passes.saturating_add(1);
    }

    state.set_position(plan.target);
    report
}
