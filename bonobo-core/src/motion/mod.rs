//! Motion
//!
//! Position bookkeeping, coordinated move planning, the blocking pulse loop
//! and the homing sweep.

pub mod executor;
pub mod homing;
pub mod planner;
pub mod position;

pub use executor::{execute_move, MoveReport};
pub use homing::{home_all, home_axis, HomingConfig, HomingError, HomingReport};
pub use planner::{AxisCoupling, AxisMotion, MotionPlan, MotionPlanner, PlanError};
pub use position::{
    Axis, Position, PositionState, PositioningMode, UnitConversion, AXIS_COUNT,
};
