//! Stepper output trait
//!
//! This trait abstracts over how step, direction, enable and limit signals
//! reach the motor drivers (direct GPIO, shift register, simulation).

use crate::motion::Axis;

/// Direction of travel along an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward increasing coordinates
    Positive,
    /// Toward decreasing coordinates (and the limit switch)
    Negative,
}

impl Direction {
    /// Direction for a signed displacement
    ///
    /// A zero displacement maps to `Negative`; such an axis emits no pulses.
    pub fn from_delta(delta: f32) -> Self {
        if delta > 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }
}

/// Trait for the bank of four stepper drivers
///
/// Implementations own the physical signals. The core never touches pins
/// directly, so the whole motion engine can run against a simulated bank.
pub trait StepperBank {
    /// Drive every enable signal to its active (or inactive) level
    fn set_enabled(&mut self, enabled: bool);

    /// Set the direction signal of one axis
    ///
    /// Called before the first pulse of a move, never during one.
    fn set_direction(&mut self, axis: Axis, direction: Direction);

    /// Emit exactly one step pulse (high then low) on one axis
    fn step(&mut self, axis: Axis);

    /// Check whether the axis's limit switch is asserted
    fn limit_triggered(&mut self, axis: Axis) -> bool;
}
