//! Hardware abstraction traits
//!
//! These traits define the interface between the motion logic and the
//! board: the physical GPIO actuation and the time base.

pub mod clock;
pub mod stepper;

pub use clock::Clock;
pub use stepper::{Direction, StepperBank};
