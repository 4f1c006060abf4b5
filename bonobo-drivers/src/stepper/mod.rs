//! Stepper driver implementations

pub mod gpio;

pub use gpio::{AxisPins, PinStepperBank, Signal};
