//! RP2040-specific HAL for the foam cutter firmware
//!
//! This crate provides RP2040 implementations of the `bonobo-core` traits:
//!
//! - Pin bank for taking GPIOs by number from the configuration
//! - GPIO stepper bank assembled from the motor table
//! - Microsecond clock backed by `embassy-time`

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod pins;
pub mod stepper;

pub use clock::EmbassyClock;
pub use pins::{PinBank, PinBankPeripherals, PinError, RemainingPeripherals};
pub use stepper::{build_stepper_bank, GpioStepperBank};
