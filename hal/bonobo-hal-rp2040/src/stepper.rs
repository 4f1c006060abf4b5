//! GPIO stepper bank on RP2040 pins
//!
//! Builds the `bonobo-drivers` stepper bank from the configured motor
//! table, taking each GPIO from the [`PinBank`].

use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::Delay;
use heapless::Vec;

use bonobo_core::config::{MotorDescriptor, PinConfig};
use bonobo_core::motion::AXIS_COUNT;
use bonobo_drivers::stepper::{AxisPins, PinStepperBank, Signal};

use crate::pins::{PinBank, PinError};

/// Stepper bank type used by the firmware
pub type GpioStepperBank = PinStepperBank<Output<'static>, Input<'static>, Delay>;

/// Output pin parked at its inactive level
fn output(bank: &mut PinBank, config: &PinConfig) -> Result<Signal<Output<'static>>, PinError> {
    let pin = bank.take(config.pin)?;
    let idle = if config.inverted { Level::High } else { Level::Low };
    Ok(Signal::from_config(Output::new(pin, idle), config))
}

fn input(bank: &mut PinBank, config: &PinConfig) -> Result<Signal<Input<'static>>, PinError> {
    let pin = bank.take(config.pin)?;
    let pull = if config.pull_up { Pull::Up } else { Pull::None };
    Ok(Signal::from_config(Input::new(pin, pull), config))
}

/// Take every pin of the motor table and assemble the stepper bank
///
/// Axes sharing an enable GPIO share one output.
pub fn build_stepper_bank(
    bank: &mut PinBank,
    motors: &[MotorDescriptor; AXIS_COUNT],
    pulse_width_us: u32,
) -> Result<GpioStepperBank, PinError> {
    let mut enable_pins: Vec<u8, AXIS_COUNT> = Vec::new();
    let mut enables = Vec::new();
    for motor in motors {
        if enable_pins.contains(&motor.enable.pin) {
            continue;
        }
        // Both vectors hold at most one entry per axis
        enable_pins.push(motor.enable.pin).ok();
        enables.push(output(bank, &motor.enable)?).ok();
    }

    let [x, y, z, e] = motors;
    let mut axis = |motor: &MotorDescriptor| -> Result<AxisPins<Output<'static>, Input<'static>>, PinError> {
        Ok(AxisPins::new(
            output(bank, &motor.step)?,
            output(bank, &motor.dir)?,
            input(bank, &motor.limit)?,
        ))
    };
    let axes = [axis(x)?, axis(y)?, axis(z)?, axis(e)?];

    Ok(PinStepperBank::new(axes, enables, Delay, pulse_width_us))
}
