//! GPIO stepper bank
//!
//! Drives step/dir/enable signals of step-stick style drivers (A4988,
//! DRV8825, TMC in standalone mode) directly from GPIO outputs and reads the
//! limit switches from GPIO inputs.
//!
//! Every signal carries its own polarity. A step pulse is driven active,
//! held for the configured pulse width and released.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use heapless::Vec;

use bonobo_core::config::PinConfig;
use bonobo_core::motion::{Axis, AXIS_COUNT};
use bonobo_core::traits::{Direction, StepperBank};

/// A pin plus its polarity
pub struct Signal<P> {
    pin: P,
    /// Active level is low
    inverted: bool,
}

impl<P> Signal<P> {
    /// Wrap a pin
    pub fn new(pin: P, inverted: bool) -> Self {
        Self { pin, inverted }
    }

    /// Wrap a pin using the polarity from its configuration
    pub fn from_config(pin: P, config: &PinConfig) -> Self {
        Self::new(pin, config.inverted)
    }

    /// The underlying pin
    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Whether the active level is low
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
}

impl<P: OutputPin> Signal<P> {
    /// Drive the signal to its active or inactive level
    ///
    /// GPIO writes on the supported targets are infallible; an error is
    /// dropped rather than interrupting a pulse train.
    pub fn set_active(&mut self, active: bool) {
        let level = PinState::from(active != self.inverted);
        self.pin.set_state(level).ok();
    }
}

impl<P: InputPin> Signal<P> {
    /// Read whether the signal is at its active level
    ///
    /// A failed read counts as active so that a sweep waiting on the
    /// signal stops instead of running on.
    pub fn is_active(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high != self.inverted,
            Err(_) => true,
        }
    }
}

/// Signals of one axis
pub struct AxisPins<O, I> {
    pub step: Signal<O>,
    pub dir: Signal<O>,
    pub limit: Signal<I>,
}

impl<O: OutputPin, I> AxisPins<O, I> {
    /// Group the signals of one axis, with the step output released
    pub fn new(step: Signal<O>, dir: Signal<O>, limit: Signal<I>) -> Self {
        let mut pins = Self { step, dir, limit };
        pins.step.set_active(false);
        pins
    }
}

/// Four axes of GPIO-driven stepper drivers
///
/// Enable signals are held separately from the axes because boards such as
/// the Arduino CNC shield wire a single enable line to every driver.
pub struct PinStepperBank<O, I, D> {
    axes: [AxisPins<O, I>; AXIS_COUNT],
    enables: Vec<Signal<O>, AXIS_COUNT>,
    delay: D,
    pulse_width_us: u32,
}

impl<O, I, D> PinStepperBank<O, I, D>
where
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
{
    /// Create a bank with all drivers disabled
    pub fn new(
        axes: [AxisPins<O, I>; AXIS_COUNT],
        enables: Vec<Signal<O>, AXIS_COUNT>,
        delay: D,
        pulse_width_us: u32,
    ) -> Self {
        let mut bank = Self {
            axes,
            enables,
            delay,
            pulse_width_us,
        };
        bank.set_enabled(false);
        bank
    }

    /// Signals of one axis
    pub fn axis(&self, axis: Axis) -> &AxisPins<O, I> {
        &self.axes[axis.index()]
    }

    /// Enable signals
    pub fn enables(&self) -> &[Signal<O>] {
        &self.enables
    }

    /// Step pulse high time
    pub fn pulse_width_us(&self) -> u32 {
        self.pulse_width_us
    }
}

impl<O, I, D> StepperBank for PinStepperBank<O, I, D>
where
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
{
    fn set_enabled(&mut self, enabled: bool) {
        for enable in self.enables.iter_mut() {
            enable.set_active(enabled);
        }
    }

    fn set_direction(&mut self, axis: Axis, direction: Direction) {
        self.axes[axis.index()]
            .dir
            .set_active(direction == Direction::Positive);
    }

    fn step(&mut self, axis: Axis) {
        let step = &mut self.axes[axis.index()].step;
        step.set_active(true);
        self.delay.delay_us(self.pulse_width_us);
        step.set_active(false);
    }

    fn limit_triggered(&mut self, axis: Axis) -> bool {
        self.axes[axis.index()].limit.is_active()
    }
}
