//! Hardware configuration types
//!
//! These types define the machine-level configuration: the motor pin table,
//! motor geometry, serial console and homing parameters.

use core::fmt;

use heapless::FnvIndexSet;

use crate::motion::{Axis, AxisCoupling, HomingConfig, UnitConversion, AXIS_COUNT};

/// Configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Highest GPIO number a pin string may name
pub const MAX_GPIO: u8 = 29;

/// Feedrate used until a G1 carries `F` (mm/s)
pub const DEFAULT_FEEDRATE: f32 = 10.0;

/// Default console baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default step pulse high time
pub const DEFAULT_PULSE_WIDTH_US: u32 = 2;

/// Longest pause between homing steps
pub const MAX_HOMING_STEP_DELAY_MS: u32 = 1_000;

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Malformed pin string or GPIO number out of range
    InvalidPin,
    /// No `[stepper]` section for this axis
    MissingStepper(Axis),
    /// Geometry gives no usable steps-per-mm
    InvalidGeometry(Axis),
    /// GPIO assigned to more than one signal
    PinConflict(u8),
    /// `version` is not [`CONFIG_VERSION`]
    UnsupportedVersion(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSection => f.write_str("invalid section header"),
            ConfigError::InvalidValue => f.write_str("invalid value"),
            ConfigError::InvalidPin => f.write_str("invalid pin"),
            ConfigError::MissingStepper(axis) => {
                write!(f, "missing [stepper {}] section", axis.name())
            }
            ConfigError::InvalidGeometry(axis) => {
                write!(f, "stepper {}: invalid geometry", axis.name())
            }
            ConfigError::PinConflict(pin) => write!(f, "gpio{} used more than once", pin),
            ConfigError::UnsupportedVersion(version) => write!(
                f,
                "unsupported config version {} (expected {})",
                version, CONFIG_VERSION
            ),
        }
    }
}

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
    /// Enable internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull_up: false,
        }
    }

    /// Create a pin with pull-up enabled
    pub const fn with_pullup(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: true,
        }
    }
}

/// Stepper motor hardware configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepperHwConfig {
    /// Step pulse pin
    pub step_pin: PinConfig,
    /// Direction pin
    pub dir_pin: PinConfig,
    /// Enable pin, may be shared between axes
    pub enable_pin: PinConfig,
    /// Limit switch input
    pub limit_pin: PinConfig,
    /// Full steps per motor rotation
    pub full_steps_per_rotation: u16,
    /// Microsteps setting
    pub microsteps: u16,
    /// Linear travel per rotation (mm)
    pub rotation_distance: f32,
}

impl Default for StepperHwConfig {
    fn default() -> Self {
        Self {
            step_pin: PinConfig::default(),
            dir_pin: PinConfig::default(),
            enable_pin: PinConfig::default(),
            limit_pin: PinConfig::default(),
            full_steps_per_rotation: 200,
            microsteps: 1,
            rotation_distance: 0.0,
        }
    }
}

impl StepperHwConfig {
    /// Steps per millimeter, if the geometry is usable
    pub fn steps_per_mm(&self) -> Option<f32> {
        if self.full_steps_per_rotation == 0
            || self.microsteps == 0
            || !self.rotation_distance.is_finite()
            || self.rotation_distance <= 0.0
        {
            return None;
        }
        Some(UnitConversion::steps_per_mm_for(
            self.full_steps_per_rotation,
            self.microsteps,
            self.rotation_distance,
        ))
    }

    /// The signal identities of this motor
    pub fn descriptor(&self) -> MotorDescriptor {
        MotorDescriptor {
            step: self.step_pin,
            dir: self.dir_pin,
            enable: self.enable_pin,
            limit: self.limit_pin,
        }
    }
}

/// GPIO identities of one motor's signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorDescriptor {
    pub step: PinConfig,
    pub dir: PinConfig,
    pub enable: PinConfig,
    pub limit: PinConfig,
}

/// Serial console configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialHwConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// UART TX pin
    pub tx_pin: PinConfig,
    /// UART RX pin
    pub rx_pin: PinConfig,
}

impl Default for SerialHwConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            tx_pin: PinConfig::new(0),
            rx_pin: PinConfig::new(1),
        }
    }
}

/// Complete machine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineConfig {
    /// Configuration format version, must equal [`CONFIG_VERSION`]
    pub version: u8,
    /// Axis-coupling mode
    pub coupling: AxisCoupling,
    /// Initial feedrate (mm/s)
    pub default_feedrate: f32,
    /// Echo received lines
    pub echo: bool,
    /// Append a move summary to move replies
    pub verbose: bool,
    /// Serial console
    pub serial: SerialHwConfig,
    /// Stepper per axis, in axis order
    pub steppers: [Option<StepperHwConfig>; AXIS_COUNT],
    /// Homing sweep parameters
    pub homing: HomingConfig,
    /// Step pulse high time
    pub pulse_width_us: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            coupling: AxisCoupling::default(),
            default_feedrate: DEFAULT_FEEDRATE,
            echo: false,
            verbose: false,
            serial: SerialHwConfig::default(),
            steppers: [None; AXIS_COUNT],
            homing: HomingConfig::default(),
            pulse_width_us: DEFAULT_PULSE_WIDTH_US,
        }
    }
}

impl MachineConfig {
    /// Create a new configuration without steppers
    pub fn new() -> Self {
        Self::default()
    }

    /// Arduino CNC shield wiring with the stock foam cutter mechanics
    ///
    /// Used when the embedded configuration fails to parse.
    pub fn cnc_shield() -> Self {
        // 28BYJ-48 on a GT3 pulley for X/Z, lead screw steppers for Y/E
        let pulley = |step, dir, limit| StepperHwConfig {
            step_pin: PinConfig::new(step),
            dir_pin: PinConfig::new(dir),
            enable_pin: PinConfig::inverted(8),
            // Switches pull the input to ground
            limit_pin: PinConfig {
                inverted: true,
                ..PinConfig::with_pullup(limit)
            },
            full_steps_per_rotation: 2038,
            microsteps: 1,
            rotation_distance: 40.0,
        };
        let screw = |step, dir, limit| StepperHwConfig {
            full_steps_per_rotation: 20,
            rotation_distance: 0.5,
            ..pulley(step, dir, limit)
        };

        Self {
            steppers: [
                Some(pulley(2, 5, 9)),
                Some(screw(3, 6, 10)),
                Some(pulley(4, 7, 11)),
                Some(screw(12, 13, 17)),
            ],
            ..Self::default()
        }
    }

    /// Stepper configuration for an axis
    pub fn stepper(&self, axis: Axis) -> Result<&StepperHwConfig, ConfigError> {
        self.steppers[axis.index()]
            .as_ref()
            .ok_or(ConfigError::MissingStepper(axis))
    }

    /// Motor descriptor table in axis order
    pub fn motor_table(&self) -> Result<[MotorDescriptor; AXIS_COUNT], ConfigError> {
        let mut table = [MotorDescriptor {
            step: PinConfig::default(),
            dir: PinConfig::default(),
            enable: PinConfig::default(),
            limit: PinConfig::default(),
        }; AXIS_COUNT];
        for axis in Axis::ALL {
            table[axis.index()] = self.stepper(axis)?.descriptor();
        }
        Ok(table)
    }

    /// Steps-per-mm for every axis
    pub fn unit_conversion(&self) -> Result<UnitConversion, ConfigError> {
        let mut scale = [0.0; AXIS_COUNT];
        for axis in Axis::ALL {
            scale[axis.index()] = self
                .stepper(axis)?
                .steps_per_mm()
                .ok_or(ConfigError::InvalidGeometry(axis))?;
        }
        Ok(UnitConversion::new(scale))
    }

    /// Check the configuration is usable
    ///
    /// Every GPIO may carry one signal, except enable pins which any number
    /// of axes may share.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        if !(self.default_feedrate.is_finite() && self.default_feedrate > 0.0) {
            return Err(ConfigError::InvalidValue);
        }
        if self.serial.baud_rate == 0 || self.pulse_width_us == 0 {
            return Err(ConfigError::InvalidValue);
        }
        if self.homing.max_steps == 0 || self.homing.step_delay_ms > MAX_HOMING_STEP_DELAY_MS {
            return Err(ConfigError::InvalidValue);
        }

        self.unit_conversion()?;
        let table = self.motor_table()?;

        let mut exclusive: FnvIndexSet<u8, 32> = FnvIndexSet::new();

        let serial_pins = [self.serial.tx_pin, self.serial.rx_pin];
        let motor_pins = table.iter().flat_map(|m| [m.step, m.dir, m.limit]);
        for pin in serial_pins.into_iter().chain(motor_pins) {
            check_range(pin)?;
            if !exclusive
                .insert(pin.pin)
                .map_err(|_| ConfigError::InvalidPin)?
            {
                return Err(ConfigError::PinConflict(pin.pin));
            }
        }

        for motor in &table {
            check_range(motor.enable)?;
            if exclusive.contains(&motor.enable.pin) {
                return Err(ConfigError::PinConflict(motor.enable.pin));
            }
        }

        Ok(())
    }
}

fn check_range(pin: PinConfig) -> Result<(), ConfigError> {
    if pin.pin > MAX_GPIO {
        Err(ConfigError::InvalidPin)
    } else {
        Ok(())
    }
}
