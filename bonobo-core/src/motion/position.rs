//! Logical position and unit conversion
//!
//! The controller tracks a commanded position: after every completed move
//! the logical position is exactly the commanded target, regardless of
//! what the motors physically did.

use core::ops::{Index, IndexMut};

use micromath::F32Ext;

use bonobo_protocol::command::{KEY_E, KEY_X, KEY_Y, KEY_Z};

/// Number of driven axes
pub const AXIS_COUNT: usize = 4;

/// First step count that no longer fits a `u32` (exact in `f32`)
const STEP_COUNT_LIMIT: f32 = 4_294_967_296.0;

/// Axis identifier, in service order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    /// All axes in their fixed service order (index 0..3)
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Index into per-axis tables
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Axis for a table index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parameter key of this axis on the command line
    pub const fn key(self) -> u8 {
        match self {
            Axis::X => KEY_X,
            Axis::Y => KEY_Y,
            Axis::Z => KEY_Z,
            Axis::E => KEY_E,
        }
    }

    /// Lowercase name used in configuration sections
    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
            Axis::E => "e",
        }
    }

    /// Look up an axis by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|axis| axis.name().eq_ignore_ascii_case(name))
    }
}

/// A point in machine coordinates (millimeters)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub coords: [f32; AXIS_COUNT],
}

impl Position {
    /// The machine origin
    pub const ORIGIN: Position = Position {
        coords: [0.0; AXIS_COUNT],
    };

    /// Create a position from its four coordinates
    pub const fn new(x: f32, y: f32, z: f32, e: f32) -> Self {
        Self {
            coords: [x, y, z, e],
        }
    }

    /// Check every coordinate is a finite number
    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(|c| c.is_finite())
    }
}

impl Index<Axis> for Position {
    type Output = f32;

    fn index(&self, axis: Axis) -> &f32 {
        &self.coords[axis.index()]
    }
}

impl IndexMut<Axis> for Position {
    fn index_mut(&mut self, axis: Axis) -> &mut f32 {
        &mut self.coords[axis.index()]
    }
}

/// How G1 coordinates are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositioningMode {
    /// Coordinates are machine positions (G90)
    #[default]
    Absolute,
    /// Coordinates are offsets from the current position (G91)
    Relative,
}

impl PositioningMode {
    /// Short label used in the position report
    pub const fn label(self) -> &'static str {
        match self {
            PositioningMode::Absolute => "ABS",
            PositioningMode::Relative => "REL",
        }
    }
}

/// Logical position plus positioning mode
///
/// Single writer: the command dispatcher, either directly (G92) or through
/// the motion executor committing a completed move.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionState {
    position: Position,
    mode: PositioningMode,
}

impl PositionState {
    /// Start at the origin in absolute mode
    pub const fn new() -> Self {
        Self {
            position: Position::ORIGIN,
            mode: PositioningMode::Absolute,
        }
    }

    /// Current logical position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Overwrite the logical position (no motion)
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Current positioning mode
    pub fn mode(&self) -> PositioningMode {
        self.mode
    }

    /// Change the positioning mode
    pub fn set_mode(&mut self, mode: PositioningMode) {
        self.mode = mode;
    }
}

/// Steps-per-millimeter for every axis
///
/// Derived once at startup from motor geometry and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitConversion {
    steps_per_mm: [f32; AXIS_COUNT],
}

impl UnitConversion {
    /// Create from explicit per-axis scales
    pub const fn new(steps_per_mm: [f32; AXIS_COUNT]) -> Self {
        Self { steps_per_mm }
    }

    /// Steps per millimeter from motor geometry
    ///
    /// `(full steps per revolution × microsteps) / travel per revolution`
    pub fn steps_per_mm_for(full_steps: u16, microsteps: u16, rotation_distance_mm: f32) -> f32 {
        f32::from(full_steps) * f32::from(microsteps) / rotation_distance_mm
    }

    /// Scale of one axis
    pub fn steps_per_mm(&self, axis: Axis) -> f32 {
        self.steps_per_mm[axis.index()]
    }

    /// Whole steps needed to cover `distance_mm` on `axis`
    ///
    /// Rounds to the nearest step so that values like 0.3 mm at 10 steps/mm
    /// give 3 steps rather than truncating a 2.9999 product. `None` when the
    /// count does not fit a `u32` or the distance is not finite.
    pub fn steps_for(&self, axis: Axis, distance_mm: f32) -> Option<u32> {
        let steps = F32Ext::abs(distance_mm) * self.steps_per_mm(axis) + 0.5;
        if steps.is_finite() && steps < STEP_COUNT_LIMIT {
            Some(steps as u32)
        } else {
            None
        }
    }
}
