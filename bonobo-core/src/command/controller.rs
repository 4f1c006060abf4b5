//! Console command dispatcher
//!
//! Owns the stepper bank, the clock and the logical position, and maps each
//! received line to motion, state changes and reply text. Execution is
//! synchronous: a line's reply and ready marker are written only after its
//! action (including a blocking move or dwell) has completed.

use core::fmt::{self, Write};

use bonobo_protocol::command::{KEY_F, KEY_P};
use bonobo_protocol::reply::{write_help, write_ready, ERROR_PREFIX, NEWLINE};
use bonobo_protocol::{parse_number, GCode, Line, MCode};

use crate::config::{ConfigError, MachineConfig};
use crate::motion::{
    execute_move, home_all, Axis, HomingConfig, HomingError, HomingReport, MotionPlanner,
    MoveReport, PlanError, Position, PositionState, PositioningMode,
};
use crate::traits::{Clock, StepperBank};

/// Longest accepted `G4`/`G2` dwell, in seconds
pub const MAX_DWELL_S: f32 = 3_600.0;

/// Result of a line's G word
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Move executed and position committed
    Moved(MoveReport),
    /// Move had no steps to take; position unchanged
    NoMotion,
    /// Move rejected before any pulse
    Rejected(PlanError),
    /// Blocked for this many microseconds
    Dwelled(u64),
    /// Dwell refused, longer than [`MAX_DWELL_S`]
    DwellTooLong,
    /// All axes homed, position zeroed
    Homed(HomingReport),
    /// Homing aborted, position unchanged
    HomingFailed(HomingError),
    /// Positioning mode changed
    ModeSet(PositioningMode),
    /// Logical position overwritten
    PositionSet(Position),
}

/// What a line did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Executed {
    /// Outcome of a recognized G word
    pub g: Option<Outcome>,
    /// Recognized M word
    pub m: Option<MCode>,
}

impl Executed {
    /// Check nothing on the line was recognized
    pub fn is_ignored(&self) -> bool {
        self.g.is_none() && self.m.is_none()
    }
}

/// Command dispatcher and sole owner of the motion state
pub struct Controller<S, C> {
    bank: S,
    clock: C,
    planner: MotionPlanner,
    state: PositionState,
    feedrate: f32,
    homing: HomingConfig,
    echo: bool,
    verbose: bool,
    motors_enabled: bool,
}

impl<S: StepperBank, C: Clock> Controller<S, C> {
    /// Build a controller from a machine configuration
    pub fn new(config: &MachineConfig, bank: S, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let units = config.unit_conversion()?;

        Ok(Self {
            bank,
            clock,
            planner: MotionPlanner::new(units, config.coupling),
            state: PositionState::new(),
            feedrate: config.default_feedrate,
            homing: config.homing,
            echo: config.echo,
            verbose: config.verbose,
            motors_enabled: false,
        })
    }

    /// Power-on sequence: enable motors, zero position, banner, ready
    pub fn startup<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        self.set_motors(true);
        self.state.set_position(Position::ORIGIN);
        write_help(out)?;
        write_ready(out)
    }

    /// Execute one line and write its reply followed by the ready marker
    ///
    /// Unknown or absent command words are ignored. The G word is handled
    /// before the M word when a line carries both.
    pub fn process_line<W: Write>(&mut self, line: &Line, out: &mut W) -> Result<Executed, fmt::Error> {
        let bytes = line.as_bytes();

        if self.echo {
            for &byte in bytes {
                out.write_char(char::from(byte))?;
            }
            out.write_str(NEWLINE)?;
        }

        let mut executed = Executed::default();
        if let Some(code) = GCode::from_line(bytes) {
            executed.g = Some(self.execute_g(code, bytes, out)?);
        }
        if let Some(code) = MCode::from_line(bytes) {
            self.execute_m(code, out)?;
            executed.m = Some(code);
        }

        write_ready(out)?;
        Ok(executed)
    }

    fn execute_g<W: Write>(&mut self, code: GCode, line: &[u8], out: &mut W) -> Result<Outcome, fmt::Error> {
        let outcome = match code {
            GCode::LinearMove => self.linear_move(line),
            GCode::Dwell => {
                let seconds = parse_number(line, KEY_P, 0.0);
                match dwell_us(seconds) {
                    Some(us) => {
                        self.clock.delay_us(us);
                        Outcome::Dwelled(us)
                    }
                    None => Outcome::DwellTooLong,
                }
            }
            GCode::Home => {
                match home_all(&mut self.bank, &mut self.clock, &self.homing, &mut self.state) {
                    Ok(report) => Outcome::Homed(report),
                    Err(err) => Outcome::HomingFailed(err),
                }
            }
            GCode::AbsolutePositioning => {
                self.state.set_mode(PositioningMode::Absolute);
                Outcome::ModeSet(PositioningMode::Absolute)
            }
            GCode::RelativePositioning => {
                self.state.set_mode(PositioningMode::Relative);
                Outcome::ModeSet(PositioningMode::Relative)
            }
            GCode::SetPosition => {
                let mut position = Position::ORIGIN;
                for axis in Axis::ALL {
                    position[axis] = parse_number(line, axis.key(), 0.0);
                }
                if position.is_finite() {
                    self.state.set_position(position);
                    Outcome::PositionSet(position)
                } else {
                    Outcome::Rejected(PlanError::NonFiniteTarget)
                }
            }
        };

        match outcome {
            Outcome::Rejected(err) => write_error(out, err)?,
            Outcome::HomingFailed(err) => write_error(out, err)?,
            Outcome::DwellTooLong => write!(
                out,
                "{}dwell must not exceed {} seconds{}",
                ERROR_PREFIX, MAX_DWELL_S, NEWLINE
            )?,
            Outcome::Moved(report) if self.verbose => write_move_summary(out, &report)?,
            _ => {}
        }
        Ok(outcome)
    }

    fn linear_move(&mut self, line: &[u8]) -> Outcome {
        let current = self.state.position();
        let mut target = current;
        for axis in Axis::ALL {
            target[axis] = match self.state.mode() {
                PositioningMode::Absolute => parse_number(line, axis.key(), current[axis]),
                PositioningMode::Relative => current[axis] + parse_number(line, axis.key(), 0.0),
            };
        }

        let feedrate = parse_number(line, KEY_F, self.feedrate);
        if feedrate.is_finite() && feedrate > 0.0 {
            self.feedrate = feedrate;
        }

        match self.planner.plan(&current, &target, feedrate) {
            Ok(Some(plan)) => Outcome::Moved(execute_move(
                &plan,
                &mut self.bank,
                &mut self.clock,
                &mut self.state,
            )),
            Ok(None) => Outcome::NoMotion,
            Err(err) => Outcome::Rejected(err),
        }
    }

    fn execute_m<W: Write>(&mut self, code: MCode, out: &mut W) -> fmt::Result {
        match code {
            MCode::EnableMotors => self.set_motors(true),
            MCode::DisableMotors => self.set_motors(false),
            MCode::Help => write_help(out)?,
            MCode::ReportPosition => self.write_position(out)?,
        }
        Ok(())
    }

    fn set_motors(&mut self, enabled: bool) {
        self.bank.set_enabled(enabled);
        self.motors_enabled = enabled;
    }

    /// Write the position report line
    pub fn write_position<W: Write>(&self, out: &mut W) -> fmt::Result {
        let p = self.state.position();
        write!(
            out,
            "X{:.2} Y{:.2} Z{:.2} E{:.2} {}{}",
            p[Axis::X],
            p[Axis::Y],
            p[Axis::Z],
            p[Axis::E],
            self.state.mode().label(),
            NEWLINE
        )
    }

    /// Current logical position
    pub fn position(&self) -> Position {
        self.state.position()
    }

    /// Current positioning mode
    pub fn mode(&self) -> PositioningMode {
        self.state.mode()
    }

    /// Feedrate used by a G1 without `F`
    pub fn feedrate(&self) -> f32 {
        self.feedrate
    }

    /// Whether the drivers were last enabled
    pub fn motors_enabled(&self) -> bool {
        self.motors_enabled
    }

    /// The motion planner in use
    pub fn planner(&self) -> &MotionPlanner {
        &self.planner
    }

    /// The stepper bank
    pub fn bank(&self) -> &S {
        &self.bank
    }

    /// Mutable stepper bank, for scripting a simulated machine
    #[cfg(any(test, feature = "sim"))]
    pub fn bank_mut(&mut self) -> &mut S {
        &mut self.bank
    }

    /// The time base
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Dwell time for `seconds`; negative or NaN means no wait, anything
/// above [`MAX_DWELL_S`] is refused
fn dwell_us(seconds: f32) -> Option<u64> {
    if seconds > MAX_DWELL_S {
        None
    } else if seconds > 0.0 {
        Some((f64::from(seconds) * 1_000_000.0) as u64)
    } else {
        Some(0)
    }
}

fn write_error<W: Write, E: fmt::Display>(out: &mut W, err: E) -> fmt::Result {
    write!(out, "{}{}{}", ERROR_PREFIX, err, NEWLINE)
}

fn write_move_summary<W: Write>(out: &mut W, report: &MoveReport) -> fmt::Result {
    let [x, y, z, e] = report.emitted_steps;
    write!(
        out,
        "move: steps X{} Y{} Z{} E{}, planned {} us, took {} us{}",
        x, y, z, e, report.duration_us, report.elapsed_us, NEWLINE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StepperHwConfig;
    use crate::motion::{AxisCoupling, AXIS_COUNT};
    use crate::sim::{RecordingStepperBank, SimClock};

    const READY: &str = "CFC\r\n>\r\n";

    type TestController = Controller<RecordingStepperBank, SimClock>;

    /// CNC shield wiring with one step per millimeter
    fn unit_config(coupling: AxisCoupling) -> MachineConfig {
        let mut config = MachineConfig::cnc_shield();
        config.coupling = coupling;
        for stepper in config.steppers.iter_mut().flatten() {
            *stepper = StepperHwConfig {
                full_steps_per_rotation: 1,
                microsteps: 1,
                rotation_distance: 1.0,
                ..*stepper
            };
        }
        config
    }

    fn controller(config: &MachineConfig) -> TestController {
        Controller::new(config, RecordingStepperBank::new(), SimClock::new(1_000)).unwrap()
    }

    fn run(ctrl: &mut TestController, text: &str) -> (Executed, String) {
        let mut out = String::new();
        let executed = ctrl.process_line(&Line::from_bytes(text.as_bytes()), &mut out).unwrap();
        (executed, out)
    }

    #[test]
    fn test_startup_sequence() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let mut out = String::new();
        ctrl.startup(&mut out).unwrap();

        assert!(out.starts_with("Bonobo 1\r\n"));
        assert!(out.contains("G1 [X/Y/Z/E"));
        assert!(out.ends_with(READY));
        assert!(ctrl.motors_enabled());
        assert!(ctrl.bank().enabled);
        assert_eq!(ctrl.position(), Position::ORIGIN);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MachineConfig::new();
        let result = Controller::new(&config, RecordingStepperBank::new(), SimClock::new(1));
        assert!(matches!(result, Err(ConfigError::MissingStepper(Axis::X))));
    }

    #[test]
    fn test_linear_move_scenario() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (executed, out) = run(&mut ctrl, "G1 X10 F5");

        assert_eq!(out, READY);
        match executed.g {
            Some(Outcome::Moved(report)) => {
                assert_eq!(report.duration_us, 2_000_000);
                assert_eq!(report.emitted_steps, [10, 0, 0, 0]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(ctrl.position(), Position::new(10.0, 0.0, 0.0, 0.0));
        assert_eq!(ctrl.bank().steps, [10, 0, 0, 0]);
        assert_eq!(ctrl.feedrate(), 5.0);
    }

    #[test]
    fn test_repeated_move_is_noop() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        run(&mut ctrl, "G1 X3 Y4 F10");
        let steps = ctrl.bank().steps;

        let (executed, out) = run(&mut ctrl, "G1 X3 Y4 F10");
        assert_eq!(executed.g, Some(Outcome::NoMotion));
        assert_eq!(out, READY);
        assert_eq!(ctrl.bank().steps, steps);
        assert_eq!(ctrl.position(), Position::new(3.0, 4.0, 0.0, 0.0));
    }

    #[test]
    fn test_missing_axes_keep_current_position() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        run(&mut ctrl, "G92 X1 Y2 Z3 E4");
        run(&mut ctrl, "G1 Y6 F10");
        assert_eq!(ctrl.position(), Position::new(1.0, 6.0, 3.0, 4.0));
        assert_eq!(ctrl.bank().steps, [0, 4, 0, 0]);
    }

    #[test]
    fn test_modal_feedrate() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        assert_eq!(ctrl.feedrate(), 10.0);
        run(&mut ctrl, "G1 X10 F5");
        let (executed, _) = run(&mut ctrl, "G1 X20");
        match executed.g {
            Some(Outcome::Moved(report)) => assert_eq!(report.duration_us, 2_000_000),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_invalid_feedrate_rejected() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (executed, out) = run(&mut ctrl, "G1 X5 F0");

        assert_eq!(executed.g, Some(Outcome::Rejected(PlanError::InvalidFeedrate)));
        assert_eq!(out, "error: feedrate must be a positive number\r\nCFC\r\n>\r\n");
        assert_eq!(ctrl.position(), Position::ORIGIN);
        assert_eq!(ctrl.bank().steps, [0; AXIS_COUNT]);
        // The bad value is not kept
        assert_eq!(ctrl.feedrate(), 10.0);

        let (_, out) = run(&mut ctrl, "G1 X5 F-3");
        assert!(out.starts_with("error: "));
    }

    #[test]
    fn test_non_finite_target_rejected() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (executed, out) = run(&mut ctrl, "G1 X1e39");
        assert_eq!(executed.g, Some(Outcome::Rejected(PlanError::NonFiniteTarget)));
        assert!(out.starts_with("error: target coordinates must be finite\r\n"));
        assert_eq!(ctrl.position(), Position::ORIGIN);
    }

    #[test]
    fn test_out_of_range_move_rejected() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (executed, out) = run(&mut ctrl, "G1 X1e10 F10");
        assert_eq!(executed.g, Some(Outcome::Rejected(PlanError::MoveTooLong)));
        assert!(out.starts_with("error: move exceeds the step or time range\r\n"));
        assert_eq!(ctrl.position(), Position::ORIGIN);

        // Both coordinates finite, the span between them is not
        run(&mut ctrl, "G92 X-3e38");
        let (executed, out) = run(&mut ctrl, "G1 X3e38 F10");
        assert_eq!(executed.g, Some(Outcome::Rejected(PlanError::MoveTooLong)));
        assert!(out.ends_with(READY));
        assert_eq!(ctrl.position()[Axis::X], -3.0e38);
        assert_eq!(ctrl.bank().steps, [0; AXIS_COUNT]);
    }

    #[test]
    fn test_relative_mode() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (executed, _) = run(&mut ctrl, "G91");
        assert_eq!(executed.g, Some(Outcome::ModeSet(PositioningMode::Relative)));

        run(&mut ctrl, "G1 X5 F10");
        run(&mut ctrl, "G1 X5 Y-2 F10");
        assert_eq!(ctrl.position(), Position::new(10.0, -2.0, 0.0, 0.0));
        assert_eq!(ctrl.bank().net_steps, [10, -2, 0, 0]);

        let (_, out) = run(&mut ctrl, "M114");
        assert_eq!(out, "X10.00 Y-2.00 Z0.00 E0.00 REL\r\nCFC\r\n>\r\n");

        run(&mut ctrl, "G90");
        run(&mut ctrl, "G1 X5");
        assert_eq!(ctrl.position()[Axis::X], 5.0);
        assert_eq!(ctrl.mode(), PositioningMode::Absolute);
    }

    #[test]
    fn test_set_position_without_motion() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        run(&mut ctrl, "G91");
        let (executed, out) = run(&mut ctrl, "G92 X7.5 E-1");

        let expected = Position::new(7.5, 0.0, 0.0, -1.0);
        assert_eq!(executed.g, Some(Outcome::PositionSet(expected)));
        assert_eq!(out, READY);
        assert_eq!(ctrl.position(), expected);
        assert!(ctrl.bank().events.is_empty());
    }

    #[test]
    fn test_dwell() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (executed, _) = run(&mut ctrl, "G4 P1.5");
        assert_eq!(executed.g, Some(Outcome::Dwelled(1_500_000)));
        assert_eq!(ctrl.clock().total_delay_us, 1_500_000);

        let (executed, _) = run(&mut ctrl, "G2 P-1");
        assert_eq!(executed.g, Some(Outcome::Dwelled(0)));

        let (executed, _) = run(&mut ctrl, "G4");
        assert_eq!(executed.g, Some(Outcome::Dwelled(0)));
        assert_eq!(ctrl.clock().total_delay_us, 1_500_000);
    }

    #[test]
    fn test_dwell_limit() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (executed, _) = run(&mut ctrl, "G4 P3600");
        assert_eq!(executed.g, Some(Outcome::Dwelled(3_600_000_000)));

        for line in ["G4 P3600.5", "G4 P1e20", "G2 P1e39"] {
            let (executed, out) = run(&mut ctrl, line);
            assert_eq!(executed.g, Some(Outcome::DwellTooLong));
            assert_eq!(out, "error: dwell must not exceed 3600 seconds\r\nCFC\r\n>\r\n");
        }
        assert_eq!(ctrl.clock().total_delay_us, 3_600_000_000);
    }

    #[test]
    fn test_homing() {
        let mut config = unit_config(AxisCoupling::Independent);
        config.homing.max_steps = 20;
        let mut ctrl = controller(&config);
        run(&mut ctrl, "G92 X5 Y5 Z5 E5");
        ctrl.bank_mut().limit_after = [Some(4), Some(4), Some(4), Some(4)];

        let (executed, out) = run(&mut ctrl, "G28");
        assert!(matches!(executed.g, Some(Outcome::Homed(_))));
        assert_eq!(out, READY);
        assert_eq!(ctrl.position(), Position::ORIGIN);
        assert_eq!(ctrl.bank().net_steps, [-4; AXIS_COUNT]);
    }

    #[test]
    fn test_homing_failure_reported() {
        let mut config = unit_config(AxisCoupling::Independent);
        config.homing.max_steps = 20;
        let mut ctrl = controller(&config);
        run(&mut ctrl, "G92 X5");

        let (executed, out) = run(&mut ctrl, "G28");
        assert_eq!(
            executed.g,
            Some(Outcome::HomingFailed(HomingError::EndstopNotTriggered(Axis::X)))
        );
        assert_eq!(out, "error: homing: x endstop not triggered\r\nCFC\r\n>\r\n");
        assert_eq!(ctrl.position()[Axis::X], 5.0);
    }

    #[test]
    fn test_enable_disable_leaves_position() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        run(&mut ctrl, "G1 X2 F10");

        let (executed, out) = run(&mut ctrl, "M18");
        assert_eq!(executed.m, Some(MCode::DisableMotors));
        assert_eq!(out, READY);
        assert!(!ctrl.motors_enabled());
        assert!(!ctrl.bank().enabled);

        run(&mut ctrl, "M17");
        assert!(ctrl.bank().enabled);
        assert_eq!(ctrl.position(), Position::new(2.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_help_and_report() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (_, out) = run(&mut ctrl, "M100");
        assert!(out.starts_with("Bonobo 1\r\n"));
        assert!(out.ends_with(READY));

        let (_, out) = run(&mut ctrl, "M114");
        assert_eq!(out, "X0.00 Y0.00 Z0.00 E0.00 ABS\r\nCFC\r\n>\r\n");
    }

    #[test]
    fn test_unknown_commands_ignored() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        for text in ["G5 X10", "M999", "hello", "", "g1 x10"] {
            let (executed, out) = run(&mut ctrl, text);
            assert!(executed.is_ignored(), "{}", text);
            assert_eq!(out, READY);
        }
        assert_eq!(ctrl.position(), Position::ORIGIN);
    }

    #[test]
    fn test_g_and_m_on_one_line() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let (executed, out) = run(&mut ctrl, "G1 X1 F10 M114");
        assert!(matches!(executed.g, Some(Outcome::Moved(_))));
        assert_eq!(executed.m, Some(MCode::ReportPosition));
        // Report reflects the completed move
        assert_eq!(out, "X1.00 Y0.00 Z0.00 E0.00 ABS\r\nCFC\r\n>\r\n");
    }

    #[test]
    fn test_echo_and_verbose() {
        let mut config = unit_config(AxisCoupling::Independent);
        config.echo = true;
        config.verbose = true;
        let mut ctrl = controller(&config);

        let (_, out) = run(&mut ctrl, "G1 X2 F1");
        assert!(out.starts_with("G1 X2 F1\r\nmove: steps X2 Y0 Z0 E0, planned 2000000 us"));
        assert!(out.ends_with(READY));
    }

    #[test]
    fn test_mirrored_move() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Mirrored));
        run(&mut ctrl, "G1 X10 F10");
        assert_eq!(ctrl.bank().steps, [10, 0, 10, 0]);
        assert_eq!(ctrl.bank().net_steps, [10, 0, 10, 0]);
        assert_eq!(ctrl.position(), Position::new(10.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_overlong_line_still_processed() {
        let mut ctrl = controller(&unit_config(AxisCoupling::Independent));
        let mut text = String::from("G1 X3 F10 ");
        while text.len() < 100 {
            text.push_str("Q0 ");
        }
        let line = Line::from_bytes(text.as_bytes());
        assert!(line.truncated);

        let mut out = String::new();
        ctrl.process_line(&line, &mut out).unwrap();
        assert_eq!(ctrl.position()[Axis::X], 3.0);
        assert_eq!(out, READY);
    }
}
