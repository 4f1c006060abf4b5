//! Simple TOML parser for machine configuration
//!
//! This is a minimal, allocation-free parser that handles only the subset
//! needed for `machine.toml`. It does NOT support the full TOML grammar.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - [section] and [section name] / [section.name] headers
//! - Comments (# ...), including trailing comments
//!
//! Unknown keys inside a known section are ignored.

use super::hardware::{ConfigError, MachineConfig, PinConfig, StepperHwConfig};
use crate::motion::{Axis, AxisCoupling};

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Machine,
    Serial,
    Stepper(Axis),
    Homing,
    Driver,
}

/// Parse and validate a `machine.toml` document
pub fn parse_config(input: &str) -> Result<MachineConfig, ConfigError> {
    let mut config = MachineConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(ConfigError::InvalidSection);
            }
            section = parse_section_header(&header[1..header.len() - 1])?;
            if let Section::Stepper(axis) = section {
                config.steppers[axis.index()].get_or_insert_with(StepperHwConfig::default);
            }
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    config.validate()?;
    Ok(config)
}

/// Parse section header like "machine", "stepper x" or "stepper.x"
fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    let header = header.trim();

    let (kind, name) = match header.find(|c: char| c == ' ' || c == '.') {
        Some(pos) => (&header[..pos], Some(header[pos + 1..].trim())),
        None => (header, None),
    };

    match (kind, name) {
        ("machine", None) => Ok(Section::Machine),
        ("serial", None) => Ok(Section::Serial),
        ("homing", None) => Ok(Section::Homing),
        ("driver", None) => Ok(Section::Driver),
        ("stepper", Some(name)) => Axis::from_name(name)
            .map(Section::Stepper)
            .ok_or(ConfigError::InvalidSection),
        _ => Err(ConfigError::InvalidSection),
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        // Make sure # is not inside a string
        Some(hash_pos) if line[..hash_pos].matches('"').count() % 2 == 0 => {
            line[..hash_pos].trim()
        }
        _ => line,
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(line[eq_pos + 1..].trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue)
}

fn parse_float(value: &str) -> Result<f32, ConfigError> {
    let v: f32 = value.parse().map_err(|_| ConfigError::InvalidValue)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ConfigError::InvalidValue)
    }
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

/// Parse a pin string like "gpio5", "!gpio8" or "^gpio9"
pub fn parse_pin(value: &str) -> Result<PinConfig, ConfigError> {
    let mut s = parse_string(value);
    let mut inverted = false;
    let mut pull_up = false;

    // Check for modifiers
    loop {
        if let Some(rest) = s.strip_prefix('!') {
            inverted = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('^') {
            pull_up = true;
            s = rest;
        } else {
            break;
        }
    }

    let num = s.strip_prefix("gpio").ok_or(ConfigError::InvalidPin)?;
    let pin: u8 = num.parse().map_err(|_| ConfigError::InvalidPin)?;

    Ok(PinConfig {
        pin,
        inverted,
        pull_up,
    })
}

fn parse_coupling(value: &str) -> Result<AxisCoupling, ConfigError> {
    match parse_string(value) {
        "mirrored" => Ok(AxisCoupling::Mirrored),
        "independent" => Ok(AxisCoupling::Independent),
        _ => Err(ConfigError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut MachineConfig,
) -> Result<(), ConfigError> {
    match section {
        Section::Root => {
            if key == "version" {
                config.version = parse_int(value)?;
            }
        }
        Section::Machine => match key {
            "coupling" => config.coupling = parse_coupling(value)?,
            "default_feedrate" => config.default_feedrate = parse_float(value)?,
            "echo" => config.echo = parse_bool(value)?,
            "verbose" => config.verbose = parse_bool(value)?,
            _ => {}
        },
        Section::Serial => match key {
            "baud_rate" => config.serial.baud_rate = parse_int(value)?,
            "tx_pin" => config.serial.tx_pin = parse_pin(value)?,
            "rx_pin" => config.serial.rx_pin = parse_pin(value)?,
            _ => {}
        },
        Section::Stepper(axis) => {
            let stepper = config.steppers[axis.index()].get_or_insert_with(StepperHwConfig::default);
            match key {
                "step_pin" => stepper.step_pin = parse_pin(value)?,
                "dir_pin" => stepper.dir_pin = parse_pin(value)?,
                "enable_pin" => stepper.enable_pin = parse_pin(value)?,
                "limit_pin" => stepper.limit_pin = parse_pin(value)?,
                "full_steps_per_rotation" => stepper.full_steps_per_rotation = parse_int(value)?,
                "microsteps" => stepper.microsteps = parse_int(value)?,
                "rotation_distance" => stepper.rotation_distance = parse_float(value)?,
                _ => {}
            }
        }
        Section::Homing => match key {
            "step_delay_ms" => config.homing.step_delay_ms = parse_int(value)?,
            "max_steps" => config.homing.max_steps = parse_int(value)?,
            _ => {}
        },
        Section::Driver => {
            if key == "pulse_width_us" {
                config.pulse_width_us = parse_int(value)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::AXIS_COUNT;

    const FULL_CONFIG: &str = r#"
version = 1

[machine]
coupling = "independent"
default_feedrate = 12.5   # mm/s
echo = true
verbose = false

[serial]
baud_rate = 115200
tx_pin = "gpio0"
rx_pin = "gpio1"

[stepper x]
step_pin = "gpio2"
dir_pin = "gpio5"
enable_pin = "!gpio8"
limit_pin = "^!gpio9"
full_steps_per_rotation = 2038
microsteps = 1
rotation_distance = 40

[stepper y]
step_pin = "gpio3"
dir_pin = "gpio6"
enable_pin = "!gpio8"
limit_pin = "^!gpio10"
full_steps_per_rotation = 20
rotation_distance = 0.5

[stepper.z]
step_pin = "gpio4"
dir_pin = "gpio7"
enable_pin = "!gpio8"
limit_pin = "^!gpio11"
full_steps_per_rotation = 2038
rotation_distance = 40.0

[stepper e]
step_pin = "gpio12"
dir_pin = "gpio13"
enable_pin = "!gpio8"
limit_pin = "^!gpio17"
full_steps_per_rotation = 20
microsteps = 1
rotation_distance = 0.5
colour = "blue"

[homing]
step_delay_ms = 3
max_steps = 5000

[driver]
pulse_width_us = 4
"#;

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("gpio11").unwrap();
        assert_eq!(pin.pin, 11);
        assert!(!pin.inverted);
        assert!(!pin.pull_up);

        let pin = parse_pin("!gpio12").unwrap();
        assert_eq!(pin.pin, 12);
        assert!(pin.inverted);

        let pin = parse_pin("^gpio4").unwrap();
        assert_eq!(pin.pin, 4);
        assert!(pin.pull_up);

        let pin = parse_pin("\"^!gpio5\"").unwrap();
        assert_eq!(pin.pin, 5);
        assert!(pin.inverted);
        assert!(pin.pull_up);

        assert_eq!(parse_pin("pin5"), Err(ConfigError::InvalidPin));
        assert_eq!(parse_pin("gpio"), Err(ConfigError::InvalidPin));
    }

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("machine"), Ok(Section::Machine));
        assert_eq!(parse_section_header("stepper x"), Ok(Section::Stepper(Axis::X)));
        assert_eq!(parse_section_header("stepper.e"), Ok(Section::Stepper(Axis::E)));
        assert_eq!(parse_section_header(" driver "), Ok(Section::Driver));
        assert_eq!(parse_section_header("stepper w"), Err(ConfigError::InvalidSection));
        assert_eq!(parse_section_header("stepper"), Err(ConfigError::InvalidSection));
        assert_eq!(parse_section_header("heater"), Err(ConfigError::InvalidSection));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a = 1"), Some(("a", "1")));
        assert_eq!(parse_key_value("a = 1 # note"), Some(("a", "1")));
        assert_eq!(parse_key_value("a = \"x#y\""), Some(("a", "\"x#y\"")));
        assert_eq!(parse_key_value("a ="), None);
        assert_eq!(parse_key_value("no equals"), None);
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL_CONFIG).unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.coupling, AxisCoupling::Independent);
        assert_eq!(config.default_feedrate, 12.5);
        assert!(config.echo);
        assert!(!config.verbose);
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.homing.step_delay_ms, 3);
        assert_eq!(config.homing.max_steps, 5000);
        assert_eq!(config.pulse_width_us, 4);

        let x = config.stepper(Axis::X).unwrap();
        assert_eq!(x.step_pin, PinConfig::new(2));
        assert_eq!(x.enable_pin, PinConfig::inverted(8));
        assert_eq!(
            x.limit_pin,
            PinConfig {
                pin: 9,
                inverted: true,
                pull_up: true
            }
        );
        assert_eq!(x.full_steps_per_rotation, 2038);
        assert_eq!(x.rotation_distance, 40.0);

        // microsteps defaults to 1 when omitted
        assert_eq!(config.stepper(Axis::Y).unwrap().microsteps, 1);

        let units = config.unit_conversion().unwrap();
        assert_eq!(units.steps_per_mm(Axis::E), 40.0);
    }

    #[test]
    fn test_defaults_for_optional_sections() {
        // Only the stepper sections
        let start = FULL_CONFIG.find("[stepper x]").unwrap();
        let end = FULL_CONFIG.find("[homing]").unwrap();
        let text = &FULL_CONFIG[start..end];

        let config = parse_config(text).unwrap();
        assert_eq!(config.coupling, AxisCoupling::Mirrored);
        assert_eq!(config.default_feedrate, 10.0);
        assert!(!config.echo);
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.homing.step_delay_ms, 5);
        assert_eq!(config.homing.max_steps, 100_000);
        assert_eq!(config.pulse_width_us, 2);
        assert!(config.steppers.iter().all(Option::is_some));
        assert_eq!(config.steppers.len(), AXIS_COUNT);
    }

    #[test]
    fn test_missing_stepper() {
        let end = FULL_CONFIG.find("[stepper e]").unwrap();
        assert_eq!(
            parse_config(&FULL_CONFIG[..end]),
            Err(ConfigError::MissingStepper(Axis::E))
        );
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[machine]\ncoupling = \"diagonal\"\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[machine]\necho = yes\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[stepper x]\nmicrosteps = -4\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[stepper x]\nrotation_distance = inf\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[stepper x]\nstep_pin = \"gpio\"\n"),
            Err(ConfigError::InvalidPin)
        );
    }

    #[test]
    fn test_invalid_sections() {
        assert_eq!(parse_config("[heater dryer]\n"), Err(ConfigError::InvalidSection));
        assert_eq!(parse_config("[machine\n"), Err(ConfigError::InvalidSection));
    }

    #[test]
    fn test_geometry_errors_surface() {
        let text = FULL_CONFIG.replace("rotation_distance = 40.0", "rotation_distance = 0");
        assert_eq!(parse_config(&text), Err(ConfigError::InvalidGeometry(Axis::Z)));
    }

    #[test]
    fn test_unsupported_version() {
        let text = FULL_CONFIG.replace("version = 1", "version = 3");
        assert_eq!(parse_config(&text), Err(ConfigError::UnsupportedVersion(3)));

        let text = FULL_CONFIG.replace("step_delay_ms = 3", "step_delay_ms = 60000");
        assert_eq!(parse_config(&text), Err(ConfigError::InvalidValue));
    }
}
