//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every key is optional. Defaults reproduce a single-stick
//! differential drive: axis 5 drives forward at 0.5 m/s (1.0 in turbo), axis 2
//! slews the gimbal yaw, button 5 is the deadman.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, TeleopError};
use crate::teleop::command::CommandComposer;
use crate::teleop::dispatch::{ControlMode, GoalDispatcher};
use crate::teleop::enable::EnableConfig;
use crate::teleop::geometry::Transform;
use crate::teleop::mapping::{channels, AxisMap, ScaleProfile, ScaleProfiles, UNMAPPED};
use crate::teleop::transform::StaticTransformTree;
use crate::teleop::TeleopSettings;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub teleop: TeleopConfig,

    #[serde(default = "default_axis_chassis")]
    pub axis_chassis: AxisMap,

    #[serde(default = "default_axis_gimbal")]
    pub axis_gimbal: AxisMap,

    #[serde(default = "default_scale_chassis")]
    pub scale_chassis: ScaleProfile,

    #[serde(default = "default_scale_chassis_turbo")]
    pub scale_chassis_turbo: ScaleProfile,

    #[serde(default = "default_scale_gimbal")]
    pub scale_gimbal: ScaleProfile,

    #[serde(default = "default_scale_gimbal_turbo")]
    pub scale_gimbal_turbo: ScaleProfile,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub transforms: Vec<StaticTransformConfig>,
}

/// Buttons, mode and frames
#[derive(Debug, Deserialize, Clone)]
pub struct TeleopConfig {
    #[serde(default = "default_require_enable_button")]
    pub require_enable_button: bool,

    #[serde(default = "default_enable_button")]
    pub enable_button: i64,

    #[serde(default = "default_enable_turbo_button")]
    pub enable_turbo_button: i64,

    #[serde(default)]
    pub inverted_reverse: bool,

    #[serde(default)]
    pub control_mode: ControlMode,

    #[serde(default)]
    pub publish_stamped_twist: bool,

    #[serde(default = "default_robot_base_frame")]
    pub robot_base_frame: String,

    #[serde(default = "default_global_frame")]
    pub global_frame: String,
}

/// Where samples come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Linux gamepad via evdev
    #[default]
    Evdev,
    /// JSON lines on standard input
    Stdin,
}

/// Input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default)]
    pub source: InputSource,

    /// Empty means auto-detect.
    #[serde(default)]
    pub device_path: String,
}

/// Where commands go
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputSink {
    #[default]
    Stdout,
    Serial,
}

/// Output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub sink: OutputSink,

    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Empty means console only.
    #[serde(default)]
    pub log_dir: String,
}

/// One static parent → child transform
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StaticTransformConfig {
    pub parent: String,
    pub child: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub yaw: f64,
}

// Default value functions
fn default_require_enable_button() -> bool { true }
fn default_enable_button() -> i64 { 5 }
fn default_enable_turbo_button() -> i64 { -1 }
fn default_robot_base_frame() -> String { "base_link".to_string() }
fn default_global_frame() -> String { "map".to_string() }

fn default_axis_chassis() -> AxisMap {
    AxisMap::from_pairs([(channels::X, 5), (channels::Y, UNMAPPED), (channels::YAW, UNMAPPED)])
}
fn default_axis_gimbal() -> AxisMap {
    AxisMap::from_pairs([(channels::YAW, 2), (channels::PITCH, UNMAPPED), (channels::ROLL, UNMAPPED)])
}
fn default_scale_chassis() -> ScaleProfile {
    ScaleProfile::from_pairs([(channels::X, 0.5), (channels::Y, 0.0), (channels::Z, 0.0)])
}
fn default_scale_chassis_turbo() -> ScaleProfile {
    ScaleProfile::from_pairs([(channels::X, 1.0), (channels::Y, 0.0), (channels::Z, 0.0)])
}
fn default_scale_gimbal() -> ScaleProfile {
    ScaleProfile::from_pairs([(channels::YAW, 0.5), (channels::PITCH, 0.0), (channels::ROLL, 0.0)])
}
fn default_scale_gimbal_turbo() -> ScaleProfile {
    ScaleProfile::from_pairs([(channels::YAW, 1.0), (channels::PITCH, 0.0), (channels::ROLL, 0.0)])
}

fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 115200 }

fn default_log_level() -> String { "info".to_string() }

/// Baud rates accepted for the serial sink
const VALID_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            require_enable_button: default_require_enable_button(),
            enable_button: default_enable_button(),
            enable_turbo_button: default_enable_turbo_button(),
            inverted_reverse: false,
            control_mode: ControlMode::default(),
            publish_stamped_twist: false,
            robot_base_frame: default_robot_base_frame(),
            global_frame: default_global_frame(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: InputSource::default(),
            device_path: String::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sink: OutputSink::default(),
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            teleop: TeleopConfig::default(),
            axis_chassis: default_axis_chassis(),
            axis_gimbal: default_axis_gimbal(),
            scale_chassis: default_scale_chassis(),
            scale_chassis_turbo: default_scale_chassis_turbo(),
            scale_gimbal: default_scale_gimbal(),
            scale_gimbal_turbo: default_scale_gimbal_turbo(),
            input: InputConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            transforms: Vec::new(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> TeleopError {
    TeleopError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joy_teleop::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Frames
        if self.teleop.robot_base_frame.is_empty() {
            return Err(invalid("robot_base_frame cannot be empty"));
        }
        if self.teleop.global_frame.is_empty() {
            return Err(invalid("global_frame cannot be empty"));
        }
        if self.teleop.robot_base_frame == self.teleop.global_frame {
            return Err(invalid("robot_base_frame and global_frame must differ"));
        }

        // Buttons: -1 disables, anything lower is a typo
        if self.teleop.enable_button < -1 {
            return Err(invalid("enable_button must be -1 or a button index"));
        }
        if self.teleop.enable_turbo_button < -1 {
            return Err(invalid("enable_turbo_button must be -1 or a button index"));
        }
        if self.teleop.enable_turbo_button >= 0
            && self.teleop.enable_turbo_button == self.teleop.enable_button
        {
            return Err(invalid("enable_turbo_button must differ from enable_button"));
        }

        // Axis maps
        for (group, map) in [("axis_chassis", &self.axis_chassis), ("axis_gimbal", &self.axis_gimbal)] {
            for (name, index) in map.entries() {
                if index < UNMAPPED {
                    return Err(invalid(format!(
                        "{}.{} must be -1 or an axis index, got {}",
                        group, name, index
                    )));
                }
            }
        }

        // Scale profiles
        for (group, profile) in [
            ("scale_chassis", &self.scale_chassis),
            ("scale_chassis_turbo", &self.scale_chassis_turbo),
            ("scale_gimbal", &self.scale_gimbal),
            ("scale_gimbal_turbo", &self.scale_gimbal_turbo),
        ] {
            for (name, scale) in profile.entries() {
                if !scale.is_finite() {
                    return Err(invalid(format!("{}.{} must be a finite number", group, name)));
                }
            }
        }

        // Serial sink
        if self.output.sink == OutputSink::Serial {
            if self.output.serial_port.is_empty() {
                return Err(invalid("serial_port cannot be empty when sink is serial"));
            }
            if !VALID_BAUD_RATES.contains(&self.output.baud_rate) {
                return Err(invalid(format!(
                    "baud_rate must be one of: {:?}",
                    VALID_BAUD_RATES
                )));
            }
        }

        // Logging
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(invalid(format!(
                "log level '{}' must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        // Static transforms
        for tf in &self.transforms {
            if tf.parent.is_empty() || tf.child.is_empty() {
                return Err(invalid("transform parent and child cannot be empty"));
            }
            if tf.parent == tf.child {
                return Err(invalid(format!("transform {} cannot be its own parent", tf.child)));
            }
            if ![tf.x, tf.y, tf.z, tf.yaw].iter().all(|v| v.is_finite()) {
                return Err(invalid(format!(
                    "transform {} -> {} must have finite values",
                    tf.parent, tf.child
                )));
            }
        }

        Ok(())
    }

    /// Builds the processing-step settings
    #[must_use]
    pub fn teleop_settings(&self) -> TeleopSettings {
        TeleopSettings {
            enable: EnableConfig {
                enable_button: self.teleop.enable_button,
                turbo_button: self.teleop.enable_turbo_button,
                require_enable_button: self.teleop.require_enable_button,
            },
            composer: CommandComposer {
                chassis_axes: self.axis_chassis.clone(),
                gimbal_axes: self.axis_gimbal.clone(),
                chassis_scales: ScaleProfiles::new(
                    self.scale_chassis.clone(),
                    self.scale_chassis_turbo.clone(),
                ),
                gimbal_scales: ScaleProfiles::new(
                    self.scale_gimbal.clone(),
                    self.scale_gimbal_turbo.clone(),
                ),
                inverted_reverse: self.teleop.inverted_reverse,
            },
            mode: self.teleop.control_mode,
            goals: GoalDispatcher {
                robot_base_frame: self.teleop.robot_base_frame.clone(),
                global_frame: self.teleop.global_frame.clone(),
            },
        }
    }

    /// Builds the static transform tree from `[[transforms]]`
    #[must_use]
    pub fn transform_tree(&self) -> StaticTransformTree {
        let mut tree = StaticTransformTree::new();
        for tf in &self.transforms {
            tree.insert(
                &tf.parent,
                &tf.child,
                Transform::from_xyz_yaw(tf.x, tf.y, tf.z, tf.yaw),
            );
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teleop::transform::{TimePoint, TransformLookup};

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.teleop.enable_button, 5);
        assert_eq!(config.teleop.enable_turbo_button, -1);
        assert!(config.teleop.require_enable_button);
        assert_eq!(config.teleop.control_mode, ControlMode::Manual);
        assert_eq!(config.axis_chassis.index(channels::X), Some(5));
        assert_eq!(config.axis_gimbal.index(channels::YAW), Some(2));
        assert_eq!(config.scale_chassis.scale(channels::X), Some(0.5));
        assert_eq!(config.scale_gimbal_turbo.scale(channels::YAW), Some(1.0));
        assert_eq!(config.input.source, InputSource::Evdev);
        assert_eq!(config.output.sink, OutputSink::Stdout);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[teleop]
enable_button = 4
enable_turbo_button = 5
inverted_reverse = true
control_mode = "auto_control"
robot_base_frame = "base_footprint"

[axis_chassis]
x = 1
y = 0

[scale_chassis]
x = 0.7
y = 0.4

[input]
source = "stdin"

[[transforms]]
parent = "map"
child = "base_footprint"
x = 2.0
yaw = 1.57
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.teleop.enable_button, 4);
        assert_eq!(config.teleop.enable_turbo_button, 5);
        assert!(config.teleop.inverted_reverse);
        assert_eq!(config.teleop.control_mode, ControlMode::GoalDirected);
        assert_eq!(config.axis_chassis.index(channels::Y), Some(0));
        assert_eq!(config.axis_chassis.index(channels::YAW), None);
        assert_eq!(config.input.source, InputSource::Stdin);
        assert_eq!(config.transforms.len(), 1);
        assert_eq!(config.transforms[0].y, 0.0);
    }

    #[test]
    fn test_shipped_default_toml_matches_defaults() {
        let config = Config::from_toml_str(include_str!("../config/default.toml")).unwrap();
        let defaults = create_valid_config();

        assert_eq!(config.teleop.enable_button, defaults.teleop.enable_button);
        assert_eq!(config.axis_chassis, defaults.axis_chassis);
        assert_eq!(config.scale_gimbal, defaults.scale_gimbal);
        assert_eq!(config.output.baud_rate, defaults.output.baud_rate);
        assert_eq!(config.transforms.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/joy-teleop.toml");
        assert!(matches!(result, Err(TeleopError::Io(_))));
    }

    #[test]
    fn test_control_mode_aliases() {
        let config = Config::from_toml_str("[teleop]\ncontrol_mode = \"goal_directed\"").unwrap();
        assert_eq!(config.teleop.control_mode, ControlMode::GoalDirected);
        let config = Config::from_toml_str("[teleop]\ncontrol_mode = \"manual\"").unwrap();
        assert_eq!(config.teleop.control_mode, ControlMode::Manual);
    }

    #[test]
    fn test_unknown_control_mode() {
        let result = Config::from_toml_str("[teleop]\ncontrol_mode = \"autopilot\"");
        assert!(matches!(result, Err(TeleopError::Config(_))));
    }

    #[test]
    fn test_empty_base_frame() {
        let mut config = create_valid_config();
        config.teleop.robot_base_frame = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_global_frame() {
        let mut config = create_valid_config();
        config.teleop.global_frame = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_frames() {
        let mut config = create_valid_config();
        config.teleop.global_frame = config.teleop.robot_base_frame.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enable_button_below_sentinel() {
        let mut config = create_valid_config();
        config.teleop.enable_button = -2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_turbo_button_below_sentinel() {
        let mut config = create_valid_config();
        config.teleop.enable_turbo_button = -3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_turbo_same_as_enable() {
        let mut config = create_valid_config();
        config.teleop.enable_turbo_button = config.teleop.enable_button;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_both_buttons_disabled_is_valid() {
        let mut config = create_valid_config();
        config.teleop.enable_button = -1;
        config.teleop.enable_turbo_button = -1;
        config.teleop.require_enable_button = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_axis_index_below_sentinel() {
        let mut config = create_valid_config();
        config.axis_gimbal = AxisMap::from_pairs([(channels::PITCH, -4)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_scale() {
        let mut config = create_valid_config();
        config.scale_chassis_turbo = ScaleProfile::from_pairs([(channels::X, f64::NAN)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serial_sink_requires_port() {
        let mut config = create_valid_config();
        config.output.sink = OutputSink::Serial;
        config.output.serial_port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_serial_port_ignored_for_stdout() {
        let mut config = create_valid_config();
        config.output.serial_port = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = create_valid_config();
        config.output.sink = OutputSink::Serial;
        config.output.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in VALID_BAUD_RATES {
            let mut config = create_valid_config();
            config.output.sink = OutputSink::Serial;
            config.output.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transform_self_parent() {
        let mut config = create_valid_config();
        config.transforms.push(StaticTransformConfig {
            parent: "map".to_string(),
            child: "map".to_string(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transform_non_finite() {
        let mut config = create_valid_config();
        config.transforms.push(StaticTransformConfig {
            parent: "map".to_string(),
            child: "base_link".to_string(),
            x: f64::INFINITY,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_teleop_settings_carry_config() {
        let mut config = create_valid_config();
        config.teleop.enable_turbo_button = 3;
        config.teleop.inverted_reverse = true;
        config.teleop.control_mode = ControlMode::GoalDirected;

        let settings = config.teleop_settings();
        assert_eq!(settings.enable.enable_button, 5);
        assert_eq!(settings.enable.turbo_button, 3);
        assert!(settings.composer.inverted_reverse);
        assert_eq!(settings.mode, ControlMode::GoalDirected);
        assert_eq!(settings.goals.global_frame, "map");
        assert_eq!(settings.composer.chassis_scales.turbo.scale(channels::X), Some(1.0));
    }

    #[test]
    fn test_transform_tree_from_config() {
        let mut config = create_valid_config();
        config.transforms.push(StaticTransformConfig {
            parent: "map".to_string(),
            child: "base_link".to_string(),
            x: 1.0,
            y: 2.0,
            z: 0.0,
            yaw: 0.0,
        });

        let tree = config.transform_tree();
        let tf = tree
            .lookup_transform("map", "base_link", TimePoint::Latest)
            .unwrap();
        assert_eq!(tf.translation.x, 1.0);
        assert_eq!(tf.translation.y, 2.0);
    }

    #[test]
    fn test_default_functions() {
        assert!(default_require_enable_button());
        assert_eq!(default_enable_button(), 5);
        assert_eq!(default_enable_turbo_button(), -1);
        assert_eq!(default_robot_base_frame(), "base_link");
        assert_eq!(default_global_frame(), "map");
        assert_eq!(default_serial_port(), "/dev/ttyACM0");
        assert_eq!(default_baud_rate(), 115200);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_axis_chassis().index(channels::Y), None);
        assert_eq!(default_scale_gimbal().scale(channels::YAW), Some(0.5));
    }
}
