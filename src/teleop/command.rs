//! # Command Composer
//!
//! Builds the chassis velocity command and the gimbal joint command for one
//! enabled sample.
//!
//! ## Velocity Fields
//!
//! | Field | Group | Channel |
//! |-------|-------|---------|
//! | `linear.x` | chassis | `x` |
//! | `linear.y` | chassis | `y` |
//! | `linear.z` | chassis | `z` |
//! | `angular.x` | gimbal | `roll` |
//! | `angular.y` | gimbal | `pitch` |
//! | `angular.z` | gimbal | `yaw` (sign flipped when reversing, if enabled) |

use serde::Serialize;
use std::time::Instant;

use super::geometry::Vector3;
use super::gimbal::GimbalState;
use super::mapping::{channels, map_value, AxisMap, Profile, ScaleProfiles};
use super::sample::InputSample;

/// Joint name for the gimbal pitch axis.
pub const GIMBAL_PITCH_JOINT: &str = "gimbal_pitch_joint";
/// Joint name for the gimbal yaw axis.
pub const GIMBAL_YAW_JOINT: &str = "gimbal_yaw_joint";

/// Linear and angular velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VelocityCommand {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl VelocityCommand {
    /// All six fields zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

/// Gimbal joint position targets, names paired positionally with positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GimbalCommand {
    pub name: [&'static str; 2],
    pub position: [f64; 2],
}

impl GimbalCommand {
    #[must_use]
    pub fn from_state(state: &GimbalState) -> Self {
        Self {
            name: [GIMBAL_PITCH_JOINT, GIMBAL_YAW_JOINT],
            position: [state.pitch(), state.yaw()],
        }
    }

    #[must_use]
    pub fn pitch(&self) -> f64 {
        self.position[0]
    }

    #[must_use]
    pub fn yaw(&self) -> f64 {
        self.position[1]
    }
}

/// Axis bindings and scale profiles for both channel groups.
#[derive(Debug, Clone, Default)]
pub struct CommandComposer {
    pub chassis_axes: AxisMap,
    pub gimbal_axes: AxisMap,
    pub chassis_scales: ScaleProfiles,
    pub gimbal_scales: ScaleProfiles,
    /// Flip yaw while driving backwards.
    pub inverted_reverse: bool,
}

impl CommandComposer {
    /// Scaled chassis channel value for the given profile.
    #[must_use]
    pub fn chassis(&self, profile: Profile, channel: &str, sample: &InputSample) -> f64 {
        map_value(&self.chassis_axes, self.chassis_scales.get(profile), channel, sample)
    }

    /// Scaled gimbal channel value for the given profile.
    #[must_use]
    pub fn gimbal(&self, profile: Profile, channel: &str, sample: &InputSample) -> f64 {
        map_value(&self.gimbal_axes, self.gimbal_scales.get(profile), channel, sample)
    }

    /// Builds the velocity command for `sample`.
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::teleop::command::CommandComposer;
    /// use joy_teleop::teleop::mapping::{channels, AxisMap, Profile, ScaleProfile, ScaleProfiles};
    /// use joy_teleop::teleop::sample::InputSample;
    ///
    /// let unit = ScaleProfile::from_pairs([(channels::X, 1.0), (channels::YAW, 1.0)]);
    /// let composer = CommandComposer {
    ///     chassis_axes: AxisMap::from_pairs([(channels::X, 0)]),
    ///     gimbal_axes: AxisMap::from_pairs([(channels::YAW, 1)]),
    ///     chassis_scales: ScaleProfiles::new(unit.clone(), unit.clone()),
    ///     gimbal_scales: ScaleProfiles::new(unit.clone(), unit),
    ///     inverted_reverse: true,
    /// };
    ///
    /// let cmd = composer.velocity(Profile::Normal, &InputSample::new(vec![-0.5, 0.3], vec![]));
    /// assert_eq!(cmd.linear.x, -0.5);
    /// assert_eq!(cmd.angular.z, -0.3);
    /// ```
    #[must_use]
    pub fn velocity(&self, profile: Profile, sample: &InputSample) -> VelocityCommand {
        let lin_x = self.chassis(profile, channels::X, sample);
        let yaw = self.gimbal(profile, channels::YAW, sample);
        let ang_z = if self.inverted_reverse && lin_x < 0.0 {
            -yaw
        } else {
            yaw
        };

        VelocityCommand {
            linear: Vector3::new(
                lin_x,
                self.chassis(profile, channels::Y, sample),
                self.chassis(profile, channels::Z, sample),
            ),
            angular: Vector3::new(
                self.gimbal(profile, channels::ROLL, sample),
                self.gimbal(profile, channels::PITCH, sample),
                ang_z,
            ),
        }
    }

    /// Integrates gimbal rates into `state` and returns the resulting targets.
    pub fn gimbal_command(
        &self,
        state: &mut GimbalState,
        profile: Profile,
        sample: &InputSample,
        now: Instant,
    ) -> GimbalCommand {
        state.integrate(&self.gimbal_axes, self.gimbal_scales.get(profile), sample, now);
        GimbalCommand::from_state(state)
    }
}
