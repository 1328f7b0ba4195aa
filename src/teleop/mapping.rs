//! # Value Mapper
//!
//! Resolves a logical channel ("x", "yaw", ...) to a physical axis and scales
//! the raw reading into a signed command value.
//!
//! ## Resolution Rules
//!
//! | Condition | Result |
//! |-----------|--------|
//! | Channel missing from the axis map | `0.0` |
//! | Channel mapped to a negative index | `0.0` |
//! | Channel missing from the scale profile | `0.0` |
//! | Sample has too few axes | `0.0` |
//! | Otherwise | `axes[index] * scale` |
//!
//! ## Usage
//!
//! ```
//! use joy_teleop::teleop::mapping::{map_value, AxisMap, ScaleProfile, channels};
//! use joy_teleop::teleop::sample::InputSample;
//!
//! let axes = AxisMap::from_pairs([(channels::X, 1)]);
//! let scale = ScaleProfile::from_pairs([(channels::X, 0.5)]);
//! let sample = InputSample::new(vec![0.0, 0.8], vec![]);
//!
//! assert!((map_value(&axes, &scale, channels::X, &sample) - 0.4).abs() < 1e-9);
//! assert_eq!(map_value(&axes, &scale, channels::Y, &sample), 0.0);
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use super::sample::InputSample;

/// Axis index meaning "this channel is not bound to any axis".
pub const UNMAPPED: i64 = -1;

/// Logical channel names.
pub mod channels {
    /// Forward/backward translation
    pub const X: &str = "x";
    /// Lateral translation
    pub const Y: &str = "y";
    /// Vertical translation
    pub const Z: &str = "z";
    /// Rotation about the vertical axis
    pub const YAW: &str = "yaw";
    /// Rotation about the lateral axis
    pub const PITCH: &str = "pitch";
    /// Rotation about the forward axis
    pub const ROLL: &str = "roll";
}

/// Channel name to axis index table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AxisMap(BTreeMap<String, i64>);

impl AxisMap {
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Returns the axis index bound to `channel`, or `None` when the channel
    /// is absent or carries a negative index.
    #[must_use]
    pub fn index(&self, channel: &str) -> Option<usize> {
        self.0
            .get(channel)
            .and_then(|&index| usize::try_from(index).ok())
    }

    /// Iterates over every channel with a usable axis index.
    pub fn mapped(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0
            .iter()
            .filter_map(|(name, &index)| usize::try_from(index).ok().map(|i| (name.as_str(), i)))
    }

    /// Iterates over all raw entries, including unmapped ones.
    pub fn entries(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, &index)| (name.as_str(), index))
    }
}

/// Channel name to scale factor table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ScaleProfile(BTreeMap<String, f64>);

impl ScaleProfile {
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[must_use]
    pub fn scale(&self, channel: &str) -> Option<f64> {
        self.0.get(channel).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, &scale)| (name.as_str(), scale))
    }
}

/// Which scale profile is active for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Normal,
    Turbo,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Normal => f.write_str("normal"),
            Profile::Turbo => f.write_str("turbo"),
        }
    }
}

/// The "normal" and "turbo" scale profiles for one channel group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleProfiles {
    pub normal: ScaleProfile,
    pub turbo: ScaleProfile,
}

impl ScaleProfiles {
    #[must_use]
    pub fn new(normal: ScaleProfile, turbo: ScaleProfile) -> Self {
        Self { normal, turbo }
    }

    #[must_use]
    pub fn get(&self, profile: Profile) -> &ScaleProfile {
        match profile {
            Profile::Normal => &self.normal,
            Profile::Turbo => &self.turbo,
        }
    }
}

/// Reads `channel` from `sample` and applies its scale.
///
/// Every unresolvable case yields `0.0`; see the module table.
#[must_use]
pub fn map_value(
    axis_map: &AxisMap,
    scale_profile: &ScaleProfile,
    channel: &str,
    sample: &InputSample,
) -> f64 {
    let Some(index) = axis_map.index(channel) else {
        return 0.0;
    };
    let Some(scale) = scale_profile.scale(channel) else {
        return 0.0;
    };
    sample.axis(index).map_or(0.0, |value| value * scale)
}
