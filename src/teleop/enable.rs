//! # Enable State Machine
//!
//! Classifies each sample as disabled, normal or turbo from the configured
//! deadman and turbo buttons.
//!
//! | Turbo pressed | Enable required | Enable pressed | State |
//! |---------------|-----------------|----------------|-------|
//! | yes | - | - | `Turbo` |
//! | no | no | - | `Normal` |
//! | no | yes | yes | `Normal` |
//! | no | yes | no | `Disabled` |
//!
//! The classification itself is stateless. The one bit of memory needed to
//! emit a single stop command on release lives in
//! [`DispatchState`](super::dispatch::DispatchState).

use super::mapping::Profile;
use super::sample::InputSample;

/// Button index meaning "no button configured".
pub const NO_BUTTON: i64 = -1;

/// Deadman and turbo button settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableConfig {
    /// Button that must be held to drive. Negative: never pressed.
    pub enable_button: i64,
    /// Button that selects the turbo profile. Negative: turbo disabled.
    pub turbo_button: i64,
    /// When false, every sample without turbo is `Normal`.
    pub require_enable_button: bool,
}

impl Default for EnableConfig {
    fn default() -> Self {
        Self {
            enable_button: 5,
            turbo_button: NO_BUTTON,
            require_enable_button: true,
        }
    }
}

impl EnableConfig {
    /// Whether a turbo button is configured at all.
    #[must_use]
    pub fn turbo_enabled(&self) -> bool {
        self.turbo_button >= 0
    }

    /// Classifies `sample`.
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::teleop::enable::{EnableConfig, EnableState};
    /// use joy_teleop::teleop::sample::InputSample;
    ///
    /// let config = EnableConfig { enable_button: 0, turbo_button: 1, require_enable_button: true };
    ///
    /// assert_eq!(config.classify(&InputSample::new(vec![], vec![false, false])), EnableState::Disabled);
    /// assert_eq!(config.classify(&InputSample::new(vec![], vec![true, false])), EnableState::Normal);
    /// assert_eq!(config.classify(&InputSample::new(vec![], vec![false, true])), EnableState::Turbo);
    /// ```
    #[must_use]
    pub fn classify(&self, sample: &InputSample) -> EnableState {
        if self.turbo_enabled() && sample.button(self.turbo_button) {
            EnableState::Turbo
        } else if !self.require_enable_button || sample.button(self.enable_button) {
            EnableState::Normal
        } else {
            EnableState::Disabled
        }
    }
}

/// Result of classifying one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableState {
    Disabled,
    Normal,
    Turbo,
}

impl EnableState {
    /// Scale profile to drive with, or `None` when disabled.
    #[must_use]
    pub fn profile(self) -> Option<Profile> {
        match self {
            EnableState::Disabled => None,
            EnableState::Normal => Some(Profile::Normal),
            EnableState::Turbo => Some(Profile::Turbo),
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != EnableState::Disabled
    }
}
