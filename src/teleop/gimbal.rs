//! # Gimbal Integrator
//!
//! Turns gimbal rate input (pitch and yaw) into an absolute joint target by
//! integrating over wall time. The first call only records the baseline.

use std::time::Instant;

use super::mapping::{channels, map_value, AxisMap, ScaleProfile};
use super::sample::InputSample;

/// Accumulated gimbal orientation.
///
/// Never reset for the lifetime of the process. Only advanced while samples
/// are being processed, so it holds still while input is disabled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GimbalState {
    pitch: f64,
    yaw: f64,
    last_update: Option<Instant>,
}

impl GimbalState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated pitch in radians.
    #[must_use]
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Accumulated yaw in radians.
    #[must_use]
    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    /// Time of the last integration step, if any.
    #[must_use]
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    /// Advances the accumulators by `rate * dt` for pitch and yaw.
    ///
    /// `now` must come from a monotonic clock. A `now` earlier than the
    /// previous update counts as zero elapsed time.
    pub fn integrate(
        &mut self,
        gimbal_map: &AxisMap,
        scale: &ScaleProfile,
        sample: &InputSample,
        now: Instant,
    ) {
        let dt = self
            .last_update
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64());
        self.last_update = Some(now);

        self.pitch += map_value(gimbal_map, scale, channels::PITCH, sample) * dt;
        self.yaw += map_value(gimbal_map, scale, channels::YAW, sample) * dt;
    }
}
