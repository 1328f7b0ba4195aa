//! # Goal Dispatcher
//!
//! In goal-directed mode the chassis stick becomes a goal offset in the
//! robot's own frame. The offset is moved into the global frame and handed
//! to the navigation executor, no more often than [`GOAL_THROTTLE`].
//!
//! ## Per-Sample Decision
//!
//! 1. Both `|x|` and `|y|` within [`GOAL_DEADZONE`]: no goal.
//! 2. Transform lookup fails: goal dropped, warning logged.
//! 3. Less than [`GOAL_THROTTLE`] since the last submission: skipped.
//! 4. Otherwise: submitted.
//!
//! Submission and cancellation are fire-and-forget. A cancellation may reach
//! the executor before a goal submitted just ahead of it; no ordering is
//! promised beyond what the client provides.

use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::geometry::Pose;
use super::transform::{TimePoint, TransformLookup};

/// Stick magnitude at or below which no goal is produced.
pub const GOAL_DEADZONE: f64 = 0.1;

/// Minimum interval between two goal submissions.
pub const GOAL_THROTTLE: Duration = Duration::from_millis(250);

/// How enabled samples are turned into motion. Fixed at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ControlMode {
    /// Velocity commands straight from the sticks.
    #[default]
    #[serde(rename = "manual_control", alias = "manual")]
    Manual,
    /// Navigation goals offset from the robot's current pose.
    #[serde(rename = "auto_control", alias = "goal_directed")]
    GoalDirected,
}

impl ControlMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::Manual => "manual_control",
            ControlMode::GoalDirected => "auto_control",
        }
    }
}

/// Navigation target in the global frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub frame_id: String,
    pub pose: Pose,
    /// Time of the sample that produced the goal.
    pub stamp: Instant,
}

/// Opaque identifier for a submitted goal. Never awaited by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GoalHandle(pub u64);

/// Navigation goal executor.
///
/// Both calls must return immediately; results are not reported back.
#[cfg_attr(test, mockall::automock)]
pub trait NavigationClient {
    fn send_goal(&mut self, goal: Goal) -> GoalHandle;

    /// Requests cancellation of every goal submitted before `before`.
    fn cancel_goals_before(&mut self, before: Instant);
}

/// What happened to the goal for one goal-directed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    InDeadzone,
    TransformFailed,
    Throttled,
    Submitted(GoalHandle),
}

/// Per-stream memory of the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchState {
    stop_pending: bool,
    last_goal_sent: Option<Instant>,
}

impl DispatchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the one-shot stop for the next disable edge.
    pub fn arm_stop(&mut self) {
        self.stop_pending = true;
    }

    /// Consumes the pending stop. Returns `true` at most once per arming.
    pub fn take_stop(&mut self) -> bool {
        std::mem::replace(&mut self.stop_pending, false)
    }

    #[must_use]
    pub fn stop_pending(&self) -> bool {
        self.stop_pending
    }

    #[must_use]
    pub fn last_goal_sent(&self) -> Option<Instant> {
        self.last_goal_sent
    }

    /// Whether a goal may be submitted at `now`.
    #[must_use]
    pub fn throttle_open(&self, now: Instant) -> bool {
        self.last_goal_sent
            .map_or(true, |last| now.saturating_duration_since(last) >= GOAL_THROTTLE)
    }

    fn record_goal(&mut self, now: Instant) {
        self.last_goal_sent = Some(now);
    }
}

/// Frames used when turning a stick offset into a goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDispatcher {
    pub robot_base_frame: String,
    pub global_frame: String,
}

impl Default for GoalDispatcher {
    fn default() -> Self {
        Self {
            robot_base_frame: "base_link".to_string(),
            global_frame: "map".to_string(),
        }
    }
}

impl GoalDispatcher {
    /// Handles the goal for one enabled sample with scaled chassis `x`, `y`.
    pub fn dispatch<T, N>(
        &self,
        x: f64,
        y: f64,
        now: Instant,
        state: &mut DispatchState,
        transforms: &T,
        navigator: &mut N,
    ) -> GoalOutcome
    where
        T: TransformLookup + ?Sized,
        N: NavigationClient + ?Sized,
    {
        if x.abs() <= GOAL_DEADZONE && y.abs() <= GOAL_DEADZONE {
            // Still counts as driving, so the next release sends a stop.
            state.arm_stop();
            return GoalOutcome::InDeadzone;
        }

        let offset = Pose::planar_offset(x, y);
        let transform = match transforms.lookup_transform(
            &self.global_frame,
            &self.robot_base_frame,
            TimePoint::Latest,
        ) {
            Ok(tf) => tf,
            Err(e) => {
                warn!(
                    "Failed to transform goal pose from {} to {}: {}",
                    self.robot_base_frame, self.global_frame, e
                );
                return GoalOutcome::TransformFailed;
            }
        };

        if !state.throttle_open(now) {
            debug!("Goal throttled ({:?} minimum interval)", GOAL_THROTTLE);
            return GoalOutcome::Throttled;
        }

        let goal = Goal {
            frame_id: self.global_frame.clone(),
            pose: transform.apply(&offset),
            stamp: now,
        };
        let handle = navigator.send_goal(goal);
        state.record_goal(now);
        debug!("Submitted goal {:?} (offset x={:.3}, y={:.3})", handle, x, y);

        GoalOutcome::Submitted(handle)
    }
}
