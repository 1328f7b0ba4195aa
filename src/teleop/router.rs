//! # Teleop Processing Step
//!
//! [`Teleop::process`] runs one sample to completion:
//!
//! ```text
//! sample ──► classify ──┬─ Normal/Turbo ─► compose ─► route (velocity | goal) ─► gimbal
//!                       └─ Disabled ─────► stop once per release
//! ```
//!
//! All mutable state (gimbal accumulators, stop flag, goal throttle) is owned
//! here and only touched from this step.

use std::time::Instant;
use tracing::{debug, info};

use super::command::{CommandComposer, GimbalCommand, VelocityCommand};
use super::dispatch::{ControlMode, DispatchState, GoalDispatcher, GoalOutcome, NavigationClient};
use super::enable::{EnableConfig, EnableState};
use super::gimbal::GimbalState;
use super::mapping::{channels, Profile};
use super::sample::InputSample;
use super::transform::TransformLookup;

/// Everything fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct TeleopSettings {
    pub enable: EnableConfig,
    pub composer: CommandComposer,
    pub mode: ControlMode,
    pub goals: GoalDispatcher,
}

/// Commands produced by one processing step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// Classification of the sample.
    pub state: EnableState,
    /// Velocity command to publish, if any.
    pub velocity: Option<VelocityCommand>,
    /// Gimbal joint command to publish, if any.
    pub gimbal: Option<GimbalCommand>,
    /// Goal handling result in goal-directed mode.
    pub goal: Option<GoalOutcome>,
    /// True when `velocity` is the one-shot stop sent on release.
    pub stop: bool,
}

impl StepOutput {
    fn idle(state: EnableState) -> Self {
        Self {
            state,
            velocity: None,
            gimbal: None,
            goal: None,
            stop: false,
        }
    }
}

/// Input-to-command engine for a single controller stream.
pub struct Teleop<T, N> {
    settings: TeleopSettings,
    transforms: T,
    navigator: N,
    gimbal: GimbalState,
    dispatch: DispatchState,
}

impl<T, N> std::fmt::Debug for Teleop<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Teleop")
            .field("mode", &self.settings.mode)
            .field("gimbal", &self.gimbal)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl<T, N> Teleop<T, N>
where
    T: TransformLookup,
    N: NavigationClient,
{
    #[must_use]
    pub fn new(settings: TeleopSettings, transforms: T, navigator: N) -> Self {
        Self {
            settings,
            transforms,
            navigator,
            gimbal: GimbalState::new(),
            dispatch: DispatchState::new(),
        }
    }

    /// Processes one sample received at monotonic time `now`.
    ///
    /// Never fails: short input reads as zero, lookup failures drop the goal.
    pub fn process(&mut self, sample: &InputSample, now: Instant) -> StepOutput {
        let state = self.settings.enable.classify(sample);
        match state.profile() {
            Some(profile) => self.drive(state, profile, sample, now),
            None => self.release(now),
        }
    }

    fn drive(
        &mut self,
        state: EnableState,
        profile: Profile,
        sample: &InputSample,
        now: Instant,
    ) -> StepOutput {
        let composer = &self.settings.composer;

        let (velocity, goal) = match self.settings.mode {
            ControlMode::Manual => (Some(composer.velocity(profile, sample)), None),
            ControlMode::GoalDirected => {
                let x = composer.chassis(profile, channels::X, sample);
                let y = composer.chassis(profile, channels::Y, sample);
                let outcome = self.settings.goals.dispatch(
                    x,
                    y,
                    now,
                    &mut self.dispatch,
                    &self.transforms,
                    &mut self.navigator,
                );
                (None, Some(outcome))
            }
        };

        let gimbal = composer.gimbal_command(&mut self.gimbal, profile, sample, now);
        self.dispatch.arm_stop();

        StepOutput {
            state,
            velocity,
            gimbal: Some(gimbal),
            goal,
            stop: false,
        }
    }

    fn release(&mut self, now: Instant) -> StepOutput {
        if !self.dispatch.take_stop() {
            return StepOutput::idle(EnableState::Disabled);
        }

        if self.settings.mode == ControlMode::GoalDirected {
            debug!("Cancelling outstanding navigation goals");
            self.navigator.cancel_goals_before(now);
        }
        info!("Input released, sending stop command");

        StepOutput {
            velocity: Some(VelocityCommand::zero()),
            stop: true,
            ..StepOutput::idle(EnableState::Disabled)
        }
    }

    /// Logs the effective button and axis bindings.
    pub fn log_bindings(&self) {
        let enable = &self.settings.enable;
        let composer = &self.settings.composer;

        info!("Teleop enable button {}.", enable.enable_button);
        info!("Turbo on button {}.", enable.turbo_button);
        if composer.inverted_reverse {
            info!("Teleop enable inverted reverse.");
        }
        info!("Control mode {}.", self.settings.mode.as_str());

        for (name, index) in composer.chassis_axes.mapped() {
            info!(
                "Linear axis {} on {} at scale {}.",
                name,
                index,
                composer.chassis_scales.normal.scale(name).unwrap_or(0.0)
            );
            if enable.turbo_enabled() {
                info!(
                    "Turbo for linear axis {} is scale {}.",
                    name,
                    composer.chassis_scales.turbo.scale(name).unwrap_or(0.0)
                );
            }
        }

        for (name, index) in composer.gimbal_axes.mapped() {
            info!(
                "Angular axis {} on {} at scale {}.",
                name,
                index,
                composer.gimbal_scales.normal.scale(name).unwrap_or(0.0)
            );
            if enable.turbo_enabled() {
                info!(
                    "Turbo for angular axis {} is scale {}.",
                    name,
                    composer.gimbal_scales.turbo.scale(name).unwrap_or(0.0)
                );
            }
        }
    }

    #[must_use]
    pub fn settings(&self) -> &TeleopSettings {
        &self.settings
    }

    #[must_use]
    pub fn gimbal_state(&self) -> &GimbalState {
        &self.gimbal
    }

    #[must_use]
    pub fn dispatch_state(&self) -> &DispatchState {
        &self.dispatch
    }
}
