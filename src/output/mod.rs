//! # Output Module
//!
//! Everything the teleop step produces leaves the process as JSON lines,
//! one message per line, tagged by topic:
//!
//! | Topic                 | Payload                                        |
//! |-----------------------|------------------------------------------------|
//! | `cmd_vel`             | twist, plus header when stamped output is on   |
//! | `cmd_gimbal_joint`    | header, joint names, joint positions           |
//! | `navigate_to_pose`    | goal id, header (global frame), pose           |
//! | `cancel_goals_before` | stamp                                          |
//!
//! Producers push onto an unbounded channel; a single writer task drains it
//! into a [`sink::CommandSink`].

pub mod navigator;
pub mod sink;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::{Result, TeleopError};
use crate::teleop::command::VelocityCommand;
use crate::teleop::geometry::Pose;
use crate::teleop::StepOutput;
use sink::CommandSink;

/// Sending half of the outbound channel.
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Receiving half of the outbound channel.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Message header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub stamp: DateTime<Utc>,
    pub frame_id: String,
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum Outbound {
    CmdVel {
        #[serde(skip_serializing_if = "Option::is_none")]
        header: Option<Header>,
        twist: VelocityCommand,
    },
    CmdGimbalJoint {
        header: Header,
        name: [&'static str; 2],
        position: [f64; 2],
    },
    NavigateToPose {
        goal_id: u64,
        header: Header,
        pose: Pose,
    },
    CancelGoalsBefore {
        stamp: DateTime<Utc>,
    },
}

impl Outbound {
    /// Encodes the message as a single newline-terminated JSON line.
    pub fn encode_line(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Outbound::CmdVel { .. } => "cmd_vel",
            Outbound::CmdGimbalJoint { .. } => "cmd_gimbal_joint",
            Outbound::NavigateToPose { .. } => "navigate_to_pose",
            Outbound::CancelGoalsBefore { .. } => "cancel_goals_before",
        }
    }
}

/// Converts monotonic instants into wall-clock stamps.
///
/// Anchored once at construction; later instants are offset from the anchor.
#[derive(Debug, Clone, Copy)]
pub struct StampClock {
    anchor: Instant,
    anchor_wall: DateTime<Utc>,
}

impl Default for StampClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StampClock {
    #[must_use]
    pub fn new() -> Self {
        Self::anchored(Instant::now(), Utc::now())
    }

    #[must_use]
    pub fn anchored(anchor: Instant, anchor_wall: DateTime<Utc>) -> Self {
        Self {
            anchor,
            anchor_wall,
        }
    }

    #[must_use]
    pub fn stamp(&self, at: Instant) -> DateTime<Utc> {
        let offset = |d| chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero());
        match at.checked_duration_since(self.anchor) {
            Some(ahead) => self.anchor_wall + offset(ahead),
            None => self.anchor_wall - offset(self.anchor.saturating_duration_since(at)),
        }
    }
}

/// Turns step results into outbound messages.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: OutboundSender,
    clock: StampClock,
    robot_base_frame: String,
    stamped_twist: bool,
}

impl Publisher {
    #[must_use]
    pub fn new(
        tx: OutboundSender,
        clock: StampClock,
        robot_base_frame: impl Into<String>,
        stamped_twist: bool,
    ) -> Self {
        Self {
            tx,
            clock,
            robot_base_frame: robot_base_frame.into(),
            stamped_twist,
        }
    }

    /// Messages for one step, in publish order (velocity first, then gimbal).
    #[must_use]
    pub fn messages(&self, step: &StepOutput, now: Instant) -> Vec<Outbound> {
        let stamp = self.clock.stamp(now);
        let mut out = Vec::with_capacity(2);

        if let Some(twist) = step.velocity {
            let header = self.stamped_twist.then(|| Header {
                stamp,
                frame_id: self.robot_base_frame.clone(),
            });
            out.push(Outbound::CmdVel { header, twist });
        }

        if let Some(gimbal) = &step.gimbal {
            out.push(Outbound::CmdGimbalJoint {
                header: Header {
                    stamp,
                    frame_id: String::new(),
                },
                name: gimbal.name,
                position: gimbal.position,
            });
        }

        out
    }

    /// Queues every message for `step`.
    ///
    /// # Errors
    ///
    /// Returns `OutputClosed` if the writer task has exited.
    pub fn publish(&self, step: &StepOutput, now: Instant) -> Result<usize> {
        let messages = self.messages(step, now);
        let count = messages.len();
        for message in messages {
            self.tx.send(message).map_err(|_| TeleopError::OutputClosed)?;
        }
        Ok(count)
    }
}

/// Drains `rx` into `sink` until every sender is dropped.
///
/// Write failures are logged and the message is dropped. Returns the number
/// of messages written.
pub async fn run_writer<S>(mut rx: OutboundReceiver, sink: &mut S) -> u64
where
    S: CommandSink + ?Sized,
{
    let mut written: u64 = 0;

    while let Some(message) = rx.recv().await {
        let line = match message.encode_line() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode {} message: {}", message.topic(), e);
                continue;
            }
        };

        if let Err(e) = sink.write_all(&line).await {
            error!("Failed to write {} message: {}", message.topic(), e);
            continue;
        }
        if let Err(e) = sink.flush().await {
            error!("Failed to flush output: {}", e);
            continue;
        }
        written += 1;
    }

    debug!("Output writer finished after {} messages", written);
    written
}
