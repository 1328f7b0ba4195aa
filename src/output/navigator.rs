//! Navigation client that publishes goals and cancellations as outbound
//! messages. Nothing is awaited; a downstream executor owns the goals.

use std::time::Instant;
use tracing::warn;

use super::{Header, Outbound, OutboundSender, StampClock};
use crate::teleop::dispatch::{Goal, GoalHandle, NavigationClient};

/// [`NavigationClient`] backed by the outbound channel.
///
/// Goal ids start at 1 and increase by one per submission.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: OutboundSender,
    clock: StampClock,
    next_id: u64,
}

impl ChannelNavigator {
    #[must_use]
    pub fn new(tx: OutboundSender, clock: StampClock) -> Self {
        Self {
            tx,
            clock,
            next_id: 1,
        }
    }

    fn push(&self, message: Outbound) {
        let topic = message.topic();
        if self.tx.send(message).is_err() {
            warn!("Output closed, dropping {} message", topic);
        }
    }
}

impl NavigationClient for ChannelNavigator {
    fn send_goal(&mut self, goal: Goal) -> GoalHandle {
        let handle = GoalHandle(self.next_id);
        self.next_id += 1;

        self.push(Outbound::NavigateToPose {
            goal_id: handle.0,
            header: Header {
                stamp: self.clock.stamp(goal.stamp),
                frame_id: goal.frame_id,
            },
            pose: goal.pose,
        });
        handle
    }

    fn cancel_goals_before(&mut self, before: Instant) {
        self.push(Outbound::CancelGoalsBefore {
            stamp: self.clock.stamp(before),
        });
    }
}
