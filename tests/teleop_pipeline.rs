//! End-to-end tests: TOML config → teleop step → outbound JSON messages.

use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use joy_teleop::config::Config;
use joy_teleop::controller::stdin::parse_sample_line;
use joy_teleop::output::navigator::ChannelNavigator;
use joy_teleop::output::{OutboundReceiver, Outbound, Publisher, StampClock};
use joy_teleop::teleop::dispatch::GoalOutcome;
use joy_teleop::teleop::enable::EnableState;
use joy_teleop::teleop::sample::InputSample;
use joy_teleop::teleop::transform::StaticTransformTree;
use joy_teleop::teleop::Teleop;

const MANUAL_CONFIG: &str = r#"
[teleop]
enable_button = 0
enable_turbo_button = 1
inverted_reverse = true

[axis_chassis]
x = 0
y = 1

[axis_gimbal]
yaw = 2
pitch = 3

[scale_chassis]
x = 1.0
y = 1.0

[scale_chassis_turbo]
x = 2.0
y = 2.0

[scale_gimbal]
yaw = 1.0
pitch = 1.0

[scale_gimbal_turbo]
yaw = 1.0
pitch = 1.0
"#;

const GOAL_CONFIG: &str = r#"
[teleop]
enable_button = 0
control_mode = "auto_control"

[axis_chassis]
x = 0
y = 1

[scale_chassis]
x = 1.0
y = 1.0

[[transforms]]
parent = "map"
child = "base_link"
x = 10.0
y = -2.0
"#;

struct Harness {
    teleop: Teleop<StaticTransformTree, ChannelNavigator>,
    publisher: Publisher,
    rx: OutboundReceiver,
}

impl Harness {
    fn new(toml: &str) -> Self {
        let config = Config::from_toml_str(toml).expect("valid config");
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = StampClock::new();
        let teleop = Teleop::new(
            config.teleop_settings(),
            config.transform_tree(),
            ChannelNavigator::new(tx.clone(), clock),
        );
        let publisher = Publisher::new(
            tx,
            clock,
            config.teleop.robot_base_frame.clone(),
            config.teleop.publish_stamped_twist,
        );
        Self { teleop, publisher, rx }
    }

    /// Runs one sample and returns every message it produced.
    fn step(&mut self, sample: &InputSample, now: Instant) -> Vec<Outbound> {
        let out = self.teleop.process(sample, now);
        self.publisher.publish(&out, now).expect("writer alive");
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

fn sample(line: &str) -> InputSample {
    parse_sample_line(line).unwrap().unwrap()
}

fn topics(messages: &[Outbound]) -> Vec<&'static str> {
    messages.iter().map(Outbound::topic).collect()
}

#[test]
fn test_manual_enabled_publishes_velocity_then_gimbal() {
    let mut h = Harness::new(MANUAL_CONFIG);
    let messages = h.step(&sample(r#"{"axes": [0.5, 0.0, 0.3, 0.0], "buttons": [1, 0]}"#), Instant::now());

    assert_eq!(topics(&messages), vec!["cmd_vel", "cmd_gimbal_joint"]);
    match &messages[0] {
        Outbound::CmdVel { header, twist } => {
            assert!(header.is_none());
            assert_eq!(twist.linear.x, 0.5);
            assert_eq!(twist.angular.z, 0.3);
        }
        other => panic!("Expected cmd_vel, got: {:?}", other),
    }
}

#[test]
fn test_inverted_reverse_flips_yaw() {
    let mut h = Harness::new(MANUAL_CONFIG);
    let now = Instant::now();

    let reverse = h.step(&sample(r#"{"axes": [-0.5, 0.0, 0.3], "buttons": [1]}"#), now);
    let forward = h.step(&sample(r#"{"axes": [0.5, 0.0, 0.3], "buttons": [1]}"#), now);

    let yaw = |messages: &[Outbound]| match &messages[0] {
        Outbound::CmdVel { twist, .. } => twist.angular.z,
        other => panic!("Expected cmd_vel, got: {:?}", other),
    };
    assert_eq!(yaw(&reverse), -0.3);
    assert_eq!(yaw(&forward), 0.3);
}

#[test]
fn test_turbo_overrides_enable_and_uses_turbo_scale() {
    let mut h = Harness::new(MANUAL_CONFIG);
    let held = sample(r#"{"axes": [0.5], "buttons": [0, 1]}"#);

    let out = h.teleop.process(&held, Instant::now());
    assert_eq!(out.state, EnableState::Turbo);
    assert_eq!(out.velocity.unwrap().linear.x, 1.0);
}

#[test]
fn test_short_sample_reads_as_zero() {
    let mut h = Harness::new(MANUAL_CONFIG);
    let messages = h.step(&sample(r#"{"axes": [], "buttons": [1]}"#), Instant::now());

    match &messages[0] {
        Outbound::CmdVel { twist, .. } => assert!(twist.linear.x == 0.0 && twist.angular.z == 0.0),
        other => panic!("Expected cmd_vel, got: {:?}", other),
    }
}

#[test]
fn test_release_publishes_single_stop() {
    let mut h = Harness::new(MANUAL_CONFIG);
    let t0 = Instant::now();
    let released = sample(r#"{"axes": [0.9, 0.9, 0.9], "buttons": [0, 0]}"#);

    h.step(&sample(r#"{"axes": [0.9], "buttons": [1]}"#), t0);
    let stop = h.step(&released, t0 + Duration::from_millis(10));

    assert_eq!(topics(&stop), vec!["cmd_vel"]);
    match &stop[0] {
        Outbound::CmdVel { twist, .. } => assert!(twist.is_zero()),
        other => panic!("Expected stop, got: {:?}", other),
    }

    for i in 0..10 {
        let quiet = h.step(&released, t0 + Duration::from_millis(20 + i));
        assert!(quiet.is_empty());
    }
}

#[test]
fn test_gimbal_yaw_accumulates_over_steps() {
    let mut h = Harness::new(MANUAL_CONFIG);
    let t0 = Instant::now();
    let slewing = sample(r#"{"axes": [0.0, 0.0, 0.4, 0.0], "buttons": [1]}"#);

    h.step(&slewing, t0);
    h.step(&slewing, t0 + Duration::from_millis(500));
    let messages = h.step(&slewing, t0 + Duration::from_millis(1250));

    match &messages[1] {
        Outbound::CmdGimbalJoint { position, .. } => {
            assert!((position[1] - 0.4 * 1.25).abs() < 1e-9);
            assert_eq!(position[0], 0.0);
        }
        other => panic!("Expected gimbal, got: {:?}", other),
    }
}

#[test]
fn test_goal_mode_places_goal_in_global_frame() {
    let mut h = Harness::new(GOAL_CONFIG);
    let messages = h.step(&sample(r#"{"axes": [1.0, 0.5], "buttons": [1]}"#), Instant::now());

    assert_eq!(topics(&messages), vec!["navigate_to_pose", "cmd_gimbal_joint"]);
    match &messages[0] {
        Outbound::NavigateToPose { goal_id, header, pose } => {
            assert_eq!(*goal_id, 1);
            assert_eq!(header.frame_id, "map");
            assert!((pose.position.x - 11.0).abs() < 1e-9);
            assert!((pose.position.y - (-1.5)).abs() < 1e-9);
        }
        other => panic!("Expected goal, got: {:?}", other),
    }
}

#[test]
fn test_goal_throttle_by_interval() {
    let displaced = sample(r#"{"axes": [1.0, 1.0], "buttons": [1]}"#);
    let t0 = Instant::now();

    let mut close = Harness::new(GOAL_CONFIG);
    close.teleop.process(&displaced, t0);
    let out = close.teleop.process(&displaced, t0 + Duration::from_millis(100));
    assert_eq!(out.goal, Some(GoalOutcome::Throttled));

    let mut apart = Harness::new(GOAL_CONFIG);
    apart.teleop.process(&displaced, t0);
    let out = apart.teleop.process(&displaced, t0 + Duration::from_millis(300));
    assert!(matches!(out.goal, Some(GoalOutcome::Submitted(_))));
}

#[test]
fn test_goal_deadzone_sends_nothing() {
    let mut h = Harness::new(GOAL_CONFIG);
    let messages = h.step(&sample(r#"{"axes": [0.05, 0.05], "buttons": [1]}"#), Instant::now());
    assert_eq!(topics(&messages), vec!["cmd_gimbal_joint"]);
}

#[test]
fn test_goal_mode_missing_transform_drops_goal() {
    let toml = GOAL_CONFIG.replace("child = \"base_link\"", "child = \"odom\"");
    let mut h = Harness::new(&toml);

    let out = h.teleop.process(&sample(r#"{"axes": [1.0, 1.0], "buttons": [1]}"#), Instant::now());
    assert_eq!(out.goal, Some(GoalOutcome::TransformFailed));
}

#[test]
fn test_goal_mode_release_cancels_then_stops() {
    let mut h = Harness::new(GOAL_CONFIG);
    let t0 = Instant::now();

    h.step(&sample(r#"{"axes": [1.0, 1.0], "buttons": [1]}"#), t0);
    let released = h.step(&sample(r#"{"axes": [1.0, 1.0], "buttons": [0]}"#), t0 + Duration::from_millis(40));

    assert_eq!(topics(&released), vec!["cancel_goals_before", "cmd_vel"]);
}
