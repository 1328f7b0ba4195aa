//! # Teleop Module
//!
//! The input-to-command engine.
//!
//! This module handles:
//! - Resolving logical channels to scaled axis values
//! - Classifying samples as disabled, normal or turbo
//! - Composing velocity and gimbal joint commands
//! - Routing to direct velocity output or throttled navigation goals
//! - Sending a single stop command when input is released

pub mod command;
pub mod dispatch;
pub mod enable;
pub mod geometry;
pub mod gimbal;
pub mod mapping;
pub mod router;
pub mod sample;
pub mod transform;

pub use router::{StepOutput, Teleop, TeleopSettings};
