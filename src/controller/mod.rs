//! # Controller Module
//!
//! Controller input handling.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Turning evdev events into indexed axis/button samples
//! - Reading samples as JSON lines from standard input

pub mod gamepad;
pub mod mapper;
pub mod stdin;
