//! # Joy Teleop Library
//!
//! Drive a robot and its camera gimbal from a gamepad.
//!
//! This library turns controller samples into chassis velocity commands or
//! navigation goals, plus gimbal joint targets integrated from stick rates.

pub mod config;
pub mod controller;
pub mod error;
pub mod output;
pub mod teleop;
