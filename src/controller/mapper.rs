//! # Controller Input Mapper Module
//!
//! Turns raw evdev events into [`InputSample`] snapshots with the same
//! indexing and sign conventions as the Linux joystick interface.
//!
//! ## Indexing
//!
//! - Axes: every absolute axis the device supports, in ascending code order.
//! - Buttons: every key code at or above `BTN_MISC`, in ascending code order.
//!
//! On a typical Xbox-layout pad this gives `ABS_X, ABS_Y, ABS_Z, ABS_RX,
//! ABS_RY, ABS_RZ, ABS_HAT0X, ABS_HAT0Y` as axes 0-7 and `BTN_SOUTH` as
//! button 0.
//!
//! ## Axis Values
//!
//! Raw values are mapped onto `[-1.0, 1.0]` over the device-reported range
//! and negated, so stick up and stick left read positive. A released
//! trigger therefore reads `1.0`.
//!
//! ## Framing
//!
//! Events accumulate until `SYN_REPORT`, which yields one sample.

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key, Synchronization};

use crate::teleop::sample::InputSample;

/// First joystick/gamepad button code (`BTN_MISC`). Lower codes are keyboard keys.
const BTN_MISC: u16 = 0x100;

/// Raw value range of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Maps `value` onto `[-1.0, 1.0]`, negated. Degenerate ranges read 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::controller::mapper::AxisRange;
    ///
    /// let range = AxisRange::new(-32768, 32767);
    /// assert!((range.normalize(-32768) - 1.0).abs() < 1e-9);
    /// assert!((range.normalize(32767) + 1.0).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn normalize(&self, value: i32) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        let span = f64::from(self.max) - f64::from(self.min);
        let clamped = value.clamp(self.min, self.max);
        let unit = (f64::from(clamped) - f64::from(self.min)) / span;
        -(unit * 2.0 - 1.0)
    }
}

/// Axis and button index assignment for one device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoystickLayout {
    axes: Vec<(AbsoluteAxisType, AxisRange)>,
    buttons: Vec<Key>,
}

impl JoystickLayout {
    /// Builds a layout; codes are sorted and buttons below `BTN_MISC` dropped.
    #[must_use]
    pub fn new(
        mut axes: Vec<(AbsoluteAxisType, AxisRange)>,
        buttons: impl IntoIterator<Item = Key>,
    ) -> Self {
        axes.sort_by_key(|(axis, _)| axis.0);
        axes.dedup_by_key(|(axis, _)| axis.0);

        let mut buttons: Vec<Key> = buttons
            .into_iter()
            .filter(|key| key.code() >= BTN_MISC)
            .collect();
        buttons.sort_by_key(|key| key.code());
        buttons.dedup();

        Self { axes, buttons }
    }

    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    #[must_use]
    pub fn axis_index(&self, axis: AbsoluteAxisType) -> Option<usize> {
        self.axes.iter().position(|(a, _)| *a == axis)
    }

    #[must_use]
    pub fn button_index(&self, key: Key) -> Option<usize> {
        self.buttons.iter().position(|k| *k == key)
    }
}

/// Accumulates evdev events into controller samples.
///
/// Not thread-safe. Use from a single task/thread only.
#[derive(Debug)]
pub struct EventMapper {
    layout: JoystickLayout,
    axes: Vec<f64>,
    buttons: Vec<bool>,
}

impl EventMapper {
    /// Creates a mapper with every axis at 0.0 and every button released.
    #[must_use]
    pub fn new(layout: JoystickLayout) -> Self {
        let axes = vec![0.0; layout.axis_count()];
        let buttons = vec![false; layout.button_count()];
        Self {
            layout,
            axes,
            buttons,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &JoystickLayout {
        &self.layout
    }

    /// Current state as a sample.
    #[must_use]
    pub fn snapshot(&self) -> InputSample {
        InputSample::new(self.axes.clone(), self.buttons.clone())
    }

    /// Applies one event. Returns a sample when the event closes a report.
    ///
    /// # Examples
    ///
    /// ```
    /// use evdev::{AbsoluteAxisType, EventType, InputEvent, Key, Synchronization};
    /// use joy_teleop::controller::mapper::{AxisRange, EventMapper, JoystickLayout};
    ///
    /// let layout = JoystickLayout::new(
    ///     vec![(AbsoluteAxisType::ABS_X, AxisRange::new(0, 255))],
    ///     [Key::BTN_SOUTH],
    /// );
    /// let mut mapper = EventMapper::new(layout);
    ///
    /// assert!(mapper
    ///     .process_event(&InputEvent::new(EventType::KEY, Key::BTN_SOUTH.code(), 1))
    ///     .is_none());
    /// let sample = mapper
    ///     .process_event(&InputEvent::new(
    ///         EventType::SYNCHRONIZATION,
    ///         Synchronization::SYN_REPORT.0,
    ///         0,
    ///     ))
    ///     .unwrap();
    /// assert!(sample.buttons[0]);
    /// ```
    pub fn process_event(&mut self, event: &InputEvent) -> Option<InputSample> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                self.process_axis_event(axis, event.value());
                None
            }
            InputEventKind::Key(key) => {
                self.process_key_event(key, event.value() != 0);
                None
            }
            InputEventKind::Synchronization(Synchronization::SYN_REPORT) => Some(self.snapshot()),
            _ => None,
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let Some(index) = self.layout.axis_index(axis) else {
            return;
        };
        let (_, range) = self.layout.axes[index];
        self.axes[index] = range.normalize(value);
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        if let Some(index) = self.layout.button_index(key) {
            self.buttons[index] = pressed;
        }
    }
}
