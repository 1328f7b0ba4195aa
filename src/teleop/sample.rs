//! # Input Samples
//!
//! A single snapshot of every axis and button on the controller, as delivered
//! by an input source. Axes are open-range floats; buttons are booleans.

use serde::{Deserialize, Deserializer};

/// One discrete controller reading.
///
/// Indices follow the order of the source device. Reading past the end of
/// either sequence is not an error: axes read as absent and buttons read as
/// released.
///
/// # Examples
///
/// ```
/// use joy_teleop::teleop::sample::InputSample;
///
/// let sample = InputSample::new(vec![0.0, 0.5], vec![false, true]);
/// assert_eq!(sample.axis(1), Some(0.5));
/// assert_eq!(sample.axis(7), None);
/// assert!(sample.button(1));
/// assert!(!sample.button(9));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InputSample {
    /// Analog axis values.
    #[serde(default)]
    pub axes: Vec<f64>,
    /// Digital button states.
    #[serde(default, deserialize_with = "deserialize_buttons")]
    pub buttons: Vec<bool>,
}

impl InputSample {
    #[must_use]
    pub fn new(axes: Vec<f64>, buttons: Vec<bool>) -> Self {
        Self { axes, buttons }
    }

    /// Returns the axis value at `index`, if the sample carries that many axes.
    #[must_use]
    pub fn axis(&self, index: usize) -> Option<f64> {
        self.axes.get(index).copied()
    }

    /// Returns whether the button at `index` is pressed.
    ///
    /// Negative or out-of-range indices read as released.
    #[must_use]
    pub fn button(&self, index: i64) -> bool {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.buttons.get(i).copied())
            .unwrap_or(false)
    }
}

/// Accepts `true`/`false` as well as the integer convention (`0` = released).
fn deserialize_buttons<'de, D>(deserializer: D) -> std::result::Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ButtonValue {
        Bool(bool),
        Int(i64),
    }

    let raw = Vec::<ButtonValue>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|b| match b {
            ButtonValue::Bool(pressed) => pressed,
            ButtonValue::Int(value) => value != 0,
        })
        .collect())
}
