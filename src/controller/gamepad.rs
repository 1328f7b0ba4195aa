//! # Gamepad Module
//!
//! Detects, opens and reads a Linux gamepad through evdev.
//!
//! ## Detection
//!
//! A device counts as a gamepad when it reports:
//! - the `ABS_X` absolute axis, and
//! - either `BTN_SOUTH` (gamepads) or `BTN_TRIGGER` (joysticks).
//!
//! Devices are scanned in path order, so the first matching
//! `/dev/input/eventN` wins when several are connected.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::mapper::{AxisRange, EventMapper, JoystickLayout};
use crate::error::{Result, TeleopError};
use crate::teleop::sample::InputSample;

/// Directory scanned during auto-detection
const INPUT_DIR: &str = "/dev/input";

/// Gamepad handle
///
/// Represents an open evdev device together with its axis/button layout.
pub struct Gamepad {
    device: Device,
    device_path: String,
    layout: JoystickLayout,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Whether `device` looks like a gamepad or joystick.
fn is_gamepad(device: &Device) -> bool {
    let has_stick = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));
    let has_buttons = device.supported_keys().map_or(false, |keys| {
        keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER)
    });
    has_stick && has_buttons
}

impl Gamepad {
    /// Open the gamepad at `device_path`, or auto-detect when it is empty.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: auto-detection found no gamepad
    /// - `Controller`: the given device could not be opened or is not a gamepad
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joy_teleop::controller::gamepad::Gamepad;
    ///
    /// let pad = Gamepad::open("")?;
    /// println!("Connected to gamepad at: {}", pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(device_path: &str) -> Result<Self> {
        if device_path.is_empty() {
            Self::detect()
        } else {
            Self::open_path(Path::new(device_path))
        }
    }

    /// Open a specific event device.
    pub fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| {
            TeleopError::Controller(format!("Failed to open {}: {}", path.display(), e))
        })?;

        if !is_gamepad(&device) {
            return Err(TeleopError::Controller(format!(
                "{} does not look like a gamepad",
                path.display()
            )));
        }

        Self::from_device(device, path.to_string_lossy().to_string())
    }

    /// Scan `/dev/input` for the first gamepad.
    fn detect() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(TeleopError::Controller(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TeleopError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TeleopError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic selection when several pads are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found gamepad at: {}", device_path);
                        return Self::from_device(device, device_path);
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TeleopError::ControllerNotFound)
    }

    fn from_device(device: Device, device_path: String) -> Result<Self> {
        let abs_state = device.get_abs_state().map_err(|e| {
            TeleopError::Controller(format!("Failed to read axis ranges: {}", e))
        })?;

        let axes: Vec<(AbsoluteAxisType, AxisRange)> = device
            .supported_absolute_axes()
            .map(|axes| {
                axes.iter()
                    .filter_map(|axis| {
                        abs_state
                            .get(usize::from(axis.0))
                            .map(|info| (axis, AxisRange::new(info.minimum, info.maximum)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let buttons: Vec<Key> = device
            .supported_keys()
            .map(|keys| keys.iter().collect())
            .unwrap_or_default();

        let layout = JoystickLayout::new(axes, buttons);
        info!(
            "Gamepad layout: {} axes, {} buttons",
            layout.axis_count(),
            layout.button_count()
        );

        Ok(Self {
            device,
            device_path,
            layout,
        })
    }

    /// Get the device path of this gamepad
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get the human-readable device name
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    #[must_use]
    pub fn layout(&self) -> &JoystickLayout {
        &self.layout
    }

    /// Fetch pending events and return every completed sample.
    ///
    /// Blocks until the device has events.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if fetching fails (e.g. gamepad unplugged).
    pub fn fetch_samples(&mut self, mapper: &mut EventMapper) -> Result<Vec<InputSample>> {
        let events = self
            .device
            .fetch_events()
            .map_err(|e| TeleopError::Controller(format!("Failed to fetch events: {}", e)))?;

        Ok(events.filter_map(|event| mapper.process_event(&event)).collect())
    }

    /// Read samples until the device fails or the receiver goes away.
    ///
    /// Blocking; run on a dedicated thread (`tokio::task::spawn_blocking`).
    pub fn run(mut self, tx: mpsc::Sender<InputSample>) -> Result<()> {
        let mut mapper = EventMapper::new(self.layout.clone());

        loop {
            for sample in self.fetch_samples(&mut mapper)? {
                if tx.blocking_send(sample).is_err() {
                    warn!("Sample receiver closed, stopping gamepad reader");
                    return Ok(());
                }
            }
        }
    }
}
