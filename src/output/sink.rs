//! # Command Sinks
//!
//! Byte destinations for encoded outbound messages.
//!
//! - [`StdoutSink`]: standard output, for piping into another process
//! - [`SerialSink`]: a serial device opened 8N1 without flow control

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio_serial::SerialPortBuilderExt;
use tracing::info;

use crate::error::{Result, TeleopError};

/// Async byte sink
#[async_trait]
pub trait CommandSink: Send {
    /// Write all data to the sink
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush buffered output
    async fn flush(&mut self) -> io::Result<()>;
}

/// Writes to the process's standard output.
pub struct StdoutSink {
    out: tokio::io::Stdout,
}

impl std::fmt::Debug for StdoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutSink").finish()
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutSink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }
}

#[async_trait]
impl CommandSink for StdoutSink {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.out.flush().await
    }
}

/// Serial output handle
pub struct SerialSink {
    port: tokio_serial::SerialStream,
    device_path: String,
}

impl std::fmt::Debug for SerialSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSink")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialSink {
    /// Open `path` at `baud_rate`, 8 data bits, no parity, 1 stop bit.
    ///
    /// # Errors
    ///
    /// - `SerialPortNotFound`: the device node does not exist
    /// - `Serial`: the device exists but could not be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joy_teleop::output::sink::SerialSink;
    ///
    /// let sink = SerialSink::open("/dev/ttyACM0", 115_200)?;
    /// println!("Writing commands to: {}", sink.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        if !std::path::Path::new(path).exists() {
            return Err(TeleopError::SerialPortNotFound(path.to_string()));
        }

        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TeleopError::Serial(format!("Failed to open {}: {}", path, e)))?;

        info!("Opened serial output {} at {} baud", path, baud_rate);
        Ok(Self {
            port,
            device_path: path.to_string(),
        })
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl CommandSink for SerialSink {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.port.flush().await
    }
}
