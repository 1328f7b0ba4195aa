//! # Joy Teleop
//!
//! Drive a robot and its camera gimbal from a gamepad.
//!
//! Reads controller samples (evdev gamepad or JSON lines on stdin), runs each
//! through the teleop step and writes the resulting commands as JSON lines to
//! stdout or a serial port.
//!
//! ```bash
//! joy-teleop                      # uses config/default.toml
//! joy-teleop my_robot.toml
//! RUST_LOG=debug joy-teleop       # overrides [logging] level
//! ```
//!
//! Logs always go to stderr so stdout stays a clean command stream.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use joy_teleop::config::{Config, InputConfig, InputSource, LoggingConfig, OutputConfig, OutputSink};
use joy_teleop::controller::gamepad::Gamepad;
use joy_teleop::controller::stdin::read_samples;
use joy_teleop::output::navigator::ChannelNavigator;
use joy_teleop::output::sink::{CommandSink, SerialSink, StdoutSink};
use joy_teleop::output::{run_writer, Publisher, StampClock};
use joy_teleop::teleop::sample::InputSample;
use joy_teleop::teleop::Teleop;

/// Config file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Samples buffered between the input reader and the processing loop
const SAMPLE_QUEUE_DEPTH: usize = 64;

/// How long shutdown waits for input readers blocked in a read
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Log file name prefix inside `[logging] log_dir`
const LOG_FILE_PREFIX: &str = "joy-teleop.log";

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(run());

    // Gamepad and stdin readers sit in blocking reads and cannot be cancelled
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Application body
///
/// 1. Load configuration and initialize logging
/// 2. Build the teleop core and log its bindings
/// 3. Start the output writer and the input reader
/// 4. Process samples until input ends or Ctrl+C
/// 5. Drain the writer and exit
async fn run() -> Result<()> {
    let config_path = config_path(std::env::args().skip(1));
    let (config, config_found) = load_config(&config_path)?;
    let _log_guard = init_logging(&config.logging)?;

    info!("Joy Teleop v{} starting...", env!("CARGO_PKG_VERSION"));
    if config_found {
        info!("Loaded configuration from {}", config_path.display());
    } else {
        warn!(
            "Config file {} not found, using defaults",
            config_path.display()
        );
    }

    // Output
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let mut sink = open_sink(&config.output)?;
    let writer = tokio::spawn(async move { run_writer(out_rx, sink.as_mut()).await });

    // Core
    let clock = StampClock::new();
    let transforms = config.transform_tree();
    info!("Loaded {} static transforms", transforms.len());
    let navigator = ChannelNavigator::new(out_tx.clone(), clock);
    let mut teleop = Teleop::new(config.teleop_settings(), transforms, navigator);
    teleop.log_bindings();
    let publisher = Publisher::new(
        out_tx,
        clock,
        teleop.settings().goals.robot_base_frame.clone(),
        config.teleop.publish_stamped_twist,
    );

    // Input
    let (sample_tx, mut sample_rx) = mpsc::channel::<InputSample>(SAMPLE_QUEUE_DEPTH);
    let input = spawn_input(&config.input, sample_tx)?;

    info!("Press Ctrl+C to exit");
    let mut processed: u64 = 0;

    loop {
        tokio::select! {
            received = sample_rx.recv() => {
                let Some(sample) = received else {
                    info!("Input stream ended");
                    break;
                };

                let now = Instant::now();
                let step = teleop.process(&sample, now);
                processed += 1;

                if let Err(e) = publisher.publish(&step, now) {
                    error!("Failed to publish commands: {}", e);
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!("Total samples processed: {}", processed);

    let input_result = if input.is_finished() {
        input.await.context("Input task panicked")?
    } else {
        Ok(())
    };

    // Dropping every sender lets the writer drain and finish
    drop(publisher);
    drop(teleop);
    let written = writer.await.context("Output writer panicked")?;
    info!("Total messages written: {}", written);

    input_result.context("Input source failed")
}

/// First command-line argument, or the default config path
fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.next()
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load `path`, falling back to defaults when it does not exist.
///
/// Returns the config and whether the file was found. Logging is not up yet,
/// so the caller reports the fallback.
fn load_config(path: &Path) -> Result<(Config, bool)> {
    if !path.exists() {
        return Ok((Config::default(), false));
    }

    let config = Config::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok((config, true))
}

/// Set up stderr logging plus an optional daily rolling file
///
/// `RUST_LOG` overrides the configured level. The returned guard must be held
/// until exit so buffered file output is flushed.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log filter")?;
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    if logging.log_dir.is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&logging.log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(Some(guard))
}

fn open_sink(output: &OutputConfig) -> Result<Box<dyn CommandSink>> {
    match output.sink {
        OutputSink::Stdout => {
            info!("Writing commands to stdout");
            Ok(Box::new(StdoutSink::new()))
        }
        OutputSink::Serial => {
            let sink = SerialSink::open(&output.serial_port, output.baud_rate)?;
            info!("Writing commands to serial port {}", sink.device_path());
            Ok(Box::new(sink))
        }
    }
}

/// Start the configured input reader feeding `tx`
///
/// The gamepad is opened here so a missing device fails startup.
fn spawn_input(
    input: &InputConfig,
    tx: mpsc::Sender<InputSample>,
) -> Result<JoinHandle<joy_teleop::error::Result<()>>> {
    match input.source {
        InputSource::Evdev => {
            let gamepad = Gamepad::open(&input.device_path)?;
            info!(
                "Reading gamepad {} ({})",
                gamepad.device_path(),
                gamepad.name().unwrap_or("unnamed")
            );
            Ok(tokio::task::spawn_blocking(move || gamepad.run(tx)))
        }
        InputSource::Stdin => {
            info!("Reading JSON samples from stdin");
            Ok(tokio::spawn(async move {
                let forwarded = read_samples(BufReader::new(tokio::io::stdin()), tx).await?;
                info!("Read {} samples from stdin", forwarded);
                Ok(())
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_path_default() {
        assert_eq!(
            config_path(std::iter::empty()),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
    }

    #[test]
    fn test_config_path_from_args() {
        let args = vec!["robot.toml".to_string(), "ignored".to_string()];
        assert_eq!(config_path(args.into_iter()), PathBuf::from("robot.toml"));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let (config, found) = load_config(Path::new("/nonexistent/joy-teleop.toml")).unwrap();
        assert!(!found);
        assert_eq!(config.teleop.enable_button, Config::default().teleop.enable_button);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[teleop]\nenable_button = 3").unwrap();

        let (config, found) = load_config(file.path()).unwrap();
        assert!(found);
        assert_eq!(config.teleop.enable_button, 3);
    }

    #[test]
    fn test_load_config_invalid_file_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[teleop]\nenable_button = \"five\"").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_stdout_sink_opens() {
        let output = OutputConfig {
            sink: OutputSink::Stdout,
            serial_port: String::new(),
            baud_rate: 115_200,
        };
        assert!(open_sink(&output).is_ok());
    }
}
