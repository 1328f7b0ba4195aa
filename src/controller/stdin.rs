//! # JSON Lines Input
//!
//! Reads samples as one JSON object per line, e.g.
//!
//! ```text
//! {"axes": [0.0, 0.0, 0.3, 0.0, 0.0, 0.8], "buttons": [0, 0, 0, 0, 0, 1]}
//! ```
//!
//! Blank lines are skipped. Lines that fail to parse are logged and dropped;
//! they never stop the stream.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::teleop::sample::InputSample;

/// Parses one line. Returns `Ok(None)` for blank lines.
///
/// # Examples
///
/// ```
/// use joy_teleop::controller::stdin::parse_sample_line;
///
/// let sample = parse_sample_line(r#"{"axes": [0.5], "buttons": [1]}"#)?.unwrap();
/// assert!(sample.button(0));
/// assert!(parse_sample_line("   ")?.is_none());
/// # Ok::<(), joy_teleop::error::TeleopError>(())
/// ```
pub fn parse_sample_line(line: &str) -> Result<Option<InputSample>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

/// Forwards samples from `reader` to `tx` until EOF or the receiver closes.
///
/// Returns the number of samples forwarded.
pub async fn read_samples<R>(reader: R, tx: mpsc::Sender<InputSample>) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded: u64 = 0;
    let mut line_no: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let sample = match parse_sample_line(&line) {
            Ok(Some(sample)) => sample,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping malformed sample on line {}: {}", line_no, e);
                continue;
            }
        };

        if tx.send(sample).await.is_err() {
            debug!("Sample receiver closed after {} samples", forwarded);
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}
