//! Parser for the radio statistics dump printed by a simulated device.
//!
//! The device prints one statistic per line, e.g.
//!
//! ```text
//! Radio Statistics:
//! Total Time: 60.000s
//! Tx Time: 0.013s (0.02%)
//! Rx Time: 1.234s (2.05%)
//! Sleep Time: 58.753s (97.92%)
//! Disabled Time: 0.000s (0.00%)
//! ```
//!
//! Only the receive and sleep lines are used. This is the one place where the text format of the
//! simulated firmware is relied upon.

use csl_tunnel_core::prelude::StatsSample;

/// Label of the receiver-on time, the active time of a listener.
pub const ACTIVE_TIME_LABEL: &str = "Rx Time:";
/// Label of the time the radio spent asleep.
pub const SLEEP_TIME_LABEL: &str = "Sleep Time:";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("Radio statistics did not include a `{label}` line")]
    MissingField { label: &'static str },
    #[error("Radio statistic `{label}` has a malformed value: {line:?}")]
    MalformedNumber { label: &'static str, line: String },
}

/// Extract a [StatsSample] from the lines of a radio statistics dump.
///
/// Line order does not matter and unrelated lines are ignored. A value is read between the label
/// and the `s` unit suffix and converted to whole milliseconds by truncation. Either both values
/// are found and valid or an error is returned.
pub fn extract_stats<S: AsRef<str>>(lines: &[S]) -> Result<StatsSample, StatsError> {
    let mut active_time_ms = None;
    let mut sleep_time_ms = None;

    for line in lines {
        let line = line.as_ref();
        if let Some(value) = read_labelled_millis(line, ACTIVE_TIME_LABEL)? {
            active_time_ms = Some(value);
        }
        if let Some(value) = read_labelled_millis(line, SLEEP_TIME_LABEL)? {
            sleep_time_ms = Some(value);
        }
    }

    Ok(StatsSample {
        active_time_ms: active_time_ms.ok_or(StatsError::MissingField {
            label: ACTIVE_TIME_LABEL,
        })?,
        sleep_time_ms: sleep_time_ms.ok_or(StatsError::MissingField {
            label: SLEEP_TIME_LABEL,
        })?,
    })
}

/// `Ok(None)` if the line does not carry `label`.
fn read_labelled_millis(line: &str, label: &'static str) -> Result<Option<u64>, StatsError> {
    let Some(start) = line.find(label) else {
        return Ok(None);
    };

    let malformed = || StatsError::MalformedNumber {
        label,
        line: line.to_string(),
    };

    let value = &line[start + label.len()..];
    let (token, _) = value.split_once('s').ok_or_else(malformed)?;

    seconds_to_millis(token.trim())
        .map(Some)
        .ok_or_else(malformed)
}

/// Convert seconds to milliseconds, truncating anything below a millisecond.
///
/// The value goes through `f64` like the device's own tooling does, so `1.005` is 1004 ms.
fn seconds_to_millis(token: &str) -> Option<u64> {
    let seconds = token.parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let millis = (seconds * 1000.0).trunc();
    (millis < u64::MAX as f64).then_some(millis as u64)
}
