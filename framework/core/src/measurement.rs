use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One point of the accuracy/uncertainty sweep.
///
/// Both values are handed to the timing source as device commands, which accept a single byte
/// each. The pair `(0, 0)` is the ideal reference configuration: no clock drift and no timing
/// slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SweepParameter {
    /// Clock accuracy of the timing source, in parts-per-million.
    pub accuracy: u8,
    /// Timing uncertainty of the timing source, in units of 10 microseconds.
    pub uncertainty: u8,
}

impl SweepParameter {
    /// The zero-drift, zero-slack baseline.
    pub const IDEAL: Self = Self {
        accuracy: 0,
        uncertainty: 0,
    };

    pub fn new(accuracy: u8, uncertainty: u8) -> Self {
        Self {
            accuracy,
            uncertainty,
        }
    }

    pub fn is_ideal(&self) -> bool {
        *self == Self::IDEAL
    }
}

impl Display for SweepParameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(accuracy={} ppm, uncertainty={} x 10us)",
            self.accuracy, self.uncertainty
        )
    }
}

/// Radio usage of a single device over one observation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSample {
    /// Time spent with the receiver on, in whole milliseconds.
    pub active_time_ms: u64,
    /// Time spent with the radio asleep, in whole milliseconds.
    pub sleep_time_ms: u64,
}

impl StatsSample {
    pub fn new(active_time_ms: u64, sleep_time_ms: u64) -> Self {
        Self {
            active_time_ms,
            sleep_time_ms,
        }
    }

    /// The part of the window accounted for by the two counters.
    pub fn covered_ms(&self) -> u64 {
        self.active_time_ms.saturating_add(self.sleep_time_ms)
    }

    /// Check whether the counters account for `window_ms` give or take `tolerance_ms`.
    pub fn covers_window(&self, window_ms: u64, tolerance_ms: u64) -> bool {
        self.covered_ms().abs_diff(window_ms) <= tolerance_ms
    }
}

/// A line of the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub accuracy: u8,
    pub uncertainty: u8,
    pub sleep_time_ms: u64,
    pub active_time_ms: u64,
    /// Extra active time relative to the ideal baseline.
    ///
    /// Signed because a real device may land a few milliseconds under the baseline.
    pub active_delta_ms: i64,
}

impl ResultRow {
    /// The row for the baseline itself. Its delta is zero by definition.
    pub fn baseline(parameter: SweepParameter, sample: StatsSample) -> Self {
        Self::with_delta(parameter, sample, 0)
    }

    /// A row measured against the baseline active time.
    pub fn relative_to(
        parameter: SweepParameter,
        sample: StatsSample,
        ideal_active_time_ms: u64,
    ) -> Self {
        let delta = i128::from(sample.active_time_ms) - i128::from(ideal_active_time_ms);
        // Saturates.
        let delta = i64::try_from(delta).unwrap_or(if delta > 0 { i64::MAX } else { i64::MIN });
        Self::with_delta(parameter, sample, delta)
    }

    fn with_delta(parameter: SweepParameter, sample: StatsSample, active_delta_ms: i64) -> Self {
        Self {
            accuracy: parameter.accuracy,
            uncertainty: parameter.uncertainty,
            sleep_time_ms: sample.sleep_time_ms,
            active_time_ms: sample.active_time_ms,
            active_delta_ms,
        }
    }

    pub fn parameter(&self) -> SweepParameter {
        SweepParameter::new(self.accuracy, self.uncertainty)
    }
}

/// The ordered rows of a sweep. The baseline row is always first because the table can only be
/// created from it; the remaining rows keep the order they were pushed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(baseline: ResultRow) -> Self {
        Self {
            rows: vec![baseline],
        }
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn baseline(&self) -> &ResultRow {
        &self.rows[0]
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Never true, the baseline row is always present.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter()
    }
}
