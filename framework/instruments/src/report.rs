use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use csl_tunnel_core::prelude::{ResultRow, ResultTable};
use serde::{Deserialize, Serialize};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Column headers of the report, in order.
pub const REPORT_HEADERS: [&str; 5] = [
    "Accuracy (ppm)",
    "Uncertainty (10 µs)",
    "Sleep (ms)",
    "Active (ms)",
    "Active increase (ms)",
];

#[derive(Tabled, Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    #[tabled(rename = "Accuracy (ppm)")]
    pub accuracy: u8,
    #[tabled(rename = "Uncertainty (10 µs)")]
    pub uncertainty: u8,
    #[tabled(rename = "Sleep (ms)")]
    pub sleep_time_ms: u64,
    #[tabled(rename = "Active (ms)")]
    pub active_time_ms: u64,
    #[tabled(rename = "Active increase (ms)")]
    pub active_delta_ms: i64,
}

impl From<&ResultRow> for ReportRow {
    fn from(row: &ResultRow) -> Self {
        Self {
            accuracy: row.accuracy,
            uncertainty: row.uncertainty,
            sleep_time_ms: row.sleep_time_ms,
            active_time_ms: row.active_time_ms,
            active_delta_ms: row.active_delta_ms,
        }
    }
}

/// The JSON form of a finished sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub sweep_name: String,
    pub radio_model: String,
    /// RFC 3339 timestamp of when the report was assembled.
    pub generated_at: String,
    pub rows: Vec<ResultRow>,
}

/// Lays out a [ResultTable] for display. Rows are kept in table order, baseline first.
pub struct ReportAssembler<'a> {
    table: &'a ResultTable,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(table: &'a ResultTable) -> Self {
        Self { table }
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.table.iter().map(ReportRow::from).collect()
    }

    /// Render as a markdown table.
    pub fn render(&self) -> String {
        let mut table = Table::new(self.rows());
        table.with(Style::markdown());
        table.to_string()
    }

    pub fn print(&self, sweep_name: &str) {
        println!("\nRadio usage of {sweep_name}");
        println!("{}", self.render());
    }

    pub fn to_report(&self, sweep_name: &str, radio_model: &str) -> SweepReport {
        SweepReport {
            sweep_name: sweep_name.to_string(),
            radio_model: radio_model.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            rows: self.table.rows().to_vec(),
        }
    }

    /// Write the report as pretty printed JSON, replacing any existing file.
    pub fn write_json(
        &self,
        path: impl AsRef<Path>,
        sweep_name: &str,
        radio_model: &str,
    ) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file '{}'", path.display()))?;

        self.write_json_to(BufWriter::new(file), sweep_name, radio_model)
            .with_context(|| format!("Failed to write report to '{}'", path.display()))?;

        log::info!("Wrote JSON report to '{}'", path.display());
        Ok(())
    }

    /// Serialise the report into `writer` and flush it, so a report that did not fully reach its
    /// destination is an error.
    pub fn write_json_to<W: Write>(
        &self,
        mut writer: W,
        sweep_name: &str,
        radio_model: &str,
    ) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.to_report(sweep_name, radio_model))
            .context("Failed to serialise report")?;
        writer.flush().context("Failed to flush report")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csl_tunnel_core::prelude::{StatsSample, SweepParameter};
    use pretty_assertions::assert_eq;

    fn sample_table() -> ResultTable {
        let mut table = ResultTable::new(ResultRow::baseline(
            SweepParameter::IDEAL,
            StatsSample::new(812, 59188),
        ));
        table.push(ResultRow::relative_to(
            SweepParameter::new(255, 1),
            StatsSample::new(1103, 58897),
            812,
        ));
        table.push(ResultRow::relative_to(
            SweepParameter::new(1, 255),
            StatsSample::new(2040, 57960),
            812,
        ));
        table
    }

    #[test]
    fn headers_are_fixed() {
        let headers = ReportRow::headers();
        assert_eq!(
            REPORT_HEADERS.to_vec(),
            headers.iter().map(|h| h.as_ref()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn rows_keep_table_order() {
        let table = sample_table();
        let rows = ReportAssembler::new(&table).rows();

        assert_eq!(
            vec![
                ReportRow {
                    accuracy: 0,
                    uncertainty: 0,
                    sleep_time_ms: 59188,
                    active_time_ms: 812,
                    active_delta_ms: 0,
                },
                ReportRow {
                    accuracy: 255,
                    uncertainty: 1,
                    sleep_time_ms: 58897,
                    active_time_ms: 1103,
                    active_delta_ms: 291,
                },
                ReportRow {
                    accuracy: 1,
                    uncertainty: 255,
                    sleep_time_ms: 57960,
                    active_time_ms: 2040,
                    active_delta_ms: 1228,
                },
            ],
            rows
        );
    }

    #[test]
    fn renders_header_then_one_line_per_row() {
        let table = sample_table();
        let rendered = ReportAssembler::new(&table).render();
        let lines = rendered.lines().collect::<Vec<_>>();

        // Header, separator and three rows.
        assert_eq!(5, lines.len());
        let mut rest = lines[0];
        for header in REPORT_HEADERS {
            let at = rest.find(header).expect("Header missing or out of order");
            rest = &rest[at + header.len()..];
        }
        assert!(lines[2].contains("812"));
        assert!(lines[4].contains("1228"));
    }

    #[test]
    fn writes_json_report() -> anyhow::Result<()> {
        let table = sample_table();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("report.json");

        ReportAssembler::new(&table).write_json(&path, "csl_accuracy", "MutualInterference")?;

        let report: SweepReport = serde_json::from_reader(File::open(&path)?)?;
        assert_eq!("csl_accuracy", report.sweep_name);
        assert_eq!("MutualInterference", report.radio_model);
        assert_eq!(table.rows(), report.rows.as_slice());
        Ok(())
    }

    /// Accepts writes but cannot flush them, like a disk that fills up under a buffered writer.
    struct FlushFails {
        written: usize,
    }

    impl Write for FlushFails {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("no space left on device"))
        }
    }

    #[test]
    fn failed_flush_fails_the_export() {
        let table = sample_table();
        let mut sink = FlushFails { written: 0 };

        let result =
            ReportAssembler::new(&table).write_json_to(&mut sink, "csl_accuracy", "Ideal");

        assert!(result.is_err());
        assert!(sink.written > 0);
    }

    #[test]
    fn buffered_report_is_flushed_before_returning() -> anyhow::Result<()> {
        let table = sample_table();
        let mut out = Vec::new();

        ReportAssembler::new(&table).write_json_to(
            BufWriter::new(&mut out),
            "csl_accuracy",
            "Ideal",
        )?;

        let report: SweepReport = serde_json::from_slice(&out)?;
        assert_eq!(table.rows(), report.rows.as_slice());
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_disk_fails_the_export() {
        let table = sample_table();

        let result =
            ReportAssembler::new(&table).write_json("/dev/full", "csl_accuracy", "Ideal");

        assert!(result.is_err());
    }
}
