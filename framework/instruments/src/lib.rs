mod report;

pub use report::{ReportAssembler, ReportRow, SweepReport, REPORT_HEADERS};
