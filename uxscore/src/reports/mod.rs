//! Report file rendering: CSV and PDF exports of the evaluation report.

pub mod csv;
pub mod pdf;

use chrono::Utc;

/// Format an average score the way the report expects: whole numbers bare
/// ("4"), everything else with one decimal ("3.5").
pub fn format_average(avg: f64) -> String {
    if avg.fract() == 0.0 {
        format!("{avg:.0}")
    } else {
        format!("{avg:.1}")
    }
}

/// Timestamped attachment filename, e.g. `evaluation_report_20250314_123000.csv`.
pub fn report_filename(extension: &str) -> String {
    format!("evaluation_report_{}.{extension}", Utc::now().format("%Y%m%d_%H%M%S"))
}
