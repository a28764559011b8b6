// src/pipeline/check.rs

//! On-demand check.

use crate::error::Result;
use crate::pipeline::{CycleReport, SharedDetector};
use crate::utils::log;

/// Run one cycle now, outside the schedule, and log its summary.
pub async fn run_check(detector: &SharedDetector) -> Result<CycleReport> {
    log::header("Catalog check");

    let report = detector.run_cycle().await?;

    log::summary(
        &report.summary(),
        &[
            ("Listed", report.entries_seen.to_string()),
            ("New items", report.new_items.to_string()),
            ("Status changes", report.status_changes.to_string()),
            ("Delivered", report.delivered.to_string()),
            ("Not delivered", report.delivery_failures.to_string()),
        ],
    );

    Ok(report)
}
