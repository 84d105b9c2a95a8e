//! Kernel-level statistics. Times are in nanoseconds.

use anyhow::Result;

use super::Report;
use crate::{
    csv_report::ReportKind, log_format::kernel_log::KernelLog, report_config::ReportConfig,
    stats::StatsDisplay, warn,
};

pub const INTRO: &str = "Kernel-level statistics. Times are in nanoseconds.";

pub fn kernel_report(log: &KernelLog, config: &ReportConfig) -> Result<Report> {
    if log.timings.is_empty() {
        warn!("the kernel log contains no timings");
    }
    let stats = log.series(config).aggregate(|_| true)?;
    Ok(Report {
        kind: ReportKind::Kernels,
        stats,
        display: StatsDisplay::Integer,
    })
}
