//! Statistics over the host/device buffer transfers of a run.

use std::fmt::Display;

use anyhow::{bail, Result};

use super::Report;
use crate::{
    csv_report::ReportKind,
    log_format::buffer_log::{BufferLog, BufferTransfer},
    series::NamedSeries,
    stats::StatsDisplay,
};

pub const INTRO: &str = "Buffer transfer statistics. Sizes are in bytes, times in seconds, \
    bandwidths in bytes per second.";

const MB: f64 = 1024. * 1024.;

pub fn buffer_report(log: &BufferLog) -> Result<Report> {
    if log.transfers.is_empty() {
        bail!("the buffer log contains no transfers")
    }
    let mut series = NamedSeries::new();
    for transfer in &log.transfers {
        series.push("BufferSize", transfer.size_bytes as f64);
        series.push("TransferTime", transfer.seconds);
        series.push("Bandwidth", transfer.bandwidth());
    }
    Ok(Report {
        kind: ReportKind::Buffers,
        stats: series.aggregate(|_| true)?,
        display: StatsDisplay::Decimals(6),
    })
}

/// The text summary of all transfers of a log, as written by
/// `buffers --summary`.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferSummary<'l> {
    pub entries: usize,
    pub total_size: u64,
    pub total_time: f64,
    pub max_size: u64,
    pub min_size: u64,
    pub max_time_entry: &'l BufferTransfer,
    pub min_time_entry: &'l BufferTransfer,
    pub max_bandwidth_entry: &'l BufferTransfer,
    pub min_bandwidth_entry: &'l BufferTransfer,
}

/// The first entry for which `key` is extreme (`more_extreme(a, b)`
/// says whether `a` beats `b`).
fn first_extreme<'l>(
    transfers: &'l [BufferTransfer],
    key: impl Fn(&BufferTransfer) -> f64,
    more_extreme: impl Fn(f64, f64) -> bool,
) -> Option<&'l BufferTransfer> {
    let (first, rest) = transfers.split_first()?;
    Some(rest.iter().fold(first, |best, t| {
        if more_extreme(key(t), key(best)) {
            t
        } else {
            best
        }
    }))
}

impl<'l> BufferSummary<'l> {
    /// None if the log has no entries.
    pub fn from_log(log: &'l BufferLog) -> Option<Self> {
        let transfers = &log.transfers;
        let seconds = |t: &BufferTransfer| t.seconds;
        let bandwidth = |t: &BufferTransfer| t.bandwidth();
        let greater = |a: f64, b: f64| a > b;
        let less = |a: f64, b: f64| a < b;
        Some(Self {
            entries: transfers.len(),
            total_size: transfers.iter().map(|t| t.size_bytes).sum(),
            total_time: transfers.iter().map(|t| t.seconds).sum(),
            max_size: transfers.iter().map(|t| t.size_bytes).max()?,
            min_size: transfers.iter().map(|t| t.size_bytes).min()?,
            max_time_entry: first_extreme(transfers, seconds, greater)?,
            min_time_entry: first_extreme(transfers, seconds, less)?,
            max_bandwidth_entry: first_extreme(transfers, bandwidth, greater)?,
            min_bandwidth_entry: first_extreme(transfers, bandwidth, less)?,
        })
    }

    /// Bytes per second over all transfers.
    pub fn overall_bandwidth(&self) -> f64 {
        self.total_size as f64 / self.total_time
    }

    /// The overall bandwidth divided by the number of entries (not
    /// the mean of the per-entry bandwidths).
    pub fn average_bandwidth(&self) -> f64 {
        self.overall_bandwidth() / self.entries as f64
    }
}

struct EntryLine<'l>(&'l BufferTransfer);

impl<'l> Display for EntryLine<'l> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let t = self.0;
        write!(
            f,
            "Buffer Size: {} MB\tTransfer time: {} s\tbandwidth: {} MB/s",
            t.size_bytes as f64 / MB,
            t.seconds,
            t.bandwidth() / MB
        )
    }
}

impl<'l> Display for BufferSummary<'l> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            entries,
            total_size,
            total_time,
            max_size,
            min_size,
            max_time_entry,
            min_time_entry,
            max_bandwidth_entry,
            min_bandwidth_entry,
        } = self;
        let n = *entries as f64;
        writeln!(f, "Amount of entries: {entries}")?;
        writeln!(f, "Total size transferred: {} MB", *total_size as f64 / MB)?;
        writeln!(f, "Total transfer time: {total_time} s")?;
        writeln!(f, "Overall bandwidth: {} MB/s\n", self.overall_bandwidth() / MB)?;

        writeln!(f, "Average buffer size: {} MB", *total_size as f64 / n / MB)?;
        writeln!(f, "Average transfer time: {} s", total_time / n)?;
        writeln!(f, "Average bandwidth: {} MB/s\n", self.average_bandwidth() / MB)?;

        writeln!(f, "Max buffer size: {} MB", *max_size as f64 / MB)?;
        writeln!(f, "Min buffer size: {} MB\n", *min_size as f64 / MB)?;

        writeln!(f, "Max transfer time entry... {}", EntryLine(max_time_entry))?;
        writeln!(f, "Min transfer time entry... {}", EntryLine(min_time_entry))?;
        writeln!(f, "Max bandwidth entry... {}", EntryLine(max_bandwidth_entry))?;
        writeln!(f, "Min bandwidth entry... {}", EntryLine(min_bandwidth_entry))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn log() -> BufferLog {
        BufferLog::parse(
            "trackKernel\tread\t0\t0\t1048576\t0.5\n\
             integrateKernel\twrite\t0\t1\t2097152\t0.5\n\
             raycastKernel\tread\t1\t0\t1048576\t0.25\n",
            Path::new("buffers.log"),
        )
        .unwrap()
    }

    #[test]
    fn t_buffer_report() {
        let report = buffer_report(&log()).unwrap();
        let names: Vec<&str> = report.stats.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Bandwidth", "BufferSize", "TransferTime"]);
        assert_eq!(report.get("BufferSize").unwrap().total, 4194304.0);
        assert_eq!(report.get("TransferTime").unwrap().total, 1.25);
        assert_eq!(report.get("Bandwidth").unwrap().max, 4194304.0);
        assert_eq!(report.get("Bandwidth").unwrap().min, 2097152.0);
    }

    #[test]
    fn t_empty_log_is_fatal() {
        let log = BufferLog::parse("", Path::new("buffers.log")).unwrap();
        assert!(buffer_report(&log).is_err());
        assert!(BufferSummary::from_log(&log).is_none());
    }

    #[test]
    fn t_summary() {
        let log = log();
        let s = BufferSummary::from_log(&log).unwrap();
        assert_eq!(s.entries, 3);
        assert_eq!(s.total_size, 4194304);
        assert_eq!(s.overall_bandwidth(), 4194304.0 / 1.25);
        // ties go to the first entry
        assert_eq!(s.max_time_entry.kernel.as_str(), "trackKernel");
        assert_eq!(s.min_time_entry.kernel.as_str(), "raycastKernel");
        assert_eq!(s.max_bandwidth_entry.kernel.as_str(), "integrateKernel");
        assert_eq!(s.min_bandwidth_entry.kernel.as_str(), "trackKernel");

        let text = s.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Amount of entries: 3");
        assert_eq!(lines[1], "Total size transferred: 4 MB");
        assert_eq!(lines[2], "Total transfer time: 1.25 s");
        assert_eq!(lines[3], "Overall bandwidth: 3.2 MB/s");
        assert_eq!(lines[4], "");
        // overall 3.2 MB/s over 3 entries, not the mean of 2, 4 and 4 MB/s
        assert_eq!(s.average_bandwidth(), s.overall_bandwidth() / 3.0);
        assert!(lines[7].starts_with("Average bandwidth: 1.0666"), "{}", lines[7]);
        assert_eq!(lines[9], "Max buffer size: 2 MB");
        assert_eq!(
            lines[12],
            "Max transfer time entry... Buffer Size: 1 MB\tTransfer time: 0.5 s\tbandwidth: 2 MB/s"
        );
        assert_eq!(lines.len(), 16);
    }
}
