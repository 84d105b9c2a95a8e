//! The CSV files the reports are appended to: one row per statistic
//! per run, tagged with the run's timestamp and commit hash, so that
//! the rows of repeated runs and different versions accumulate in the
//! same file.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use anyhow::Result;
use kstring::KString;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{ctx, debug, stats::AggregateStat};

/// The kinds of report, as used for the CSV file name suffix
/// (`{dataset}.{platform}.log.{kind}.csv`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Kernels,
    Pos,
    Buffers,
}

impl ReportKind {
    /// Only the kernel report carries the number of samples.
    pub fn has_count(self) -> bool {
        match self {
            ReportKind::Kernels => true,
            ReportKind::Pos | ReportKind::Buffers => false,
        }
    }

    pub fn header(self) -> &'static [&'static str] {
        if self.has_count() {
            &[
                "Timestamp",
                "CommitHash",
                "Name",
                "Count",
                "Min",
                "Max",
                "Mean",
                "Total",
            ]
        } else {
            &[
                "Timestamp",
                "CommitHash",
                "Name",
                "Min",
                "Max",
                "Mean",
                "Total",
            ]
        }
    }

    /// The CSV file written for the log of a `make-run` target.
    pub fn csv_file_name(self, dataset: &str, platform: &str) -> String {
        format!("{dataset}.{platform}.log.{self}.csv")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow<'r> {
    pub timestamp: &'r str,
    pub commit_hash: &'r str,
    pub name: &'r str,
    pub stat: AggregateStat,
}

impl<'r> ReportRow<'r> {
    fn fields(&self, with_count: bool) -> Vec<String> {
        let Self {
            timestamp,
            commit_hash,
            name,
            stat:
                AggregateStat {
                    count,
                    min,
                    max,
                    mean,
                    total,
                },
        } = self;
        let mut fields = vec![timestamp.to_string(), commit_hash.to_string(), name.to_string()];
        if with_count {
            fields.push(count.to_string());
        }
        fields.extend([min, max, mean, total].map(|v| format!("{v:?}")));
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WriterState {
    /// The file did not exist when opened; the header is written
    /// before the first row.
    Uninitialized,
    HeaderWritten,
}

/// Appends report rows to a CSV file, writing the header row only if
/// the file is new.
pub struct ReportWriter {
    kind: ReportKind,
    path: PathBuf,
    state: WriterState,
    writer: csv::Writer<std::fs::File>,
}

impl ReportWriter {
    pub fn open(path: &Path, kind: ReportKind) -> Result<Self> {
        let state = if path.exists() {
            WriterState::HeaderWritten
        } else {
            WriterState::Uninitialized
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(ctx!("opening CSV file {path:?} for appending"))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(Self {
            kind,
            path: path.to_owned(),
            state,
            writer,
        })
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<()> {
        let path = &self.path;
        if self.state == WriterState::Uninitialized {
            debug!("writing header to new CSV file {path:?}");
            self.writer
                .write_record(self.kind.header())
                .map_err(ctx!("writing to {path:?}"))?;
            self.state = WriterState::HeaderWritten;
        }
        self.writer
            .write_record(row.fields(self.kind.has_count()))
            .map_err(ctx!("writing to {path:?}"))?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        let path = &self.path;
        self.writer.flush().map_err(ctx!("writing to {path:?}"))?;
        Ok(())
    }
}

/// Append one row per statistic.
pub fn append_report(
    path: &Path,
    kind: ReportKind,
    timestamp: &str,
    commit_hash: &str,
    stats: &[(KString, AggregateStat)],
) -> Result<()> {
    let mut writer = ReportWriter::open(path, kind)?;
    for (name, stat) in stats {
        writer.write_row(&ReportRow {
            timestamp,
            commit_hash,
            name,
            stat: *stat,
        })?;
    }
    writer.finish()
}

/// The columns of a report row needed for aggregating across runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: KString,
    #[serde(rename = "CommitHash")]
    pub commit_hash: KString,
    #[serde(rename = "Name")]
    pub name: KString,
    #[serde(rename = "Mean")]
    pub mean: f64,
    #[serde(rename = "Total")]
    pub total: f64,
}

/// Read all rows of a report CSV file (with either header layout).
pub fn read_report(path: &Path) -> Result<Vec<StoredRow>> {
    let mut reader = csv::Reader::from_path(path).map_err(ctx!("opening CSV file {path:?}"))?;
    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.map_err(ctx!("reading CSV file {path:?}, row {}", i + 1)))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::io_utils::temporary_file::TemporaryFile;

    use super::*;

    fn stat(vals: &[f64]) -> AggregateStat {
        AggregateStat::from_values(vals).unwrap()
    }

    #[test]
    fn t_kind() {
        assert_eq!(ReportKind::Kernels.to_string(), "kernels");
        assert_eq!("pos".parse::<ReportKind>().unwrap(), ReportKind::Pos);
        assert_eq!(
            ReportKind::Pos.csv_file_name("icl0", "cpp"),
            "icl0.cpp.log.pos.csv"
        );
        assert_eq!(ReportKind::Kernels.header().len(), 8);
        assert_eq!(ReportKind::Buffers.header().len(), 7);
    }

    #[test]
    fn t_header_written_once() {
        let tmp = TemporaryFile::in_temp_dir("header-once.csv");
        let stats = vec![
            (KString::from_static("k1"), stat(&[5.0, 7.0])),
            (KString::from_static("k2"), stat(&[10.0])),
        ];
        for run in ["1", "2", "3"] {
            append_report(tmp.path(), ReportKind::Kernels, run, "abc", &stats).unwrap();
        }
        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1 + 3 * 2);
        assert_eq!(lines[0], "Timestamp,CommitHash,Name,Count,Min,Max,Mean,Total");
        assert_eq!(lines[1], "1,abc,k1,2,5.0,7.0,6.0,12.0");
        assert_eq!(lines[2], "1,abc,k2,1,10.0,10.0,10.0,10.0");
        assert_eq!(
            contents.matches("Timestamp").count(),
            1,
            "header exactly once: {contents}"
        );
    }

    #[test]
    fn t_no_count_column() {
        let tmp = TemporaryFile::in_temp_dir("no-count.csv");
        let stats = vec![(KString::from_static("ATE"), stat(&[0.5, 1.5]))];
        append_report(tmp.path(), ReportKind::Pos, "t", "v1", &stats).unwrap();
        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        assert_eq!(
            contents,
            "Timestamp,CommitHash,Name,Min,Max,Mean,Total\nt,v1,ATE,0.5,1.5,1.0,2.0\n"
        );
    }

    #[test]
    fn t_read_back() {
        let tmp = TemporaryFile::in_temp_dir("read-back.csv");
        let stats = vec![(KString::from_static("track"), stat(&[1.0, 2.0]))];
        append_report(tmp.path(), ReportKind::Kernels, "t1", "v1", &stats).unwrap();
        append_report(tmp.path(), ReportKind::Kernels, "t2", "v2", &stats).unwrap();
        let rows = read_report(tmp.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].timestamp.as_str(), "t2");
        assert_eq!(rows[1].commit_hash.as_str(), "v2");
        assert_eq!(rows[1].name.as_str(), "track");
        assert_eq!(rows[1].mean, 1.5);
        assert_eq!(rows[1].total, 3.0);
    }

    #[test]
    fn t_read_missing_file() {
        let tmp = TemporaryFile::in_temp_dir("does-not-exist.csv");
        let e = read_report(tmp.path()).err().unwrap();
        assert!(format!("{e:#}").contains("does-not-exist.csv"));
    }
}
