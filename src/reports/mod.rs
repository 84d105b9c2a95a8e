//! The per-run reports: statistics computed from one benchmark log,
//! appended to a CSV file and printed as a table.

pub mod buffers;
pub mod kernels;
pub mod pos;

use std::{
    io::{IsTerminal, Write},
    path::Path,
};

use anyhow::Result;
use kstring::KString;

use crate::{
    csv_report::{append_report, ReportKind},
    info,
    stats::{AggregateStat, StatsDisplay, StatsRow},
    terminal_table::{write_table, TerminalTableOpts},
};

/// Identifies the run a report belongs to in the CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct RunId {
    /// The execution identifier
    pub timestamp: String,
    /// The version identifier
    pub commit_hash: String,
}

impl RunId {
    /// Surrounding whitespace is removed from both values.
    pub fn new(timestamp: &str, commit_hash: &str) -> Self {
        Self {
            timestamp: timestamp.trim().to_owned(),
            commit_hash: commit_hash.trim().to_owned(),
        }
    }
}

/// Statistics per named series, in name order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: ReportKind,
    pub stats: Vec<(KString, AggregateStat)>,
    pub display: StatsDisplay,
}

impl Report {
    pub fn get(&self, name: &str) -> Option<&AggregateStat> {
        self.stats
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, stat)| stat)
    }

    pub fn append_to_csv(&self, csv_path: &Path, run: &RunId) -> Result<()> {
        info!(
            "appending {} rows of the {} report to {csv_path:?}",
            self.stats.len(),
            self.kind
        );
        append_report(
            csv_path,
            self.kind,
            &run.timestamp,
            &run.commit_hash,
            &self.stats,
        )
    }

    pub fn write_table(
        &self,
        opts: &TerminalTableOpts,
        is_terminal: bool,
        out: &mut impl Write,
    ) -> Result<()> {
        let show_count = self.kind.has_count();
        let rows: Vec<StatsRow> = self
            .stats
            .iter()
            .map(|(name, stat)| StatsRow {
                name,
                stat,
                show_count,
                display: self.display,
            })
            .collect();
        write_table(&StatsRow::titles(show_count), &rows, opts, is_terminal, out)
    }

    /// Append to the CSV file, then print the table to stdout with
    /// the given introduction.
    pub fn emit(
        &self,
        csv_path: &Path,
        run: &RunId,
        intro: &str,
        opts: &TerminalTableOpts,
    ) -> Result<()> {
        self.append_to_csv(csv_path, run)?;
        let mut out = std::io::stdout().lock();
        let is_terminal = out.is_terminal();
        if !opts.tsv {
            writeln!(out, "{intro}")?;
        }
        self.write_table(opts, is_terminal, &mut out)?;
        out.flush()?;
        Ok(())
    }
}
