//! Repeated benchmark runs via the build system, and the summary of
//! the reports they appended, per version.
//!
//! Each run of the `{dataset}.{platform}.log` target is expected to
//! append its `pos` and `kernels` reports to
//! `{dataset}.{platform}.log.{kind}.csv`.

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    io::{IsTerminal, Write},
    path::Path,
    process::Command,
};

use anyhow::{bail, Result};
use kstring::KString;

use crate::{
    csv_report::{read_report, ReportKind, StoredRow},
    ctx, info,
    io_utils::bash::bash_string_from_cmd,
    report_config::{ReportConfig, ATE},
    terminal_table::{write_table, TableRow, TerminalTableOpts},
    utillib::unix::ToExitCode,
    warn,
};

/// A dataset/platform combination, as used for the make target and
/// the CSV file names.
#[derive(Debug, Clone, PartialEq)]
pub struct RunTarget {
    /// ICL-NUIM dataset id
    pub dataset: String,
    /// cpp | openmp | cuda | opencl
    pub platform: String,
}

impl RunTarget {
    pub fn make_target(&self) -> String {
        let Self { dataset, platform } = self;
        format!("{dataset}.{platform}.log")
    }

    pub fn csv_file_name(&self, kind: ReportKind) -> String {
        kind.csv_file_name(&self.dataset, &self.platform)
    }
}

/// Delete the CSV files of earlier runs in `dir`, so that only the
/// new runs are summarized.
pub fn remove_old_reports(
    dir: &Path,
    target: &RunTarget,
    kinds: impl IntoIterator<Item = ReportKind>,
) -> Result<()> {
    for kind in kinds {
        let path = dir.join(target.csv_file_name(kind));
        if path.exists() {
            println!("Removing {}", path.display());
            std::fs::remove_file(&path).map_err(ctx!("removing {path:?}"))?;
        }
    }
    Ok(())
}

/// Run the build command for the target `n` times, sequentially, in
/// `dir`. Failing runs are reported but do not stop the remaining
/// ones. Returns the number of failed runs.
pub fn run_builds(dir: &Path, config: &ReportConfig, target: &RunTarget, n: usize) -> Result<usize> {
    let Some((program, args)) = config.build_command.split_first() else {
        bail!("the configured build_command is empty")
    };
    let make_target = target.make_target();
    let mut failures = 0;
    for i in 1..=n {
        println!("Running #{i}");
        let mut command = Command::new(program);
        command.args(args).arg(&make_target).current_dir(dir);
        let cmd_str = bash_string_from_cmd(
            config
                .build_command
                .iter()
                .map(|s| s.as_str())
                .chain([make_target.as_str()]),
        );
        info!("running {cmd_str}");
        let status = command
            .status()
            .map_err(ctx!("starting command {cmd_str}"))?;
        if !status.success() {
            warn!(
                "run #{i}: command {cmd_str} failed with exit code {}",
                status.to_exit_code()
            );
            failures += 1;
        }
    }
    Ok(failures)
}

/// The accumulated report rows of one version (commit hash).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VersionSummary {
    /// The distinct run timestamps seen.
    pub runs: BTreeSet<KString>,
    /// Summed `Total` per stage.
    pub stage_totals: BTreeMap<KString, f64>,
    /// Summed `Total` over all stages.
    pub total_time: f64,
    /// Summed `Mean` of the ATE rows.
    pub ate_sum: f64,
    pub ate_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary<'s> {
    pub name: &'s str,
    /// Time per run
    pub average: f64,
    /// Share of the version's total time, 0..100
    pub percentage: f64,
}

impl<'s> TableRow for StageSummary<'s> {
    fn table_row(&self) -> Vec<Cow<'_, str>> {
        vec![
            self.name.into(),
            format!("{:.6}", self.average).into(),
            format!("{:.2}%", self.percentage).into(),
        ]
    }
}

impl VersionSummary {
    fn add_row(&mut self, row: &StoredRow, config: &ReportConfig) {
        self.runs.insert(row.timestamp.clone());
        let name = row.name.as_str();
        if name == ATE {
            self.ate_sum += row.mean;
            self.ate_rows += 1;
        }
        if config.is_reserved_stage_name(name) {
            return;
        }
        *self.stage_totals.entry(row.name.clone()).or_insert(0.) += row.total;
        self.total_time += row.total;
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Percentages are 0 if the total time is 0.
    pub fn stages(&self) -> Vec<StageSummary<'_>> {
        let runs = self.run_count() as f64;
        self.stage_totals
            .iter()
            .map(|(name, total)| StageSummary {
                name,
                average: total / runs,
                percentage: if self.total_time == 0. {
                    0.
                } else {
                    100. * total / self.total_time
                },
            })
            .collect()
    }

    /// None if there were no ATE rows.
    pub fn average_ate(&self) -> Option<f64> {
        (self.ate_rows > 0).then(|| self.ate_sum / self.run_count() as f64)
    }
}

/// Group the rows by commit hash, in a single pass.
pub fn summarize<'r>(
    rows: impl IntoIterator<Item = &'r StoredRow>,
    config: &ReportConfig,
) -> BTreeMap<KString, VersionSummary> {
    rows.into_iter()
        .fold(BTreeMap::new(), |mut versions: BTreeMap<KString, VersionSummary>, row| {
            versions
                .entry(row.commit_hash.clone())
                .or_default()
                .add_row(row, config);
            versions
        })
}

pub fn write_summary(
    file_name: &str,
    versions: &BTreeMap<KString, VersionSummary>,
    opts: &TerminalTableOpts,
    is_terminal: bool,
    out: &mut impl Write,
) -> Result<()> {
    for (version, summary) in versions {
        writeln!(out, "Analyzing {file_name}")?;
        writeln!(out, "\tVersion: {version}")?;
        writeln!(out, "\tNumber of execs: {}", summary.run_count())?;
        write_table(
            &["Stage", "Average", "Percentage"],
            &summary.stages(),
            opts,
            is_terminal,
            out,
        )?;
        if let Some(ate) = summary.average_ate() {
            writeln!(out, "\tAverage ATE: {ate:.6}")?;
        }
    }
    Ok(())
}

/// Remove old reports, run the benchmark `n` times, then summarize
/// the analyzed reports on stdout.
pub fn make_run(
    dir: &Path,
    config: &ReportConfig,
    target: &RunTarget,
    n: usize,
    opts: &TerminalTableOpts,
) -> Result<()> {
    let kinds: BTreeSet<ReportKind> = [ReportKind::Kernels, ReportKind::Pos]
        .into_iter()
        .chain(config.analyzed_logs.iter().copied())
        .collect();
    remove_old_reports(dir, target, kinds)?;

    let failures = run_builds(dir, config, target, n)?;
    if failures > 0 {
        warn!("{failures} of {n} runs failed");
    }

    let mut out = std::io::stdout().lock();
    let is_terminal = out.is_terminal();
    for kind in &config.analyzed_logs {
        let file_name = target.csv_file_name(*kind);
        let rows = read_report(&dir.join(&file_name))?;
        let versions = summarize(&rows, config);
        write_summary(&file_name, &versions, opts, is_terminal, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn row(timestamp: &str, commit_hash: &str, name: &str, mean: f64, total: f64) -> StoredRow {
        StoredRow {
            timestamp: KString::from_ref(timestamp),
            commit_hash: KString::from_ref(commit_hash),
            name: KString::from_ref(name),
            mean,
            total,
        }
    }

    #[test]
    fn t_target() {
        let target = RunTarget {
            dataset: "icl0".into(),
            platform: "openmp".into(),
        };
        assert_eq!(target.make_target(), "icl0.openmp.log");
        assert_eq!(
            target.csv_file_name(ReportKind::Kernels),
            "icl0.openmp.log.kernels.csv"
        );
    }

    #[test]
    fn t_two_runs_one_version() {
        let config = ReportConfig::default();
        let rows = vec![
            row("t1", "v1", "track", 0.5, 2.0),
            row("t1", "v1", "integrate", 1.0, 6.0),
            row("t1", "v1", "total", 4.0, 8.0),
            row("t1", "v1", "ATE", 0.02, 1.0),
            row("t2", "v1", "track", 0.5, 4.0),
            row("t2", "v1", "integrate", 1.0, 8.0),
            row("t2", "v1", "ATE", 0.04, 2.0),
        ];
        let versions = summarize(&rows, &config);
        assert_eq!(versions.len(), 1);
        let v1 = &versions["v1"];
        assert_eq!(v1.run_count(), 2);
        assert_eq!(v1.total_time, 20.0);
        let stages = v1.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name, "integrate");
        assert_eq!(stages[0].average, 7.0);
        assert_eq!(stages[1].name, "track");
        assert_eq!(stages[1].average, 3.0);
        assert_relative_eq!(stages.iter().map(|s| s.percentage).sum::<f64>(), 100.0);
        assert_relative_eq!(stages[0].percentage, 70.0);
        assert_relative_eq!(v1.average_ate().unwrap(), 0.03);
    }

    #[test]
    fn t_versions_are_separate() {
        let config = ReportConfig::default();
        let rows = vec![
            row("t1", "v1", "track", 1.0, 1.0),
            row("t2", "v2", "track", 1.0, 3.0),
            row("t3", "v2", "track", 1.0, 5.0),
            row("t3", "v2", "ATE_wrt_kfusion", 9.0, 9.0),
        ];
        let versions = summarize(&rows, &config);
        assert_eq!(versions.keys().map(|k| k.as_str()).collect::<Vec<_>>(), ["v1", "v2"]);
        assert_eq!(versions["v1"].run_count(), 1);
        assert_eq!(versions["v2"].run_count(), 2);
        let v2_stages = versions["v2"].stages();
        assert_eq!(v2_stages.len(), 2);
        assert_eq!(v2_stages[0].name, "ATE_wrt_kfusion");
        assert_eq!(v2_stages[0].average, 4.5);
        assert_eq!(v2_stages[1].name, "track");
        assert_eq!(v2_stages[1].average, 4.0);
        assert_eq!(versions["v2"].total_time, 17.0);
        assert_eq!(versions["v2"].average_ate(), None);
    }

    #[test]
    fn t_default_reserved_stage_names() {
        let config = ReportConfig::default();
        let rows = vec![
            row("t1", "v1", "track", 1.0, 2.0),
            row("t1", "v1", "ATE_wrt_kfusion", 0.5, 2.0),
            row("t1", "v1", "ATE", 0.5, 3.0),
            row("t1", "v1", "total", 4.0, 8.0),
        ];
        let versions = summarize(&rows, &config);
        let v1 = &versions["v1"];
        let names: Vec<&str> = v1.stages().iter().map(|s| s.name).collect();
        assert_eq!(names, ["ATE_wrt_kfusion", "track"]);
        assert_eq!(v1.total_time, 4.0);

        let mut config = ReportConfig::default();
        config.reserved_stage_names.push(KString::from_static("ATE_wrt_kfusion"));
        let versions = summarize(&rows, &config);
        assert_eq!(versions["v1"].total_time, 2.0);
        assert_eq!(versions["v1"].stages().len(), 1);
    }

    #[test]
    fn t_zero_total_time() {
        let config = ReportConfig::default();
        let rows = vec![row("t1", "v1", "track", 0.0, 0.0)];
        let versions = summarize(&rows, &config);
        let stages = versions["v1"].stages();
        assert_eq!(stages[0].percentage, 0.0);
        assert_eq!(stages[0].table_row()[2], "0.00%");
    }

    #[test]
    fn t_write_summary() {
        let config = ReportConfig::default();
        let rows = vec![row("t1", "v1", "track", 1.0, 2.0), row("t1", "v1", "ATE", 0.5, 1.0)];
        let versions = summarize(&rows, &config);
        let opts = TerminalTableOpts {
            tsv: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        write_summary("x.csv", &versions, &opts, false, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Analyzing x.csv\n\tVersion: v1\n\tNumber of execs: 1\n\
             Stage \tAverage \tPercentage \ntrack\t2.000000\t100.00%\n\
             \tAverage ATE: 0.500000\n"
        );
    }

    #[test]
    fn t_run_builds() {
        let dir = std::env::temp_dir();
        let target = RunTarget {
            dataset: "d".into(),
            platform: "p".into(),
        };
        let mut config = ReportConfig::default();
        config.build_command = vec!["true".into()];
        assert_eq!(run_builds(&dir, &config, &target, 2).unwrap(), 0);
        config.build_command = vec!["sh".into(), "-c".into(), "exit 3".into(), "sh".into()];
        assert_eq!(run_builds(&dir, &config, &target, 3).unwrap(), 3);
        config.build_command = vec![];
        assert!(run_builds(&dir, &config, &target, 1).is_err());
        config.build_command = vec!["/nonexistent/kfusion-bench-build".into()];
        assert!(run_builds(&dir, &config, &target, 1).is_err());
    }
}
