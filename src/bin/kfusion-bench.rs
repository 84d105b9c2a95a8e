use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use kfusion_bench_tools::{
    config_file::{save_config_file, LoadConfigFile},
    ctx,
    get_terminal_width::get_terminal_width,
    info,
    log_format::{
        buffer_log::BufferLog, kernel_log::KernelLog, position_log::PositionLog,
        reference_trajectory::ReferenceTrajectory,
    },
    multi_run::{make_run, RunTarget},
    report_config::ReportConfig,
    reports::{
        self,
        buffers::{buffer_report, BufferSummary},
        kernels::kernel_report,
        pos::position_report,
        RunId,
    },
    terminal_table::TerminalTableOpts,
    utillib::logging::{set_log_level, LogLevelOpt},
};

#[derive(clap::Parser, Debug)]
#[clap(next_line_help = true)]
#[clap(term_width = get_terminal_width(4))]
/// Analyze the logs of KFusion benchmark runs.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// Path to the config file (default: `~/.kfusion-bench.*` if
    /// present, with one of the extensions json5, json, yml, yaml,
    /// ron, otherwise built-in defaults)
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(flatten)]
    table_opts: TerminalTableOpts,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(Debug, clap::Args)]
struct ReportArgs {
    /// Execution identifier for the CSV rows
    timestamp: String,

    /// Version identifier for the CSV rows
    commit_hash: String,

    /// The CSV file to append the statistics to (the header row is
    /// written if the file does not exist yet)
    csv: PathBuf,
}

impl ReportArgs {
    fn run_id(&self) -> RunId {
        RunId::new(&self.timestamp, &self.commit_hash)
    }
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print the version of this program.
    Version,

    /// Write the effective configuration to a file; the format is
    /// chosen by the file extension.
    ConfigSave { path: PathBuf },

    /// Kernel-level statistics from a kernel timing log.
    Kernels {
        /// The kernel log of a benchmark run
        log: PathBuf,

        #[clap(flatten)]
        report: ReportArgs,
    },

    /// Per-stage runtimes and the absolute trajectory error (ATE)
    /// from the per-frame benchmark log and the ground truth.
    Pos {
        /// The per-frame benchmark log
        log: PathBuf,

        /// The ground truth trajectory of the dataset
        reference: PathBuf,

        #[clap(flatten)]
        report: ReportArgs,
    },

    /// Statistics over the buffer transfers of a run.
    Buffers {
        /// The buffer transfer log
        log: PathBuf,

        #[clap(flatten)]
        report: ReportArgs,

        /// Also write a text summary of the transfers to this file
        #[clap(long)]
        summary: Option<PathBuf>,
    },

    /// Run the benchmark target `{dataset}.{platform}.log` via the
    /// build command repeatedly, then summarize the resulting CSV
    /// files per version.
    MakeRun {
        /// Number of executions
        n: usize,

        /// ICL-NUIM dataset id
        dataset: String,

        /// cpp | openmp | cuda | opencl
        platform: String,
    },
}

fn load_config(path: Option<&Path>) -> Result<ReportConfig> {
    ReportConfig::load_config(path, |msg| {
        info!("{msg}, using the default configuration");
        Ok(ReportConfig::default())
    })
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        config,
        table_opts,
        subcommand,
    } = Opts::parse();

    set_log_level(log_level.try_into()?);

    let config = load_config(config.as_deref())?;

    match subcommand {
        SubCommand::Version => {
            println!("kfusion-bench {}", env!("CARGO_PKG_VERSION"));
        }
        SubCommand::ConfigSave { path } => {
            save_config_file(&path, &config)?;
        }
        SubCommand::Kernels { log, report } => {
            let parsed = KernelLog::read_file(&log)?;
            kernel_report(&parsed, &config)?.emit(
                &report.csv,
                &report.run_id(),
                reports::kernels::INTRO,
                &table_opts,
            )?;
        }
        SubCommand::Pos {
            log,
            reference,
            report,
        } => {
            let parsed = PositionLog::read_file(&log)?;
            let reference = ReferenceTrajectory::read_file(&reference)?;
            let pos = position_report(&parsed, &reference, &config)?;
            let intro = format!("{}\n{}", pos.frame_counts(), reports::pos::INTRO);
            pos.report
                .emit(&report.csv, &report.run_id(), &intro, &table_opts)?;
        }
        SubCommand::Buffers {
            log,
            report,
            summary,
        } => {
            let parsed = BufferLog::read_file(&log)?;
            let buffers = buffer_report(&parsed)?;
            if let Some(summary_path) = summary {
                // buffer_report already failed for an empty log
                if let Some(summary) = BufferSummary::from_log(&parsed) {
                    std::fs::write(&summary_path, summary.to_string())
                        .map_err(ctx!("writing buffer summary to {summary_path:?}"))?;
                }
            }
            buffers.emit(
                &report.csv,
                &report.run_id(),
                reports::buffers::INTRO,
                &table_opts,
            )?;
        }
        SubCommand::MakeRun {
            n,
            dataset,
            platform,
        } => {
            make_run(
                Path::new("."),
                &config,
                &RunTarget { dataset, platform },
                n,
                &table_opts,
            )?;
        }
    }

    Ok(())
}
