//! Per-stage runtimes and the absolute trajectory error of a KFusion
//! run, compared against the ICL-NUIM ground truth.

use anyhow::Result;

use super::Report;
use crate::{
    csv_report::ReportKind,
    debug,
    log_format::{position_log::PositionLog, reference_trajectory::ReferenceTrajectory},
    report_config::ReportConfig,
    stats::StatsDisplay,
    trajectory::{Alignment, CandidateFrame, CandidateTrajectory, FrameDiagnostic},
    utillib::logging::{log_level, LogLevel},
};

pub const INTRO: &str = "A detailed statistical analysis is provided.\n\
    Runtimes are in seconds and the absolute trajectory error (ATE) is in meters.\n\
    The ATE measure accuracy, check this number to see how precise your computation is.\n\
    Acceptable values are in the range of few centimeters.";

#[derive(Debug)]
pub struct PositionReport {
    pub report: Report,
    /// Frames for which KFusion delivered no pose.
    pub frames_dropped: usize,
    /// Records in the log.
    pub valid_frames: usize,
    /// Untracked frames beyond the warm-up frames.
    pub untracked: i64,
    /// Number of frames compared with the ground truth.
    pub aligned_frames: usize,
    pub diagnostics: Vec<FrameDiagnostic>,
}

impl PositionReport {
    /// The frame counts shown ahead of the statistics table.
    pub fn frame_counts(&self) -> String {
        let Self {
            frames_dropped,
            valid_frames,
            untracked,
            aligned_frames,
            ..
        } = self;
        format!(
            "{valid_frames} frames in the log, {frames_dropped} dropped, \
             {untracked} untracked beyond the warm-up; \
             {aligned_frames} frames compared with the ground truth."
        )
    }
}

pub fn position_report(
    log: &PositionLog,
    reference: &ReferenceTrajectory,
    config: &ReportConfig,
) -> Result<PositionReport> {
    let trajectory = CandidateTrajectory::from_frames(
        log.records.iter().map(CandidateFrame::from),
        config.untracked_warmup_frames,
    );
    let CandidateTrajectory {
        valid_frames,
        frames_dropped,
        untracked,
        ..
    } = trajectory;
    debug!("{} reference poses", reference.positions.len());

    let alignment = Alignment::new(&trajectory, &reference.positions)?;
    let diagnostics = alignment.diagnostics(config.frame_interval_secs);
    if log_level() >= LogLevel::Debug {
        debug!("Frame  speed(m/s)   dlv(m) ATE(m)   valid   tracked");
        for diagnostic in &diagnostics {
            debug!("{diagnostic}");
        }
    }

    let mut series = log.series();
    alignment.add_error_series(&mut series);
    let stats = series.aggregate(|name| !config.is_excluded_series(name))?;

    Ok(PositionReport {
        report: Report {
            kind: ReportKind::Pos,
            stats,
            display: StatsDisplay::Decimals(6),
        },
        frames_dropped,
        valid_frames,
        untracked,
        aligned_frames: alignment.len(),
        diagnostics,
    })
}
