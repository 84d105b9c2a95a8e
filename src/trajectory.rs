//! Alignment of the trajectory estimated by KFusion with the ground
//! truth trajectory, and the absolute trajectory error (ATE).
//!
//! KFusion does not necessarily deliver a pose for every input frame
//! (when not run in process-every-frame mode). Frames it skipped are
//! filled with the last pose it did deliver, so that index i of the
//! candidate trajectory refers to the same input frame as index i of
//! the reference trajectory.

use std::fmt::Display;

use nalgebra::Vector3;

use crate::{
    log_format::position_log::PositionRecord,
    report_config::{ATE, ATE_WRT_KFUSION},
    series::NamedSeries,
};

/// One record of the candidate log, as needed for the alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFrame {
    pub frame: u64,
    pub position: Vector3<f64>,
    pub tracked: bool,
}

impl From<&PositionRecord> for CandidateFrame {
    fn from(record: &PositionRecord) -> Self {
        Self {
            frame: record.frame,
            position: record.position,
            tracked: record.tracked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePose {
    pub position: Vector3<f64>,
    /// Whether KFusion considered the pose valid.
    pub tracked: bool,
    /// Whether this is a copy of an earlier pose, filling the slot of
    /// a frame KFusion delivered no pose for.
    pub dropped: bool,
}

/// The candidate trajectory with one pose per input frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTrajectory {
    pub poses: Vec<CandidatePose>,
    /// Number of records in the log.
    pub valid_frames: usize,
    pub frames_dropped: usize,
    /// Untracked records minus the warm-up frames, which are always
    /// untracked (can be negative for short logs).
    pub untracked: i64,
}

impl CandidateTrajectory {
    pub fn from_frames(
        frames: impl IntoIterator<Item = CandidateFrame>,
        untracked_warmup_frames: u32,
    ) -> Self {
        let mut poses: Vec<CandidatePose> = Vec::new();
        let mut last_frame: i64 = -1;
        let mut last_valid: Option<CandidatePose> = None;
        let mut frames_dropped = 0;
        let mut valid_frames = 0;
        let mut untracked = -i64::from(untracked_warmup_frames);

        for CandidateFrame {
            frame,
            position,
            tracked,
        } in frames
        {
            let frame = frame as i64;
            let dropped = frame - last_frame - 1;
            if dropped > 0 {
                frames_dropped += dropped as usize;
                // Before the first record there is no earlier pose,
                // use the current one.
                let fill = CandidatePose {
                    dropped: true,
                    ..last_valid.unwrap_or(CandidatePose {
                        position,
                        tracked,
                        dropped: true,
                    })
                };
                poses.extend(std::iter::repeat(fill).take(dropped as usize));
            }
            let pose = CandidatePose {
                position,
                tracked,
                dropped: false,
            };
            poses.push(pose);
            last_valid = Some(pose);
            if !tracked {
                untracked += 1;
            }
            valid_frames += 1;
            last_frame = frame;
        }

        Self {
            poses,
            valid_frames,
            frames_dropped,
            untracked,
        }
    }
}

/// Move a KFusion position into the coordinate frame of the ground
/// truth: KFusion starts at the origin (thus add the first reference
/// position), and its Y axis points the other way.
pub fn rebase(position: Vector3<f64>, origin: Vector3<f64>) -> Vector3<f64> {
    let p = position + origin;
    Vector3::new(p.x, -p.y, p.z)
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TrajectoryError {
    #[error(
        "nothing to compare: candidate trajectory has {candidate} poses, \
         reference trajectory has {reference}"
    )]
    NothingToCompare { candidate: usize, reference: usize },
}

/// Candidate (rebased) and reference trajectories of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub candidate: Vec<CandidatePose>,
    pub reference: Vec<Vector3<f64>>,
    pub frames_dropped: usize,
}

impl Alignment {
    pub fn new(
        candidate: &CandidateTrajectory,
        reference: &[Vector3<f64>],
    ) -> Result<Self, TrajectoryError> {
        let working_position = candidate.poses.len().min(reference.len());
        if working_position == 0 {
            return Err(TrajectoryError::NothingToCompare {
                candidate: candidate.poses.len(),
                reference: reference.len(),
            });
        }
        let reference = &reference[..working_position];
        let origin = reference[0];
        let poses = candidate.poses[..working_position]
            .iter()
            .map(|pose| CandidatePose {
                position: rebase(pose.position, origin),
                ..*pose
            })
            .collect();
        Ok(Self {
            candidate: poses,
            reference: reference.to_vec(),
            frames_dropped: candidate.frames_dropped,
        })
    }

    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Per-frame Euclidean distance between candidate and reference.
    pub fn ate(&self) -> Vec<f64> {
        self.candidate
            .iter()
            .zip(&self.reference)
            .map(|(c, r)| (c.position - r).norm())
            .collect()
    }

    /// The ATE for only the frames KFusion delivered a pose for; None
    /// if no frames were dropped, since then it's the same as `ate`.
    pub fn ate_wrt_kfusion(&self) -> Option<Vec<f64>> {
        if self.frames_dropped == 0 {
            return None;
        }
        Some(
            self.candidate
                .iter()
                .zip(self.ate())
                .filter(|(c, _)| !c.dropped)
                .map(|(_, ate)| ate)
                .collect(),
        )
    }

    /// Add the `ATE` series, and the `ATE_wrt_kfusion` series if
    /// frames were dropped.
    pub fn add_error_series(&self, series: &mut NamedSeries) {
        series.insert(ATE, self.ate());
        if let Some(ate_wrt_kfusion) = self.ate_wrt_kfusion() {
            series.insert(ATE_WRT_KFUSION, ate_wrt_kfusion);
        }
    }

    /// Movement along the reference trajectory, for showing how the
    /// error relates to the camera speed.
    pub fn diagnostics(&self, frame_interval_secs: f64) -> Vec<FrameDiagnostic> {
        let mut distance_since_valid = 0.;
        let mut previous = self.reference[0];
        self.candidate
            .iter()
            .zip(&self.reference)
            .zip(self.ate())
            .enumerate()
            .map(|(frame, ((c, r), ate))| {
                let d = r - previous;
                let horizontal = (d.x * d.x + d.z * d.z).sqrt();
                let distance = (d.y * d.y + horizontal * horizontal).sqrt();
                previous = *r;
                distance_since_valid += distance;
                let diagnostic = FrameDiagnostic {
                    frame,
                    speed: distance / frame_interval_secs,
                    distance_since_valid,
                    ate,
                    dropped: c.dropped,
                    tracked: c.tracked,
                };
                if !c.dropped {
                    distance_since_valid = 0.;
                }
                diagnostic
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDiagnostic {
    pub frame: usize,
    /// m/s
    pub speed: f64,
    /// m travelled since the last frame KFusion delivered a pose for
    pub distance_since_valid: f64,
    pub ate: f64,
    pub dropped: bool,
    pub tracked: bool,
}

impl Display for FrameDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            frame,
            speed,
            distance_since_valid,
            ate,
            dropped,
            tracked,
        } = self;
        let valid = if *dropped { "dropped" } else { "-" };
        let tracked = if *tracked { "" } else { "untracked" };
        write!(
            f,
            "{frame:4} {speed:6.6} {distance_since_valid:6.6} {ate:6.6} {valid:>10} {tracked:>10}"
        )
    }
}
