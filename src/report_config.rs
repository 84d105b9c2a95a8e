//! Settings for the reports and the multi-run driver, loadable from
//! a config file; every field has a default so that an empty (or
//! missing) config file gives the behaviour the KFusion benchmark
//! Makefile expects.

use std::path::PathBuf;

use anyhow::Result;
use kstring::KString;
use serde::{Deserialize, Serialize};

use crate::{
    config_file::LoadConfigFile, csv_report::ReportKind, serde::regex::SerializableRegex,
};

/// Kernel name variations found in the logs of the different
/// platform implementations; the first entry of each group is the
/// name used in reports.
const DEFAULT_KERNEL_ALIASES: &[&[&str]] = &[
    &["mm2meters", "mm2metersKernel"],
    &["bilateral_filter", "bilateralFilterKernel"],
    &["halfSampleRobust", "halfSampleRobustImageKernel"],
    &["depth2vertex", "depth2vertexKernel"],
    &["vertex2normal", "vertex2normalKernel"],
    &["track", "trackKernel"],
    &["reduce", "reduceKernel"],
    &["integrate", "integrateKernel"],
    &["raycast", "raycastKernel"],
    &["renderDepth", "renderDepthKernel"],
    &["renderLight", "renderLightKernel"],
    &["renderTrack", "renderTrackKernel"],
    &["renderVolume", "renderVolumeKernel"],
    &["ResetVolume", "initVolumeKernel"],
    &["updatePose", "updatePoseKernel"],
];

/// Series with names matching this are positions, frame numbers or
/// flags: diagnostics, not summary statistics.
const DEFAULT_EXCLUDED_SERIES: &str = "X|Y|Z|frame|tracked|integrated";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Groups of kernel names that mean the same kernel; the first
    /// name of a group is the canonical one.
    pub kernel_aliases: Vec<Vec<KString>>,

    /// Series whose names match are left out of the position report.
    pub excluded_series: SerializableRegex,

    /// Time between two frames of the input sequence, for the speed
    /// diagnostics (the ICL-NUIM sequences are recorded at ~30 fps).
    pub frame_interval_secs: f64,

    /// Number of frames at the start of every run that are always
    /// untracked; they are not counted as untracked frames.
    pub untracked_warmup_frames: u32,

    /// Names in the CSV files that are not pipeline stages, thus not
    /// counted into the stage times by `make-run`.
    pub reserved_stage_names: Vec<KString>,

    /// Program and arguments to which `make-run` appends the target
    /// `{dataset}.{platform}.log`.
    pub build_command: Vec<String>,

    /// The reports whose CSV files `make-run` analyzes after the runs.
    pub analyzed_logs: Vec<ReportKind>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            kernel_aliases: DEFAULT_KERNEL_ALIASES
                .iter()
                .map(|group| group.iter().map(|s| KString::from_static(*s)).collect())
                .collect(),
            excluded_series: DEFAULT_EXCLUDED_SERIES
                .parse()
                .expect("default regex is valid"),
            frame_interval_secs: 0.0333,
            untracked_warmup_frames: 4,
            reserved_stage_names: vec![KString::from_static(ATE), KString::from_static("total")],
            build_command: vec!["make".into()],
            analyzed_logs: vec![ReportKind::Pos, ReportKind::Kernels],
        }
    }
}

/// Name of the absolute trajectory error series over all frames.
pub const ATE: &str = "ATE";

/// Name of the absolute trajectory error series over the frames for
/// which KFusion delivered a pose (i.e. excluding dropped frames).
pub const ATE_WRT_KFUSION: &str = "ATE_wrt_kfusion";

impl ReportConfig {
    /// The canonical name for a kernel name as found in a log.
    pub fn canonical_kernel_name<'s>(&'s self, name: &'s str) -> &'s str {
        self.kernel_aliases
            .iter()
            .find(|group| group.iter().any(|n| n.as_str() == name))
            .and_then(|group| group.first())
            .map(|n| n.as_str())
            .unwrap_or(name)
    }

    pub fn is_excluded_series(&self, name: &str) -> bool {
        self.excluded_series.is_match(name)
    }

    pub fn is_reserved_stage_name(&self, name: &str) -> bool {
        self.reserved_stage_names.iter().any(|n| n.as_str() == name)
    }
}

impl LoadConfigFile for ReportConfig {
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>> {
        Ok(std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".kfusion-bench")))
    }
}

#[cfg(test)]
mod tests {
    use crate::config_file::{save_config_file, ConfigBackend};
    use crate::io_utils::temporary_file::TemporaryFile;

    use super::*;

    #[test]
    fn t_canonical_kernel_name() {
        let config = ReportConfig::default();
        assert_eq!(config.canonical_kernel_name("mm2metersKernel"), "mm2meters");
        assert_eq!(config.canonical_kernel_name("mm2meters"), "mm2meters");
        assert_eq!(config.canonical_kernel_name("initVolumeKernel"), "ResetVolume");
        assert_eq!(config.canonical_kernel_name("someOtherKernel"), "someOtherKernel");
    }

    #[test]
    fn t_excluded_series() {
        let config = ReportConfig::default();
        for name in ["X", "Y", "Z", "frame", "tracked", "integrated"] {
            assert!(config.is_excluded_series(name), "{name}");
        }
        for name in ["acquisition", "track_track", "computation", "total", ATE] {
            assert!(!config.is_excluded_series(name), "{name}");
        }
    }

    #[test]
    fn t_partial_config_file() {
        let tmp = TemporaryFile::in_temp_dir("partial.json5");
        std::fs::write(
            tmp.path(),
            "{ frame_interval_secs: 0.05, build_command: ['make', '-j4'], analyzed_logs: ['buffers'] }",
        )
        .unwrap();
        let config: ReportConfig = ConfigBackend::Json5.load_config_file(tmp.path()).unwrap();
        assert_eq!(config.frame_interval_secs, 0.05);
        assert_eq!(config.build_command, vec!["make", "-j4"]);
        assert_eq!(config.untracked_warmup_frames, 4);
        assert_eq!(config.analyzed_logs, vec![ReportKind::Buffers]);
        assert!(config.is_reserved_stage_name("total"));
        assert!(config.is_reserved_stage_name(ATE));
        assert!(!config.is_reserved_stage_name(ATE_WRT_KFUSION));
    }

    #[test]
    fn t_save_and_load_ron() {
        let tmp = TemporaryFile::in_temp_dir("config.ron");
        let mut config = ReportConfig::default();
        config.untracked_warmup_frames = 2;
        config.excluded_series = "^frame$".parse().unwrap();
        save_config_file(tmp.path(), &config).unwrap();
        let loaded: ReportConfig =
            ReportConfig::load_config(Some(tmp.path()), |msg| panic!("{msg}")).unwrap();
        assert_eq!(loaded.untracked_warmup_frames, 2);
        assert_eq!(loaded.excluded_series, config.excluded_series);
        assert_eq!(loaded.kernel_aliases, config.kernel_aliases);
    }
}
