//! Parsers for the logs written by the KFusion benchmark and for the
//! ICL-NUIM ground truth trajectories.

pub mod buffer_log;
pub mod kernel_log;
pub mod position_log;
pub mod reference_trajectory;
pub mod schema;

use std::path::Path;

use anyhow::Result;

use crate::ctx;

/// The logs are small; read them completely.
pub fn read_log_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(ctx!("reading log file {path:?}"))
}
