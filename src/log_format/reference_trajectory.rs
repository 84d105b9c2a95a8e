//! Ground truth camera trajectories of the ICL-NUIM datasets: per
//! line a frame number and 7 numbers (position and orientation
//! quaternion), space separated. Only the positions are used.

use std::path::Path;

use anyhow::Result;
use nalgebra::Vector3;

use super::{
    read_log_file,
    schema::{parse_float, Arity, FieldKind, LineMatch, Schema},
};
use crate::debug;

#[derive(Debug)]
pub struct ReferenceTrajectory {
    pub positions: Vec<Vector3<f64>>,
}

impl ReferenceTrajectory {
    pub fn schema() -> Schema {
        use FieldKind::*;
        let mut fields = vec![Int];
        fields.extend(std::iter::repeat(ScientificFloat).take(7));
        Schema::new(fields, Arity::AtLeast)
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        let contents = read_log_file(path)?;
        Self::parse(&contents, path)
    }

    /// `path` is only used for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let schema = Self::schema();
        let mut positions = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            let tokens = match schema.match_line(line) {
                LineMatch::Record(tokens) => tokens,
                LineMatch::Mismatch => {
                    debug!("end of reference data in {path:?} at line {}: {line:?}", i + 1);
                    break;
                }
            };
            let coordinate = |name: &str, token: &str| {
                parse_float(name, token).map_err(|e| e.at(path, i + 1))
            };
            positions.push(Vector3::new(
                coordinate("x", tokens[1])?,
                coordinate("y", tokens[2])?,
                coordinate("z", tokens[3])?,
            ));
        }
        Ok(Self { positions })
    }
}
