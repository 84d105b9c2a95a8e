//! The per-frame benchmark log of KFusion: a header line with the
//! column names, then per frame the frame number, the timings of the
//! pipeline stages, the computation and total times, the estimated
//! camera position (X, Y, Z) and the `tracked` and `integrated` flags.
//! The data ends at the first line that does not have that shape.

use std::path::Path;

use anyhow::Result;
use kstring::KString;
use nalgebra::Vector3;

use super::{
    read_log_file,
    schema::{parse_flag, parse_float, parse_int, Arity, FieldKind, LineMatch, Schema},
};
use crate::{debug, series::NamedSeries};

/// Frame number, position (3) and flags (2).
const NON_TIMING_COLUMNS: usize = 6;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("the log file is empty, missing the header line")]
    MissingHeader,
    #[error(
        "the header line has {0} columns, need at least {NON_TIMING_COLUMNS} \
         (frame, X, Y, Z, tracked, integrated)"
    )]
    HeaderTooShort(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    pub frame: u64,
    /// All columns converted to f64, in header order (includes the
    /// frame number, position and flags).
    pub values: Vec<f64>,
    pub position: Vector3<f64>,
    pub tracked: bool,
    pub integrated: bool,
}

#[derive(Debug)]
pub struct PositionLog {
    /// Column names, trimmed.
    pub headers: Vec<KString>,
    pub records: Vec<PositionRecord>,
}

impl PositionLog {
    /// The schema for data lines following a header with `ncolumns`
    /// names.
    pub fn schema(ncolumns: usize) -> Result<Schema, SchemaError> {
        use FieldKind::*;
        let ntimings = ncolumns
            .checked_sub(NON_TIMING_COLUMNS)
            .ok_or(SchemaError::HeaderTooShort(ncolumns))?;
        let mut fields = vec![Int];
        fields.extend(std::iter::repeat(UnsignedFloat).take(ntimings));
        fields.extend([SignedFloat, SignedFloat, SignedFloat, Flag, Flag]);
        Ok(Schema::new(fields, Arity::Exact))
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        let contents = read_log_file(path)?;
        Self::parse(&contents, path)
    }

    /// `path` is only used for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let mut lines = contents.lines();
        let header = lines.next().ok_or(SchemaError::MissingHeader)?;
        let headers: Vec<KString> = header
            .split('\t')
            .map(|name| KString::from_ref(name.trim()))
            .collect();
        let schema = Self::schema(headers.len())?;
        let n = headers.len();

        let mut records = Vec::new();
        for (i, line) in lines.enumerate() {
            let lineno = i + 2;
            let tokens = match schema.match_line(line) {
                LineMatch::Record(tokens) => tokens,
                LineMatch::Mismatch => {
                    debug!("end of data in {path:?} at line {lineno}: {line:?}");
                    break;
                }
            };
            let at = |e: super::schema::FieldParseError| e.at(path, lineno);
            let frame = parse_int(&headers[0], tokens[0]).map_err(at)?;
            let values = headers
                .iter()
                .zip(&tokens)
                .map(|(name, token)| parse_float(name, token))
                .collect::<Result<Vec<f64>, _>>()
                .map_err(at)?;
            let position = Vector3::new(values[n - 5], values[n - 4], values[n - 3]);
            records.push(PositionRecord {
                frame,
                values,
                position,
                tracked: parse_flag(tokens[n - 2]),
                integrated: parse_flag(tokens[n - 1]),
            });
        }
        Ok(Self { headers, records })
    }

    /// One series per column.
    pub fn series(&self) -> NamedSeries {
        let mut series = NamedSeries::new();
        for name in &self.headers {
            series.declare(name);
        }
        for record in &self.records {
            for (name, value) in self.headers.iter().zip(&record.values) {
                series.push(name, *value);
            }
        }
        series
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const HEADER: &str = "frame\tacquisition\tpreprocess_mm2meters\tpreprocess_bilateralFilter\t\
        track_halfSample\ttrack_depth2vertex\ttrack_vertex2normal\ttrack_track\ttrack_reduce\t\
        integrate\traycast\trenderDepth\trenderTrack\trenderVolume\tcomputation\ttotal    \t\
        X          \tY          \tZ         \ttracked   \tintegrated";

    /// A data line as the benchmark writes it, all 15 timings set to
    /// `t`.
    pub fn line(frame: u64, t: f64, pos: [f64; 3], tracked: u8, integrated: u8) -> String {
        let timings: Vec<String> = (0..15).map(|_| format!("{t:.6}")).collect();
        format!(
            "{frame}\t{}\t{:.6}\t{:.6}\t{:.6}\t{tracked}        \t{integrated}",
            timings.join("\t"),
            pos[0],
            pos[1],
            pos[2]
        )
    }

    #[test]
    fn t_schema() {
        assert_eq!(PositionLog::schema(21).unwrap().len(), 21);
        assert_eq!(PositionLog::schema(6).unwrap().len(), 6);
        assert_eq!(
            PositionLog::schema(5).err(),
            Some(SchemaError::HeaderTooShort(5))
        );
    }

    #[test]
    fn t_parse() {
        let contents = format!(
            "{HEADER}\n{}\n{}\nSummary: 2 frames\n{}\n",
            line(0, 0.001, [0.5, -0.25, 1.0], 0, 1),
            line(1, 0.002, [0.75, 0.0, -1.0], 1, 1),
            line(2, 0.002, [0.0, 0.0, 0.0], 1, 1),
        );
        let log = PositionLog::parse(&contents, Path::new("pos.log")).unwrap();
        assert_eq!(log.headers.len(), 21);
        assert_eq!(log.headers[15].as_str(), "total");
        assert_eq!(log.headers[20].as_str(), "integrated");
        // stops at the summary line
        assert_eq!(log.records.len(), 2);
        let r = &log.records[0];
        assert_eq!(r.frame, 0);
        assert_eq!(r.position, Vector3::new(0.5, -0.25, 1.0));
        assert!(!r.tracked);
        assert!(r.integrated);
        assert_eq!(r.values.len(), 21);
        assert_eq!(r.values[1], 0.001);

        let series = log.series();
        assert_eq!(series.len(), 21);
        assert_eq!(series.get("total"), Some(&[0.001, 0.002][..]));
        assert_eq!(series.get("X"), Some(&[0.5, 0.75][..]));
    }

    #[test]
    fn t_negative_timing_ends_data() {
        let contents = format!(
            "{HEADER}\n{}\n{}\n",
            line(0, 0.001, [0.0; 3], 1, 1),
            line(1, -0.001, [0.0; 3], 1, 1),
        );
        let log = PositionLog::parse(&contents, Path::new("pos.log")).unwrap();
        assert_eq!(log.records.len(), 1);
    }

    #[test]
    fn t_malformed_number_is_fatal() {
        let bad = line(1, 0.001, [0.0; 3], 1, 1).replacen("0.001000", "0.0.1", 1);
        let contents = format!("{HEADER}\n{}\n{bad}\n", line(0, 0.001, [0.0; 3], 1, 1));
        let e = PositionLog::parse(&contents, Path::new("pos.log"))
            .err()
            .unwrap();
        let msg = format!("{e:#}");
        assert!(msg.contains("pos.log\":3"), "{msg}");
        assert!(msg.contains("acquisition"), "{msg}");
    }

    #[test]
    fn t_empty_file() {
        let e = PositionLog::parse("", Path::new("pos.log")).err().unwrap();
        assert_eq!(
            e.downcast_ref::<SchemaError>(),
            Some(&SchemaError::MissingHeader)
        );
    }
}
