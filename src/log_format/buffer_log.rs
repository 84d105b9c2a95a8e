//! Buffer transfer logs: one line per host/device transfer,
//! `kernel op level iteration size-bytes time-seconds`. Other lines
//! are skipped.

use std::path::Path;

use anyhow::Result;
use kstring::KString;

use super::{
    read_log_file,
    schema::{parse_float, parse_int, Arity, FieldKind, FieldParseError, LineMatch, Schema},
};
use crate::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct BufferTransfer {
    pub kernel: KString,
    /// "read" or "write"
    pub operation: KString,
    pub level: u64,
    pub iteration: u64,
    pub size_bytes: u64,
    pub seconds: f64,
}

impl BufferTransfer {
    /// Bytes per second. Infinite for a transfer logged with a time
    /// of 0.
    pub fn bandwidth(&self) -> f64 {
        self.size_bytes as f64 / self.seconds
    }
}

#[derive(Debug)]
pub struct BufferLog {
    pub transfers: Vec<BufferTransfer>,
}

impl BufferLog {
    pub fn schema() -> Schema {
        use FieldKind::*;
        Schema::new(
            vec![Word, Word, Int, Int, Int, UnsignedFloat],
            Arity::AtLeast,
        )
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        let contents = read_log_file(path)?;
        Self::parse(&contents, path)
    }

    /// `path` is only used for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let schema = Self::schema();
        let mut transfers = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            match schema.match_line(line) {
                LineMatch::Record(tokens) => {
                    let parse = || -> Result<BufferTransfer, FieldParseError> {
                        Ok(BufferTransfer {
                            kernel: KString::from_ref(tokens[0]),
                            operation: KString::from_ref(tokens[1]),
                            level: parse_int("level", tokens[2])?,
                            iteration: parse_int("iteration", tokens[3])?,
                            size_bytes: parse_int("size", tokens[4])?,
                            seconds: parse_float("time", tokens[5])?,
                        })
                    };
                    transfers.push(parse().map_err(|e| e.at(path, i + 1))?);
                }
                LineMatch::Mismatch => debug!("skip buffer log line {}: {line:?}", i + 1),
            }
        }
        Ok(Self { transfers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_parse() {
        let log = BufferLog::parse(
            "trackKernel\tread\t0\t3\t1048576\t0.002\n\
             # not an entry\n\
             integrate\twrite\t1\t0\t2048\t0.5\n",
            Path::new("buffers.log"),
        )
        .unwrap();
        assert_eq!(log.transfers.len(), 2);
        let t = &log.transfers[0];
        assert_eq!(t.kernel.as_str(), "trackKernel");
        assert_eq!(t.operation.as_str(), "read");
        assert_eq!((t.level, t.iteration, t.size_bytes), (0, 3, 1048576));
        assert_eq!(t.bandwidth(), 1048576.0 / 0.002);
        assert_eq!(log.transfers[1].bandwidth(), 4096.0);
    }

    #[test]
    fn t_names_must_be_alphanumeric() {
        let log = BufferLog::parse("track_kernel\tread\t0\t3\t10\t0.1\n", Path::new("b.log"))
            .unwrap();
        assert!(log.transfers.is_empty());
    }
}
