//! Kernel timing logs: one `name<TAB>nanoseconds` entry per line,
//! interleaved with other output of the benchmark, which is skipped.

use std::path::Path;

use anyhow::Result;
use kstring::KString;

use super::{
    read_log_file,
    schema::{parse_float, Arity, FieldKind, LineMatch, Schema},
};
use crate::{debug, report_config::ReportConfig, series::NamedSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct KernelTiming {
    pub name: KString,
    pub nanoseconds: f64,
}

#[derive(Debug)]
pub struct KernelLog {
    pub timings: Vec<KernelTiming>,
}

impl KernelLog {
    pub fn schema() -> Schema {
        Schema::new(vec![FieldKind::Name, FieldKind::UnsignedFloat], Arity::AtLeast)
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        let contents = read_log_file(path)?;
        Self::parse(&contents, path)
    }

    /// `path` is only used for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let schema = Self::schema();
        let mut timings = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            match schema.match_line(line) {
                LineMatch::Record(tokens) => {
                    let nanoseconds = parse_float(tokens[0], tokens[1]).map_err(|e| e.at(path, i + 1))?;
                    timings.push(KernelTiming {
                        name: KString::from_ref(tokens[0]),
                        nanoseconds,
                    });
                }
                LineMatch::Mismatch => debug!("skip kernel log line {}: {line:?}", i + 1),
            }
        }
        Ok(Self { timings })
    }

    /// The timings grouped by canonical kernel name.
    pub fn series(&self, config: &ReportConfig) -> NamedSeries {
        let mut series = NamedSeries::new();
        for KernelTiming { name, nanoseconds } in &self.timings {
            series.push(config.canonical_kernel_name(name), *nanoseconds);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_parse() {
        let log = KernelLog::parse(
            "k1\t5.0\nk1\t7.0\nsome other output\n\nk2\t10.0\n",
            Path::new("t.log"),
        )
        .unwrap();
        assert_eq!(log.timings.len(), 3);
        assert_eq!(
            log.timings[2],
            KernelTiming {
                name: "k2".into(),
                nanoseconds: 10.0
            }
        );
    }

    #[test]
    fn t_aliases() {
        let log = KernelLog::parse(
            "mm2metersKernel\t100\nmm2meters\t300\ntrackKernel\t2\n",
            Path::new("t.log"),
        )
        .unwrap();
        let series = log.series(&ReportConfig::default());
        assert_eq!(series.names().collect::<Vec<_>>(), vec!["mm2meters", "track"]);
        assert_eq!(series.get("mm2meters"), Some(&[100.0, 300.0][..]));
    }

    #[test]
    fn t_bad_number_is_fatal() {
        let e = KernelLog::parse("k1\t5.0\nk1\t1.2.3\n", Path::new("t.log"))
            .err()
            .unwrap();
        let msg = format!("{e:#}");
        assert!(msg.contains("t.log\":2"), "{msg}");
        assert!(msg.contains("1.2.3"), "{msg}");
    }
}
