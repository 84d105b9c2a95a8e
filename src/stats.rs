//! Simple statistics (count, minimum, maximum, mean and total) over
//! floating point series.

use std::borrow::Cow;

use crate::terminal_table::TableRow;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateStat {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    /// Always exactly `total / count`, not a running mean, so that
    /// reports are reproducible bit for bit.
    pub mean: f64,
    pub total: f64,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StatsError {
    #[error("no inputs given")]
    NoInputs,
    #[error("series contains NaN")]
    NaN,
}

impl AggregateStat {
    pub fn from_values(vals: &[f64]) -> Result<Self, StatsError> {
        let (first, rest) = vals.split_first().ok_or(StatsError::NoInputs)?;
        if vals.iter().any(|v| v.is_nan()) {
            return Err(StatsError::NaN);
        }
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(min, max), v| (min.min(*v), max.max(*v)));
        let total: f64 = vals.iter().sum();
        let count = vals.len();
        Ok(AggregateStat {
            count,
            min,
            max,
            mean: total / count as f64,
            total,
        })
    }
}

/// How to show the numbers of a stats row on the terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatsDisplay {
    /// Rounded to integers (kernel times in nanoseconds).
    Integer,
    /// With the given number of decimals.
    Decimals(usize),
}

impl StatsDisplay {
    pub fn format(self, v: f64) -> String {
        match self {
            StatsDisplay::Integer => format!("{v:.0}"),
            StatsDisplay::Decimals(n) => format!("{v:.n$}"),
        }
    }
}

/// A named `AggregateStat` as shown in the console summary.
pub struct StatsRow<'t> {
    pub name: &'t str,
    pub stat: &'t AggregateStat,
    pub show_count: bool,
    pub display: StatsDisplay,
}

impl<'t> StatsRow<'t> {
    pub fn titles(show_count: bool) -> Vec<&'static str> {
        if show_count {
            vec!["Name", "Count", "Min", "Max", "Mean", "Total"]
        } else {
            vec!["Name", "Min", "Max", "Mean", "Total"]
        }
    }
}

impl<'t> TableRow for StatsRow<'t> {
    fn table_row(&self) -> Vec<Cow<'_, str>> {
        let Self {
            name,
            stat,
            show_count,
            display,
        } = self;
        let mut row: Vec<Cow<str>> = vec![(*name).into()];
        if *show_count {
            row.push(stat.count.to_string().into());
        }
        row.push(display.format(stat.min).into());
        row.push(display.format(stat.max).into());
        // Mean is always shown with decimals
        row.push(format!("{:.6}", stat.mean).into());
        row.push(display.format(stat.total).into());
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_from_values() {
        let s = AggregateStat::from_values(&[5.0, 7.0]).unwrap();
        assert_eq!(
            s,
            AggregateStat {
                count: 2,
                min: 5.0,
                max: 7.0,
                mean: 6.0,
                total: 12.0
            }
        );
        let s = AggregateStat::from_values(&[10.0]).unwrap();
        assert_eq!((s.count, s.min, s.max, s.mean, s.total), (1, 10.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn t_errors() {
        assert_eq!(AggregateStat::from_values(&[]), Err(StatsError::NoInputs));
        assert_eq!(
            AggregateStat::from_values(&[1.0, f64::NAN]),
            Err(StatsError::NaN)
        );
    }

    #[test]
    fn t_mean_is_total_by_count() {
        let series: &[&[f64]] = &[
            &[0.1, 0.2, 0.3],
            &[1e-9, 3.5e6, -2.0, 0.0],
            &[0.25; 8],
            &[-1.0, -1.0, -0.5],
        ];
        for vals in series {
            let s = AggregateStat::from_values(vals).unwrap();
            assert_eq!(s.mean, s.total / s.count as f64);
            assert!(s.min <= s.mean && s.mean <= s.max, "{vals:?}: {s:?}");
        }
    }

    #[test]
    fn t_stats_row() {
        let stat = AggregateStat::from_values(&[5.0, 7.0]).unwrap();
        let row = StatsRow {
            name: "k1",
            stat: &stat,
            show_count: true,
            display: StatsDisplay::Integer,
        };
        assert_eq!(
            row.table_row(),
            vec!["k1", "2", "5", "7", "6.000000", "12"]
        );
        assert_eq!(StatsRow::titles(true).len(), row.table_row().len());
        assert_eq!(StatsRow::titles(false).len(), 5);
    }
}
