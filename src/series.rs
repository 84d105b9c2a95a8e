//! Named numeric series as collected from the logs, in name order.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use kstring::KString;

use crate::stats::AggregateStat;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NamedSeries {
    series: BTreeMap<KString, Vec<f64>>,
}

impl NamedSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: f64) {
        if let Some(vals) = self.series.get_mut(name) {
            vals.push(value);
        } else {
            self.series.insert(KString::from_ref(name), vec![value]);
        }
    }

    /// Replaces an existing series of the same name.
    pub fn insert(&mut self, name: &str, values: Vec<f64>) {
        self.series.insert(KString::from_ref(name), values);
    }

    /// Make sure a series exists even if no values are ever pushed
    /// to it.
    pub fn declare(&mut self, name: &str) {
        if !self.series.contains_key(name) {
            self.series.insert(KString::from_ref(name), Vec::new());
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Statistics for every series for which `keep` returns true, in
    /// name order. Fails for empty series.
    pub fn aggregate(&self, keep: impl Fn(&str) -> bool) -> Result<Vec<(KString, AggregateStat)>> {
        self.series
            .iter()
            .filter(|(name, _)| keep(name))
            .map(|(name, vals)| {
                let stat = AggregateStat::from_values(vals)
                    .map_err(|e| anyhow!("statistics for series {:?}: {e}", name.as_str()))?;
                Ok((name.clone(), stat))
            })
            .collect()
    }
}
