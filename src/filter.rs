use std::collections::HashSet;

use crate::model::{DEFAULT_METRICS, EnrichedRecord, PERIOD_ALL};

/// Keeps full-match rows. When no row carries a period at all the input is returned untouched.
pub fn filter_full_match(records: Vec<EnrichedRecord>) -> Vec<EnrichedRecord> {
    if records.iter().all(|r| r.period.is_none()) {
        return records;
    }
    records
        .into_iter()
        .filter(|r| r.period.as_deref() == Some(PERIOD_ALL))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSet(HashSet<String>);

impl MetricSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            names
                .into_iter()
                .map(Into::into)
                .map(|name: String| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    /// `;`-separated, since metric names may contain commas.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(';'))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Names in a stable order for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS.iter().copied())
    }
}

pub fn select_metrics(records: Vec<EnrichedRecord>, metrics: &MetricSet) -> Vec<EnrichedRecord> {
    records
        .into_iter()
        .filter(|r| r.name.as_deref().is_some_and(|name| metrics.contains(name)))
        .collect()
}
