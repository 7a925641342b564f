//! Input records: one numeric value per fine code

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One input record per fine-grained region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDatum {
    pub code: String,
    pub value: f64,
}

impl RegionDatum {
    pub fn new(code: impl Into<String>, value: f64) -> Self {
        Self { code: code.into(), value }
    }
}

/// Validated dataset: unique trimmed codes with finite values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    values: IndexMap<String, f64>,
}

impl Dataset {
    /// Later duplicates overwrite earlier ones; blank codes and non-finite values are dropped
    pub fn from_records(records: impl IntoIterator<Item = RegionDatum>) -> Self {
        let mut values = IndexMap::new();
        let (mut duplicates, mut dropped) = (0usize, 0usize);
        for record in records {
            let code = record.code.trim();
            if code.is_empty() || !record.value.is_finite() {
                dropped += 1;
                continue;
            }
            if values.insert(code.to_string(), record.value).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 || dropped > 0 {
            tracing::debug!("[Dataset] {} duplicate code(s), {} invalid record(s) dropped", duplicates, dropped);
        }
        Self { values }
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.values.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.values.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
