//! Hierarchical code schemes
//!
//! A fine code (a postal code) belongs to one subdivision, whose boundary file
//! holds its polygon, and to one coarse group identified by a fixed-length prefix.

use serde::{Deserialize, Serialize};

/// Inclusive numeric prefix range owned by one subdivision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdivisionRange {
    pub from: u32,
    pub to: u32,
    pub subdivision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeScheme {
    /// Subdivision is the first `subdivision_len` characters of the code
    Prefix { subdivision_len: usize, coarse_len: usize },
    /// Subdivision is looked up from the numeric value of the first `prefix_len` characters
    Ranges { prefix_len: usize, coarse_len: usize, ranges: Vec<SubdivisionRange> },
}

impl Default for CodeScheme {
    fn default() -> Self {
        CodeScheme::Prefix { subdivision_len: 2, coarse_len: 3 }
    }
}

impl CodeScheme {
    /// Key of the boundary file containing `code`, `None` if the code fits no subdivision
    pub fn subdivision(&self, code: &str) -> Option<String> {
        match self {
            CodeScheme::Prefix { subdivision_len, .. } => {
                if code.chars().count() < *subdivision_len || *subdivision_len == 0 {
                    return None;
                }
                Some(prefix(code, *subdivision_len))
            }
            CodeScheme::Ranges { prefix_len, ranges, .. } => {
                let head = prefix(code, *prefix_len);
                if head.chars().count() < *prefix_len {
                    return None;
                }
                let value: u32 = head.parse().ok()?;
                ranges
                    .iter()
                    .find(|r| r.from <= value && value <= r.to)
                    .map(|r| r.subdivision.clone())
            }
        }
    }

    /// Coarse group key; codes shorter than the key length are their own group
    pub fn coarse_key(&self, code: &str) -> String {
        prefix(code, self.coarse_len())
    }

    pub fn coarse_len(&self) -> usize {
        match self {
            CodeScheme::Prefix { coarse_len, .. } | CodeScheme::Ranges { coarse_len, .. } => *coarse_len,
        }
    }
}

fn prefix(code: &str, len: usize) -> String {
    code.chars().take(len).collect()
}
