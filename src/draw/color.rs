//! Value-to-color mapping
//!
//! The scale is a pure function of its input values: building it twice from the
//! same values gives the same thresholds and colors. Binning is equal-width over
//! `[min, max]` unless the distribution looks skewed, in which case thresholds
//! sit at quantiles so each color covers a similar number of regions.

use crate::draw::geometry::Color;
use serde::Serialize;

/// `|mean - median| / |median|` above this is skewed
pub const SKEW_RATIO: f64 = 0.5;
/// `IQR / |median|` above this is skewed
pub const IQR_RATIO: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// No values: everything is neutral
    Empty,
    EqualWidth,
    Quantile,
}

/// Summary statistics of a domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DomainStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

impl DomainStats {
    /// `sorted` must be non-empty and ascending
    fn from_sorted(sorted: &[f64]) -> Self {
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        DomainStats {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            median: quantile(sorted, 0.5),
            q1: quantile(sorted, 0.25),
            q3: quantile(sorted, 0.75),
        }
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn is_skewed(&self) -> bool {
        let median = self.median.abs();
        if median == 0.0 {
            return self.mean != 0.0 || self.iqr() != 0.0;
        }
        (self.mean - self.median).abs() / median > SKEW_RATIO || self.iqr() / median > IQR_RATIO
    }
}

/// One legend bucket: values in `[lower, upper)` get `color` (the last bucket is closed)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: Color,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    mode: ScaleMode,
    stats: Option<DomainStats>,
    thresholds: Vec<f64>,
    palette: Vec<Color>,
    neutral: Color,
}

impl ColorScale {
    /// Build from a domain; non-finite values are ignored
    pub fn new(values: impl IntoIterator<Item = f64>, palette: Vec<Color>, neutral: Color) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        if sorted.is_empty() || palette.is_empty() {
            return Self { mode: ScaleMode::Empty, stats: None, thresholds: Vec::new(), palette, neutral };
        }

        let stats = DomainStats::from_sorted(&sorted);
        let k = palette.len();
        let (mode, mut thresholds) = if stats.is_skewed() {
            let t: Vec<f64> = (1..k).map(|i| quantile(&sorted, i as f64 / k as f64)).collect();
            (ScaleMode::Quantile, t)
        } else {
            let step = (stats.max - stats.min) / k as f64;
            let t: Vec<f64> = (1..k).map(|i| stats.min + step * i as f64).collect();
            (ScaleMode::EqualWidth, t)
        };
        // Constant domains and tied quantiles collapse buckets
        thresholds.retain(|&t| t > stats.min && t <= stats.max);
        thresholds.dedup();

        Self { mode, stats: Some(stats), thresholds, palette, neutral }
    }

    /// Palette index for `v`, `None` for a non-finite value or an empty scale
    pub fn bucket(&self, v: f64) -> Option<usize> {
        if self.mode == ScaleMode::Empty || !v.is_finite() {
            return None;
        }
        let index = self.thresholds.iter().take_while(|&&t| t <= v).count();
        Some(index.min(self.palette.len() - 1))
    }

    pub fn color_for(&self, v: f64) -> Color {
        self.bucket(v).map(|i| self.palette[i]).unwrap_or(self.neutral)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let Some(stats) = self.stats else {
            return Vec::new();
        };
        let mut edges = Vec::with_capacity(self.thresholds.len() + 2);
        edges.push(stats.min);
        edges.extend_from_slice(&self.thresholds);
        edges.push(stats.max);
        edges
            .windows(2)
            .enumerate()
            .map(|(i, w)| LegendEntry { color: self.palette[i.min(self.palette.len() - 1)], lower: w[0], upper: w[1] })
            .collect()
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn stats(&self) -> Option<&DomainStats> {
        self.stats.as_ref()
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn neutral(&self) -> Color {
        self.neutral
    }
}

/// Linear-interpolation quantile of an ascending, non-empty slice
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
