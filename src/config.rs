//! Map configuration
//!
//! Hosts pass options as JSON; any field left out takes its default.

use crate::draw::geometry::{Color, ProjectionKind};
use crate::draw::parsing::{parse_hex_color, parse_palette};
use crate::source::CodeScheme;
use crate::view::ViewportTransform;
use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PALETTE: [&str; 7] = ["#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#b10026"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Fine tier is drawn at or above this scale
    pub lod_threshold: f64,
    pub initial_transform: Option<ViewportTransform>,
    /// Pointer travel (px) below which a press-release is a click
    pub click_threshold: f64,
    pub animation_ms: f64,
    /// Scale factor per wheel delta unit: `factor = exp(-delta_y * sensitivity)`
    pub wheel_sensitivity: f64,
    /// Screen padding (px) around fitted extents and zoom targets
    pub padding: f64,
    pub projection: ProjectionKind,
    pub scheme: CodeScheme,
    /// Feature properties tried in order for the fine code
    pub code_properties: Vec<String>,
    pub palette: Vec<String>,
    pub neutral_color: String,
    pub highlight_color: String,
    pub border_color: String,
    pub outline_color: String,
    pub show_borders: bool,
    pub show_outline: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 25.0,
            lod_threshold: 4.0,
            initial_transform: None,
            click_threshold: 4.0,
            animation_ms: 750.0,
            wheel_sensitivity: 0.002,
            padding: 16.0,
            projection: ProjectionKind::default(),
            scheme: CodeScheme::default(),
            code_properties: vec!["code".to_string(), "ZCTA5CE10".to_string(), "GEOID10".to_string()],
            palette: DEFAULT_PALETTE.iter().map(|s| s.to_string()).collect(),
            neutral_color: "#d9d9d9".to_string(),
            highlight_color: "#3182bd".to_string(),
            border_color: "#ffffff80".to_string(),
            outline_color: "#404040".to_string(),
            show_borders: true,
            show_outline: true,
        }
    }
}

/// Parsed colors
#[derive(Debug, Clone, PartialEq)]
pub struct MapStyle {
    pub palette: Vec<Color>,
    pub neutral: Color,
    pub highlight: Color,
    pub border: Color,
    pub outline: Color,
}

impl MapOptions {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let options: MapOptions = serde_json::from_str(text).context("invalid map options")?;
        Ok(options.normalized())
    }

    /// Repair out-of-range values rather than reject them
    pub fn normalized(mut self) -> Self {
        let defaults = MapOptions::default();
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            self.min_scale = defaults.min_scale;
        }
        if !(self.max_scale.is_finite() && self.max_scale > 0.0) {
            self.max_scale = defaults.max_scale;
        }
        if self.min_scale > self.max_scale {
            std::mem::swap(&mut self.min_scale, &mut self.max_scale);
        }
        for (value, default) in [
            (&mut self.lod_threshold, defaults.lod_threshold),
            (&mut self.click_threshold, defaults.click_threshold),
            (&mut self.animation_ms, defaults.animation_ms),
            (&mut self.wheel_sensitivity, defaults.wheel_sensitivity),
            (&mut self.padding, defaults.padding),
        ] {
            if !(value.is_finite() && *value >= 0.0) {
                *value = default;
            }
        }
        if self.code_properties.is_empty() {
            self.code_properties = defaults.code_properties;
        }
        self
    }

    pub fn style(&self) -> MapStyle {
        let defaults = MapOptions::default();
        let color = |hex: &str, fallback: &str| {
            parse_hex_color(hex).or_else(|| {
                tracing::warn!("[Config] invalid color '{}', using {}", hex, fallback);
                parse_hex_color(fallback)
            })
            .unwrap_or([0.0, 0.0, 0.0, 1.0])
        };
        let mut palette = parse_palette(&self.palette);
        if palette.is_empty() {
            palette = parse_palette(&defaults.palette);
        }
        MapStyle {
            palette,
            neutral: color(&self.neutral_color, &defaults.neutral_color),
            highlight: color(&self.highlight_color, &defaults.highlight_color),
            border: color(&self.border_color, &defaults.border_color),
            outline: color(&self.outline_color, &defaults.outline_color),
        }
    }
}
