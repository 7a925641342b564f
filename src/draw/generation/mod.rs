//! Scene generation for the two LOD tiers
//!
//! This module turns loaded features into GPU-ready geometry: the fine tier
//! (one tessellation per code), the coarse tier (one per dissolved group with
//! data), their spatial indexes and the overlay segment buffers. Everything
//! here is in projected space and is rebuilt whenever the feature set, the
//! dataset or the projection changes.
//!
//! # Submodules
//! - `dissolve` - seam-free boundary merging over topology arcs or edges
//! - `aggregate` - grouping by coarse key and value totals

mod dissolve;
mod aggregate;

use crate::dataset::Dataset;
use crate::draw::color::ColorScale;
use crate::draw::geometry::{Bounds, Point, Projection, Shape, SpatialIndex, Tessellation};
use crate::draw::tessellation::{border_segments, outline_segments, tessellate_all};
use crate::source::GeometryFeature;
use crate::view::{Hit, HitTarget};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub use dissolve::{dissolve_arcs, dissolve_rings};
pub use aggregate::{AggregateGroup, Aggregation, dissolve_features};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LodTier {
    Fine,
    Coarse,
}

/// Tessellations of one tier and their index
#[derive(Debug, Default)]
pub struct Tier {
    pub tessellations: Vec<Tessellation>,
    /// Group code of each tessellation
    pub groups: Vec<String>,
    pub index: SpatialIndex,
}

impl Tier {
    fn new(tessellations: Vec<Tessellation>, groups: Vec<String>) -> Self {
        let index = SpatialIndex::build(&tessellations);
        Self { tessellations, groups, index }
    }

    pub fn len(&self) -> usize {
        self.tessellations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tessellations.is_empty()
    }

    fn hit(&self, point: Point, keep: impl Fn(&str) -> bool) -> Option<Hit> {
        self.index
            .hit_test_filtered(point, &self.tessellations, |entry| {
                self.groups.get(entry.feature).is_some_and(|g| keep(g.as_str()))
            })
            .map(|entry| Hit { code: entry.code.clone(), group_code: self.groups[entry.feature].clone() })
    }
}

/// Everything the scene is built from
pub struct SceneInput<'a> {
    pub features: &'a [Arc<GeometryFeature>],
    pub aggregation: &'a Aggregation,
    /// Subdivision outer boundaries
    pub outlines: Vec<&'a Shape>,
    pub dataset: &'a Dataset,
    pub fine_scale: &'a ColorScale,
    pub coarse_scale: &'a ColorScale,
    pub projection: Projection,
    pub lod_threshold: f64,
}

#[derive(Debug)]
pub struct Scene {
    pub projection: Projection,
    pub lod_threshold: f64,
    pub fine: Tier,
    pub coarse: Tier,
    /// Fine tessellation indices per group
    members: HashMap<String, Vec<usize>>,
    /// Projected bounds of every group's merged shape
    group_bounds: HashMap<String, Bounds>,
    /// Region borders (x0, y0, x1, y1 per segment)
    pub borders: Vec<f32>,
    /// Subdivision outer boundaries
    pub outlines: Vec<f32>,
}

impl Scene {
    pub fn empty(projection: Projection, lod_threshold: f64) -> Self {
        Self {
            projection,
            lod_threshold,
            fine: Tier::default(),
            coarse: Tier::default(),
            members: HashMap::new(),
            group_bounds: HashMap::new(),
            borders: Vec::new(),
            outlines: Vec::new(),
        }
    }

    pub fn build(input: SceneInput<'_>) -> Self {
        let projection = input.projection;
        let neutral = input.fine_scale.neutral();

        let projected: Vec<Shape> = input.features.iter().map(|f| projection.project_shape(&f.shape)).collect();
        let fine_items: Vec<(String, Shape, _)> = input
            .features
            .iter()
            .zip(&projected)
            .map(|(f, shape)| {
                let color = input
                    .dataset
                    .get(&f.code)
                    .map(|v| input.fine_scale.color_for(v))
                    .unwrap_or(neutral);
                (f.code.clone(), shape.clone(), color)
            })
            .collect();
        let fine_tess = tessellate_all(&fine_items);

        let group_of: HashMap<&str, &str> =
            input.features.iter().map(|f| (f.code.as_str(), f.group_code.as_str())).collect();
        let fine_groups: Vec<String> = fine_tess
            .iter()
            .map(|t| group_of.get(t.code.as_str()).copied().unwrap_or(t.code.as_str()).to_string())
            .collect();
        let mut members: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, group) in fine_groups.iter().enumerate() {
            members.entry(group.clone()).or_default().push(i);
        }

        let mut group_bounds = HashMap::new();
        let mut coarse_items = Vec::new();
        for group in input.aggregation.groups.values() {
            let merged = projection.project_shape(&group.merged);
            if let Some(bounds) = merged.bounds() {
                group_bounds.insert(group.group_code.clone(), bounds);
            }
            if group.has_data() {
                let color = input.coarse_scale.color_for(group.total_value);
                coarse_items.push((group.group_code.clone(), merged, color));
            }
        }
        let coarse_tess = tessellate_all(&coarse_items);
        let coarse_groups: Vec<String> = coarse_tess.iter().map(|t| t.code.clone()).collect();

        let borders = border_segments(&projected);
        let outlines: Vec<f32> = input
            .outlines
            .iter()
            .flat_map(|shape| outline_segments(&projection.project_shape(shape)))
            .collect();

        tracing::debug!(
            "[Scene] fine {} / coarse {} tessellation(s), {} border segment(s)",
            fine_tess.len(),
            coarse_tess.len(),
            borders.len() / 4
        );

        Self {
            projection,
            lod_threshold: input.lod_threshold,
            fine: Tier::new(fine_tess, fine_groups),
            coarse: Tier::new(coarse_tess, coarse_groups),
            members,
            group_bounds,
            borders,
            outlines,
        }
    }

    pub fn lod_for(&self, scale: f64) -> LodTier {
        if scale >= self.lod_threshold {
            LodTier::Fine
        } else {
            LodTier::Coarse
        }
    }

    pub fn tier(&self, lod: LodTier) -> &Tier {
        match lod {
            LodTier::Fine => &self.fine,
            LodTier::Coarse => &self.coarse,
        }
    }

    /// Fine tessellation indices belonging to `group_code`
    pub fn members_of(&self, group_code: &str) -> &[usize] {
        self.members.get(group_code).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl HitTarget for Scene {
    fn hit(&self, point: Point, scale: f64, selected_group: Option<&str>) -> Option<Hit> {
        // The drilled-into group's fine regions are drawn on top
        if let Some(selected) = selected_group {
            if let Some(hit) = self.fine.hit(point, |g| g == selected) {
                return Some(hit);
            }
        }
        self.tier(self.lod_for(scale)).hit(point, |_| true)
    }

    fn group_bounds(&self, group_code: &str) -> Option<Bounds> {
        self.group_bounds.get(group_code).copied()
    }
}
