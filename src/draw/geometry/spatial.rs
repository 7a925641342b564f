//! R-tree spatial index over tessellated regions
//!
//! Bounds live in projected-but-untransformed space, so one index serves every
//! pan/zoom state of a tier until the projection or the feature set changes.

use super::types::{Bounds, Point, Tessellation};
use rstar::{RTree, RTreeObject, AABB};

/// One indexed region
#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub code: String,
    /// Index into the tier's tessellation list
    pub feature: usize,
    /// Insertion order, used to break ties between overlapping hits
    pub order: usize,
    pub bounds: AABB<[f64; 2]>,
}

impl IndexEntry {
    pub fn new(code: String, feature: usize, order: usize, bounds: &Bounds) -> Self {
        Self {
            code,
            feature,
            order,
            bounds: AABB::from_corners([bounds.min_x, bounds.min_y], [bounds.max_x, bounds.max_y]),
        }
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

impl rstar::PointDistance for IndexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.bounds.distance_2(point)
    }
}

/// Bounding-box index answering viewport culls and point hit-tests
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
}

impl SpatialIndex {
    /// Index every tessellation; the entry's `feature` is its position in the slice
    pub fn build(tessellations: &[Tessellation]) -> Self {
        let entries = tessellations
            .iter()
            .enumerate()
            .map(|(i, t)| IndexEntry::new(t.code.clone(), i, i, &t.bounds))
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Entries whose bounds intersect `rect`, in insertion order
    pub fn cull(&self, rect: &Bounds) -> Vec<&IndexEntry> {
        let envelope = AABB::from_corners([rect.min_x, rect.min_y], [rect.max_x, rect.max_y]);
        let mut hits: Vec<&IndexEntry> = self.tree.locate_in_envelope_intersecting(&envelope).collect();
        hits.sort_by_key(|e| e.order);
        hits
    }

    /// The first (by insertion order) entry whose triangles contain `point`
    pub fn hit_test<'a>(&'a self, point: Point, tessellations: &[Tessellation]) -> Option<&'a IndexEntry> {
        self.hit_test_filtered(point, tessellations, |_| true)
    }

    /// Like `hit_test`, considering only entries accepted by `keep`
    pub fn hit_test_filtered<'a>(
        &'a self,
        point: Point,
        tessellations: &[Tessellation],
        keep: impl Fn(&IndexEntry) -> bool,
    ) -> Option<&'a IndexEntry> {
        // Bounds are an over-approximation; confirm against the triangles
        self.tree
            .locate_all_at_point(&[point.x, point.y])
            .filter(|entry| keep(entry))
            .filter(|entry| {
                tessellations
                    .get(entry.feature)
                    .is_some_and(|t| t.contains(point))
            })
            .min_by_key(|entry| entry.order)
    }
}
