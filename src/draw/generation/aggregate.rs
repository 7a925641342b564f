//! Coarse tier: fine features grouped by coarse key, dissolved and summed

use super::dissolve::{dissolve_arcs, dissolve_rings};
use crate::dataset::Dataset;
use crate::draw::geometry::{Polygon, Shape};
use crate::draw::parsing::{ArcPolygon, Topology};
use crate::source::GeometryFeature;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One coarse region
#[derive(Debug, Clone)]
pub struct AggregateGroup {
    pub group_code: String,
    /// Dissolved outline of every member
    pub merged: Shape,
    /// Sum of member values present in the dataset
    pub total_value: f64,
    pub member_codes: BTreeSet<String>,
    /// Members in load order
    pub members: Vec<Arc<GeometryFeature>>,
}

impl AggregateGroup {
    pub fn has_data(&self) -> bool {
        self.total_value != 0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Every group, in first-seen order, including groups without data
    pub groups: IndexMap<String, AggregateGroup>,
}

impl Aggregation {
    pub fn build<'a>(features: impl IntoIterator<Item = &'a Arc<GeometryFeature>>, dataset: &Dataset) -> Self {
        let mut buckets: IndexMap<String, Vec<Arc<GeometryFeature>>> = IndexMap::new();
        for feature in features {
            buckets
                .entry(feature.group_code.clone())
                .or_default()
                .push(Arc::clone(feature));
        }

        let mut groups = IndexMap::with_capacity(buckets.len());
        for (group_code, members) in buckets {
            let refs: Vec<&GeometryFeature> = members.iter().map(|m| m.as_ref()).collect();
            let Some(merged) = dissolve_features(&refs) else {
                tracing::debug!("[Aggregator] group '{}' has no polygons", group_code);
                continue;
            };
            let total_value = members.iter().filter_map(|m| dataset.get(&m.code)).sum();
            let member_codes = members.iter().map(|m| m.code.clone()).collect();
            groups.insert(
                group_code.clone(),
                AggregateGroup { group_code, merged, total_value, member_codes, members },
            );
        }

        tracing::debug!("[Aggregator] {} group(s) built", groups.len());
        Self { groups }
    }

    pub fn get(&self, group_code: &str) -> Option<&AggregateGroup> {
        self.groups.get(group_code)
    }

    /// Groups drawn in the coarse tier: those with a non-zero total
    pub fn render_groups(&self) -> impl Iterator<Item = &AggregateGroup> {
        self.groups.values().filter(|g| g.has_data())
    }

    /// Non-zero totals, the coarse tier's color domain
    pub fn totals(&self) -> Vec<f64> {
        self.render_groups().map(|g| g.total_value).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Merge features into one seam-free shape.
///
/// A single member is returned as is. Members sharing a topology document are
/// dissolved over its arcs; anything else falls back to edge matching, and the
/// parts of several documents are edge-matched against each other. When every
/// edge cancels (members stacked on each other) the member polygons are kept
/// as they are, so a non-empty member list always yields a shape.
pub fn dissolve_features(members: &[&GeometryFeature]) -> Option<Shape> {
    match members {
        [] => return None,
        [single] => return Some(single.shape.clone()),
        _ => {}
    }

    let mut documents: Vec<(&Arc<Topology>, Vec<&[ArcPolygon]>)> = Vec::new();
    let mut loose: Vec<&Shape> = Vec::new();
    for member in members {
        match &member.topology {
            Some(topo) => match documents.iter_mut().find(|(doc, _)| Arc::ptr_eq(doc, &topo.document)) {
                Some((_, arcs)) => arcs.push(topo.arc_polygons()),
                None => documents.push((&topo.document, vec![topo.arc_polygons()])),
            },
            None => loose.push(&member.shape),
        }
    }

    let parts: Vec<Shape> = documents
        .iter()
        .filter_map(|(document, arcs)| Shape::from_polygons(dissolve_arcs(document, arcs)))
        .collect();
    let polygons = match (parts.as_slice(), loose.is_empty()) {
        ([single], true) => single.polygons().to_vec(),
        _ => {
            let mut shapes: Vec<&Shape> = parts.iter().collect();
            shapes.extend(loose);
            dissolve_rings(&shapes)
        }
    };

    if polygons.is_empty() {
        tracing::debug!("[Aggregator] {} member(s) cancelled out; keeping them undissolved", members.len());
        let stacked: Vec<Polygon> = members.iter().flat_map(|m| m.shape.polygons().iter().cloned()).collect();
        return Shape::from_polygons(stacked);
    }
    Shape::from_polygons(polygons)
}
