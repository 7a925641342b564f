//! Shared fixtures for the map scenarios

use choropleth::draw::geometry::{Point, ProjectionKind};
use choropleth::{ChoroplethMap, MapEvent, MapOptions, RecordingBackend};
use serde_json::json;
use std::sync::mpsc::Receiver;

/// Topology of unit squares in a row starting at x = 0; neighbours share their vertical arc
pub fn row_topology(codes: &[&str]) -> String {
    row_topology_at(codes, 0.0)
}

/// `row_topology` with the row starting at `x0`
pub fn row_topology_at(codes: &[&str], x0: f64) -> String {
    let n = codes.len() as i64;
    let mut arcs = Vec::new();
    for i in 0..=n {
        let x = x0 + i as f64;
        arcs.push(json!([[x, 0.0], [x, 1.0]]));
    }
    for i in 0..n {
        let x = x0 + i as f64;
        arcs.push(json!([[x, 0.0], [x + 1.0, 0.0]]));
    }
    for i in 0..n {
        let x = x0 + i as f64;
        arcs.push(json!([[x + 1.0, 1.0], [x, 1.0]]));
    }
    let geometries: Vec<_> = codes
        .iter()
        .zip(0..n)
        .map(|(code, i)| {
            let ring = [n + 1 + i, i + 1, 2 * n + 1 + i, !i];
            json!({ "type": "Polygon", "arcs": [ring], "properties": { "code": code } })
        })
        .collect();
    json!({
        "type": "Topology",
        "arcs": arcs,
        "objects": { "regions": { "type": "GeometryCollection", "geometries": geometries } }
    })
    .to_string()
}

pub fn planar_options() -> MapOptions {
    MapOptions { projection: ProjectionKind::Planar, ..MapOptions::default() }
}

pub fn recording_map(options: MapOptions) -> ChoroplethMap<RecordingBackend> {
    ChoroplethMap::new(options, || Ok(RecordingBackend::new()))
}

/// Screen position of an input-space point under the current view
pub fn screen_of(map: &ChoroplethMap<RecordingBackend>, p: Point) -> Point {
    map.transform().apply(map.project(p))
}

pub fn drain(events: &Receiver<MapEvent>) -> Vec<MapEvent> {
    events.try_iter().collect()
}
