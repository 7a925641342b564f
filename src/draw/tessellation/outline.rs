//! Line-segment buffers for border overlays
//!
//! Borders are stroked from their own buffers so they stay put when the fill
//! tier switches. Layout is x0, y0, x1, y1 per segment.

use super::polygon::clean_ring;
use crate::draw::geometry::{Point, Shape};
use std::collections::HashSet;

/// Every ring edge of a shape, closing edges included
pub fn outline_segments(shape: &Shape) -> Vec<f32> {
    let mut segments = Vec::new();
    for ring in shape.rings() {
        let Some(points) = clean_ring(ring) else { continue };
        for (i, a) in points.iter().enumerate() {
            push_segment(&mut segments, *a, points[(i + 1) % points.len()]);
        }
    }
    segments
}

/// Edges of many shapes with borders shared by neighbours emitted once
pub fn border_segments<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Vec<f32> {
    let mut seen: HashSet<[u64; 4]> = HashSet::new();
    let mut segments = Vec::new();
    for shape in shapes {
        for ring in shape.rings() {
            let Some(points) = clean_ring(ring) else { continue };
            for (i, &a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if seen.insert(edge_key(a, b)) {
                    push_segment(&mut segments, a, b);
                }
            }
        }
    }
    segments
}

fn push_segment(segments: &mut Vec<f32>, a: Point, b: Point) {
    segments.extend_from_slice(&[a.x as f32, a.y as f32, b.x as f32, b.y as f32]);
}

fn edge_key(a: Point, b: Point) -> [u64; 4] {
    let ka = [(a.x + 0.0).to_bits(), (a.y + 0.0).to_bits()];
    let kb = [(b.x + 0.0).to_bits(), (b.y + 0.0).to_bits()];
    if ka <= kb {
        [ka[0], ka[1], kb[0], kb[1]]
    } else {
        [kb[0], kb[1], ka[0], ka[1]]
    }
}
