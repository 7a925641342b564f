//! Polygon tessellation using earcut algorithm
//!
//! Projected shapes are triangulated ring by ring into a non-indexed triangle
//! list. Degenerate rings are expected (islands collapsed by projection) and
//! are dropped quietly.

use crate::draw::geometry::{Bounds, Color, Point, Polygon, Shape, Tessellation};

/// Drop non-finite points, consecutive duplicates and the closing duplicate.
/// Returns `None` when fewer than 3 usable points remain.
pub fn clean_ring(ring: &[Point]) -> Option<Vec<Point>> {
    let mut points: Vec<Point> = Vec::with_capacity(ring.len());
    for &p in ring {
        if !p.is_finite() {
            continue;
        }
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    (points.len() >= 3).then_some(points)
}

/// Triangulate one polygon with its holes.
/// Returns x0, y0, x1, y1, x2, y2 per triangle; empty when the polygon is degenerate.
pub fn triangulate_polygon(polygon: &Polygon) -> Vec<f32> {
    let Some(exterior) = clean_ring(&polygon.exterior) else {
        return Vec::new();
    };

    // Build flat coordinate array for earcut
    let mut flat_coords: Vec<f64> = Vec::with_capacity(exterior.len() * 2);
    let mut hole_indices: Vec<usize> = Vec::new();
    for p in &exterior {
        flat_coords.push(p.x);
        flat_coords.push(p.y);
    }
    for hole in &polygon.holes {
        let Some(hole) = clean_ring(hole) else { continue };
        hole_indices.push(flat_coords.len() / 2);
        for p in &hole {
            flat_coords.push(p.x);
            flat_coords.push(p.y);
        }
    }

    let indices = match earcutr::earcut(&flat_coords, &hole_indices, 2) {
        Ok(indices) => indices,
        Err(e) => {
            tracing::trace!("[Tessellator] earcut failed on {} points: {:?}", flat_coords.len() / 2, e);
            return Vec::new();
        }
    };

    let mut vertices = Vec::with_capacity(indices.len() * 2);
    for i in indices {
        vertices.push(flat_coords[i * 2] as f32);
        vertices.push(flat_coords[i * 2 + 1] as f32);
    }
    vertices
}

/// Tessellate every part of a projected shape; `None` if nothing survives
pub fn tessellate_shape(code: &str, shape: &Shape, color: Color) -> Option<Tessellation> {
    let vertices: Vec<f32> = shape.polygons().iter().flat_map(triangulate_polygon).collect();
    if vertices.is_empty() {
        tracing::trace!("[Tessellator] '{}' has no usable rings", code);
        return None;
    }
    let bounds = Bounds::from_points(
        vertices
            .chunks_exact(2)
            .map(|v| Point::new(v[0] as f64, v[1] as f64)),
    )?;
    Some(Tessellation { code: code.to_string(), color, vertices, bounds })
}

/// Tessellate a batch, keeping input order and dropping degenerate entries
#[cfg(not(feature = "parallel"))]
pub fn tessellate_all(items: &[(String, Shape, Color)]) -> Vec<Tessellation> {
    items
        .iter()
        .filter_map(|(code, shape, color)| tessellate_shape(code, shape, *color))
        .collect()
}

/// Tessellate a batch, keeping input order and dropping degenerate entries
#[cfg(feature = "parallel")]
pub fn tessellate_all(items: &[(String, Shape, Color)]) -> Vec<Tessellation> {
    use rayon::prelude::*;

    // Use rayon to tessellate in parallel; collect preserves order
    let results: Vec<Option<Tessellation>> = items
        .par_iter()
        .map(|(code, shape, color)| tessellate_shape(code, shape, *color))
        .collect();
    results.into_iter().flatten().collect()
}
