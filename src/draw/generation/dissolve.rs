//! Boundary dissolution
//!
//! Merges adjacent polygons into one outline without internal seams. Pieces of
//! boundary used by two member rings are interior and cancel; the survivors are
//! stitched end to end into closed rings, which are then sorted into exteriors
//! and holes by winding.
//!
//! Two piece granularities share the stitcher:
//! - arcs, for members decoded from the same topology (exact and cheap)
//! - individual edges, for shapes that carry no topology

use crate::draw::geometry::{Point, Polygon, Ring, Shape, point_in_ring, signed_area};
use crate::draw::parsing::{ArcPolygon, Topology, decode_arc_ref};
use std::collections::HashMap;

/// Exact coordinate identity; shared topology vertices decode bit-identically
type PointKey = (u64, u64);

fn key(p: Point) -> PointKey {
    // +0.0 folds -0.0 into 0.0
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

/// A directed run of boundary points
struct Piece {
    points: Vec<Point>,
}

impl Piece {
    fn start(&self) -> PointKey {
        key(self.points[0])
    }

    fn end(&self) -> PointKey {
        key(self.points[self.points.len() - 1])
    }
}

/// Dissolve members of one topology, each given as its arc polygons
pub fn dissolve_arcs(topology: &Topology, members: &[&[ArcPolygon]]) -> Vec<Polygon> {
    let mut usage: HashMap<usize, usize> = HashMap::new();
    for polygons in members {
        for arc_ref in polygons.iter().flatten().flatten() {
            *usage.entry(decode_arc_ref(*arc_ref).0).or_insert(0) += 1;
        }
    }

    let mut pieces = Vec::new();
    let mut exterior_area = 0.0;
    for polygons in members {
        for rings in polygons.iter() {
            if let Some(exterior) = rings.first() {
                exterior_area += signed_area(&topology.ring_points(exterior));
            }
            for &arc_ref in rings.iter().flatten() {
                if usage.get(&decode_arc_ref(arc_ref).0).copied().unwrap_or(0) != 1 {
                    continue;
                }
                if let Some(points) = topology.arc_points(arc_ref).filter(|p| p.len() >= 2) {
                    pieces.push(Piece { points });
                }
            }
        }
    }

    assemble(stitch(pieces), exterior_area)
}

/// Dissolve arbitrary shapes edge by edge
pub fn dissolve_rings(shapes: &[&Shape]) -> Vec<Polygon> {
    let mut edges: Vec<(Point, Point)> = Vec::new();
    let mut exterior_area = 0.0;
    for shape in shapes {
        for polygon in shape.polygons() {
            exterior_area += signed_area(&polygon.exterior);
            for ring in std::iter::once(&polygon.exterior).chain(polygon.holes.iter()) {
                edges.extend(ring_edges(ring));
            }
        }
    }

    let mut usage: HashMap<(PointKey, PointKey), usize> = HashMap::new();
    for (a, b) in &edges {
        *usage.entry(undirected(*a, *b)).or_insert(0) += 1;
    }

    let pieces = edges
        .into_iter()
        .filter(|(a, b)| usage.get(&undirected(*a, *b)).copied().unwrap_or(0) == 1)
        .map(|(a, b)| Piece { points: vec![a, b] })
        .collect();

    assemble(stitch(pieces), exterior_area)
}

/// Closed-ring edges without zero-length segments
fn ring_edges(ring: &Ring) -> Vec<(Point, Point)> {
    let mut points: Vec<Point> = Vec::with_capacity(ring.len());
    for &p in ring {
        if points.last().map(|&q| key(q)) != Some(key(p)) {
            points.push(p);
        }
    }
    if points.len() > 1 && key(points[0]) == key(points[points.len() - 1]) {
        points.pop();
    }
    if points.len() < 3 {
        return Vec::new();
    }
    (0..points.len())
        .map(|i| (points[i], points[(i + 1) % points.len()]))
        .collect()
}

fn undirected(a: Point, b: Point) -> (PointKey, PointKey) {
    let (ka, kb) = (key(a), key(b));
    if ka <= kb { (ka, kb) } else { (kb, ka) }
}

/// Chain pieces end to start into closed rings
fn stitch(pieces: Vec<Piece>) -> Vec<Ring> {
    let mut by_start: HashMap<PointKey, Vec<usize>> = HashMap::new();
    for (i, piece) in pieces.iter().enumerate() {
        by_start.entry(piece.start()).or_default().push(i);
    }

    let mut used = vec![false; pieces.len()];
    let mut rings = Vec::new();
    for first in 0..pieces.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let origin = pieces[first].start();
        let mut ring: Ring = pieces[first].points.clone();
        let mut end = pieces[first].end();

        while end != origin {
            let next = by_start
                .get(&end)
                .and_then(|candidates| candidates.iter().copied().find(|&c| !used[c]));
            let Some(next) = next else {
                // Broken topology: close the open chain where it stops
                tracing::trace!("[Dissolve] open chain of {} points closed early", ring.len());
                ring.push(ring[0]);
                break;
            };
            used[next] = true;
            ring.extend(pieces[next].points.iter().skip(1).copied());
            end = pieces[next].end();
        }

        if ring.len() >= 4 {
            rings.push(ring);
        }
    }
    rings
}

/// Sort rings into exteriors (winding like the members' exteriors) and holes,
/// attaching each hole to the smallest exterior containing it
fn assemble(rings: Vec<Ring>, exterior_area: f64) -> Vec<Polygon> {
    let exterior_sign = if exterior_area < 0.0 { -1.0 } else { 1.0 };

    let mut exteriors: Vec<(f64, Polygon)> = Vec::new();
    let mut holes: Vec<Ring> = Vec::new();
    for ring in rings {
        let area = signed_area(&ring);
        if area == 0.0 {
            continue;
        }
        if area * exterior_sign > 0.0 {
            exteriors.push((area.abs(), Polygon::new(ring, Vec::new())));
        } else {
            holes.push(ring);
        }
    }

    for hole in holes {
        let probe = hole[0];
        let owner = exteriors
            .iter_mut()
            .filter(|(_, poly)| point_in_ring(probe, &poly.exterior))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        match owner {
            Some((_, poly)) => poly.holes.push(hole),
            None => tracing::trace!("[Dissolve] dropping hole outside every exterior"),
        }
    }

    exteriors.into_iter().map(|(_, poly)| poly).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::geometry::Bounds;
    use std::collections::HashSet;

    fn square(x: f64, y: f64) -> Shape {
        Shape::Polygon(Polygon::new(
            vec![
                Point::new(x, y),
                Point::new(x + 1.0, y),
                Point::new(x + 1.0, y + 1.0),
                Point::new(x, y + 1.0),
                Point::new(x, y),
            ],
            vec![],
        ))
    }

    fn undirected_edges(shape: &Shape) -> HashSet<(PointKey, PointKey)> {
        shape
            .rings()
            .flat_map(ring_edges)
            .map(|(a, b)| undirected(a, b))
            .collect()
    }

    #[test]
    fn test_dissolve_grid_has_no_seams() {
        // 3x3 grid of unit squares minus the center: one exterior, one hole
        let members: Vec<Shape> = (0..9)
            .filter(|&i| i != 4)
            .map(|i| square((i % 3) as f64, (i / 3) as f64))
            .collect();
        let refs: Vec<&Shape> = members.iter().collect();
        let merged = Shape::from_polygons(dissolve_rings(&refs)).unwrap();

        let Shape::Polygon(poly) = &merged else { panic!("expected one polygon") };
        assert_eq!(poly.holes.len(), 1);
        assert_eq!(merged.area(), 8.0);
        assert_eq!(merged.bounds(), Some(Bounds::new(0.0, 0.0, 3.0, 3.0)));

        // No edge shared by two members survives
        let mut counts: HashMap<(PointKey, PointKey), usize> = HashMap::new();
        for member in &members {
            for edge in undirected_edges(member) {
                *counts.entry(edge).or_insert(0) += 1;
            }
        }
        for edge in undirected_edges(&merged) {
            assert_eq!(counts.get(&edge), Some(&1), "internal seam {:?} survived", edge);
        }
    }

    #[test]
    fn test_disjoint_members_stay_separate() {
        let a = square(0.0, 0.0);
        let b = square(5.0, 5.0);
        let merged = dissolve_rings(&[&a, &b]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|p| p.holes.is_empty()));
    }

    #[test]
    fn test_clockwise_members_keep_orientation() {
        let flip = |s: Shape| s.map_points(|p| Point::new(p.x, -p.y));
        let a = flip(square(0.0, 0.0));
        let b = flip(square(1.0, 0.0));
        let merged = dissolve_rings(&[&a, &b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].area(), 2.0);
        assert!(signed_area(&merged[0].exterior) < 0.0);
    }

    #[test]
    fn test_dissolve_shared_arc() {
        // Arc 0 is the shared edge x=1; arcs 1 and 2 are the outer halves
        let topology = Topology {
            arcs: vec![
                vec![Point::new(1.0, 0.0), Point::new(1.0, 1.0)],
                vec![Point::new(1.0, 1.0), Point::new(0.0, 1.0), Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
                vec![Point::new(1.0, 0.0), Point::new(2.0, 0.0), Point::new(2.0, 1.0), Point::new(1.0, 1.0)],
            ],
            features: vec![],
        };
        let west: Vec<ArcPolygon> = vec![vec![vec![0, 1]]];
        let east: Vec<ArcPolygon> = vec![vec![vec![2, -1]]];
        let merged = dissolve_arcs(&topology, &[&west, &east]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].area(), 2.0);
        assert!(merged[0].exterior.iter().all(|p| p.x != 1.0 || p.y == 0.0 || p.y == 1.0));
        assert!(!merged[0].exterior.iter().any(|p| *p == Point::new(1.0, 0.5)));
        assert_eq!(merged[0].exterior.first(), merged[0].exterior.last());
    }
}
