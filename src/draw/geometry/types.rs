//! Core geometry types for choropleth regions
//!
//! Coordinates stay `f64` through loading, dissolving and projection. Only the
//! tessellated triangle buffers drop to `f32` for GPU upload.

use serde::{Deserialize, Serialize};

/// RGBA color, components in 0..1
pub type Color = [f32; 4];

/// A 2D point (lon/lat before projection, projected units after)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A closed or open sequence of points; consumers accept both
pub type Ring = Vec<Point>;

/// A filled polygon: one exterior ring plus optional holes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Unsigned area of the exterior minus the holes
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.exterior).abs() - holes
    }

    /// Even-odd containment: inside the exterior and outside every hole
    pub fn contains(&self, p: Point) -> bool {
        point_in_ring(p, &self.exterior) && !self.holes.iter().any(|h| point_in_ring(p, h))
    }
}

/// Polygonal geometry of one region.
///
/// Regions spanning islands or disjoint group members are `MultiPolygon`;
/// everything downstream matches on the variant instead of inspecting types.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Shape {
    /// Collapse a polygon list into the narrowest variant; empty lists have no shape
    pub fn from_polygons(mut polygons: Vec<Polygon>) -> Option<Shape> {
        match polygons.len() {
            0 => None,
            1 => polygons.pop().map(Shape::Polygon),
            _ => Some(Shape::MultiPolygon(polygons)),
        }
    }

    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Shape::Polygon(p) => std::slice::from_ref(p),
            Shape::MultiPolygon(ps) => ps,
        }
    }

    /// All rings, exterior first for each polygon
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons()
            .iter()
            .flat_map(|p| std::iter::once(&p.exterior).chain(p.holes.iter()))
    }

    pub fn area(&self) -> f64 {
        self.polygons().iter().map(Polygon::area).sum()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.polygons().iter().any(|poly| poly.contains(p))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.rings().flatten().copied())
    }

    /// Apply `f` to every vertex, keeping ring structure
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Shape {
        let map_ring = |ring: &Ring| ring.iter().map(|&p| f(p)).collect::<Ring>();
        let map_poly = |poly: &Polygon| Polygon {
            exterior: map_ring(&poly.exterior),
            holes: poly.holes.iter().map(map_ring).collect(),
        };
        match self {
            Shape::Polygon(p) => Shape::Polygon(map_poly(p)),
            Shape::MultiPolygon(ps) => Shape::MultiPolygon(ps.iter().map(map_poly).collect()),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Bounds of all finite points, `None` if there are none
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Bounds> {
        points
            .into_iter()
            .filter(Point::is_finite)
            .fold(None, |acc: Option<Bounds>, p| {
                Some(match acc {
                    Some(b) => Bounds::new(b.min_x.min(p.x), b.min_y.min(p.y), b.max_x.max(p.x), b.max_y.max(p.y)),
                    None => Bounds::new(p.x, p.y, p.x, p.y),
                })
            })
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// A triangulated region ready for GPU upload
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    /// Fine code or group code
    pub code: String,
    pub color: Color,
    /// Non-indexed triangle list: x0, y0, x1, y1, x2, y2 per triangle
    pub vertices: Vec<f32>,
    /// Bounds of `vertices` in projected space
    pub bounds: Bounds,
}

impl Tessellation {
    /// Sum of triangle areas
    pub fn area(&self) -> f64 {
        self.vertices
            .chunks_exact(6)
            .map(|t| {
                let (x0, y0, x1, y1, x2, y2) =
                    (t[0] as f64, t[1] as f64, t[2] as f64, t[3] as f64, t[4] as f64, t[5] as f64);
                ((x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0)).abs() * 0.5
            })
            .sum()
    }

    /// Exact containment against the triangles, not the bounds
    pub fn contains(&self, p: Point) -> bool {
        self.bounds.contains(p)
            && self.vertices.chunks_exact(6).any(|t| {
                point_in_triangle(
                    p.x, p.y,
                    t[0] as f64, t[1] as f64,
                    t[2] as f64, t[3] as f64,
                    t[4] as f64, t[5] as f64,
                )
            })
    }
}

/// Shoelace signed area; positive for counter-clockwise rings in y-up space
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Even-odd ray cast
pub fn point_in_ring(p: Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Check if a point is inside a triangle using barycentric coordinates
#[allow(clippy::too_many_arguments)]
pub fn point_in_triangle(
    px: f64, py: f64,
    x0: f64, y0: f64,
    x1: f64, y1: f64,
    x2: f64, y2: f64,
) -> bool {
    let area = 0.5 * (-y1 * x2 + y0 * (-x1 + x2) + x0 * (y1 - y2) + x1 * y2);
    if area.abs() < 1e-12 {
        return false; // Degenerate triangle
    }
    let s = (y0 * x2 - x0 * y2 + (y2 - y0) * px + (x0 - x2) * py) / (2.0 * area);
    let t = (x0 * y1 - y0 * x1 + (y0 - y1) * px + (x1 - x0) * py) / (2.0 * area);
    s >= 0.0 && t >= 0.0 && (s + t) <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Ring {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
            Point::new(x, y),
        ]
    }

    #[test]
    fn test_signed_area_orientation() {
        let ccw = square(0.0, 0.0, 2.0);
        assert_eq!(signed_area(&ccw), 4.0);
        let cw: Ring = ccw.iter().rev().copied().collect();
        assert_eq!(signed_area(&cw), -4.0);
    }

    #[test]
    fn test_polygon_with_hole() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0), vec![square(2.0, 2.0, 2.0)]);
        assert_eq!(poly.area(), 96.0);
        assert!(poly.contains(Point::new(1.0, 1.0)));
        assert!(!poly.contains(Point::new(3.0, 3.0)));
        assert!(!poly.contains(Point::new(11.0, 3.0)));
    }

    #[test]
    fn test_shape_from_polygons() {
        assert!(Shape::from_polygons(vec![]).is_none());
        let one = Shape::from_polygons(vec![Polygon::new(square(0.0, 0.0, 1.0), vec![])]);
        assert!(matches!(one, Some(Shape::Polygon(_))));
        let two = Shape::from_polygons(vec![
            Polygon::new(square(0.0, 0.0, 1.0), vec![]),
            Polygon::new(square(5.0, 5.0, 1.0), vec![]),
        ])
        .unwrap();
        assert_eq!(two.polygons().len(), 2);
        assert_eq!(two.bounds(), Some(Bounds::new(0.0, 0.0, 6.0, 6.0)));
    }

    #[test]
    fn test_bounds_skip_non_finite() {
        let b = Bounds::from_points(vec![Point::new(f64::NAN, 0.0), Point::new(1.0, 2.0)]).unwrap();
        assert_eq!(b, Bounds::new(1.0, 2.0, 1.0, 2.0));
        assert!(Bounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_point_in_triangle() {
        assert!(point_in_triangle(0.25, 0.25, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0));
        assert!(!point_in_triangle(0.75, 0.75, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0));
        assert!(!point_in_triangle(0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 2.0, 2.0));
    }
}
