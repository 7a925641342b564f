//! Geographic projection into the canvas' projected space
//!
//! Projected space is pixel-sized at viewport scale 1 with y growing downward,
//! so the identity `ViewportTransform` shows the whole fitted extent.

use super::types::{Bounds, Point, Shape};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, PI};

/// Latitude limit of the spherical Mercator
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Spherical Mercator of lon/lat input
    #[default]
    Mercator,
    /// Plate carrée of lon/lat input
    Equirectangular,
    /// Input is already projected (e.g. pre-projected boundary files); y grows downward
    Planar,
}

impl ProjectionKind {
    /// Unscaled projection, y down
    fn raw(self, p: Point) -> Point {
        match self {
            ProjectionKind::Mercator => {
                let lat = p.y.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
                Point::new(p.x.to_radians(), -(FRAC_PI_4 + lat / 2.0).tan().ln())
            }
            ProjectionKind::Equirectangular => Point::new(p.x.to_radians(), -p.y.to_radians()),
            ProjectionKind::Planar => p,
        }
    }
}

/// Projection fitted to a canvas: `screen = raw(p) * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub kind: ProjectionKind,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Projection {
    /// Planar projection that leaves coordinates untouched
    pub fn identity() -> Self {
        Self { kind: ProjectionKind::Planar, scale: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }

    /// Fit `extent` (in input coordinates) into a `width` x `height` canvas
    /// with `padding` pixels on every side, centered.
    pub fn fit(kind: ProjectionKind, extent: &Bounds, width: f64, height: f64, padding: f64) -> Self {
        let corners = [
            Point::new(extent.min_x, extent.min_y),
            Point::new(extent.max_x, extent.max_y),
            Point::new(extent.min_x, extent.max_y),
            Point::new(extent.max_x, extent.min_y),
        ];
        // Mercator and plate carrée are monotonic per axis, so corners bound the extent
        let raw = match Bounds::from_points(corners.iter().map(|&c| kind.raw(c))) {
            Some(b) => b,
            None => return Self::identity(),
        };

        let avail_w = (width - 2.0 * padding).max(1.0);
        let avail_h = (height - 2.0 * padding).max(1.0);
        let raw_w = raw.width().max(f64::EPSILON);
        let raw_h = raw.height().max(f64::EPSILON);
        let scale = (avail_w / raw_w).min(avail_h / raw_h);

        let center = raw.center();
        Self {
            kind,
            scale,
            offset_x: width * 0.5 - center.x * scale,
            offset_y: height * 0.5 - center.y * scale,
        }
    }

    pub fn project(&self, p: Point) -> Point {
        let r = self.kind.raw(p);
        Point::new(r.x * self.scale + self.offset_x, r.y * self.scale + self.offset_y)
    }

    pub fn project_shape(&self, shape: &Shape) -> Shape {
        shape.map_points(|p| self.project(p))
    }

    /// Inverse of `project`, used for reporting lon/lat under the cursor
    pub fn invert(&self, p: Point) -> Point {
        let rx = (p.x - self.offset_x) / self.scale;
        let ry = (p.y - self.offset_y) / self.scale;
        match self.kind {
            ProjectionKind::Mercator => {
                let lat = 2.0 * (-ry).exp().atan() - PI / 2.0;
                Point::new(rx.to_degrees(), lat.to_degrees())
            }
            ProjectionKind::Equirectangular => Point::new(rx.to_degrees(), (-ry).to_degrees()),
            ProjectionKind::Planar => Point::new(rx, ry),
        }
    }
}
