//! Geometry module for choropleth regions
//!
//! # Submodules
//! - `types` - Core geometric primitives (Point, Polygon, Shape, Bounds, Tessellation)
//! - `projection` - lon/lat to projected canvas space
//! - `spatial` - R-tree index for culling and hit-testing

mod types;
mod projection;
mod spatial;

pub use types::{
    Bounds,
    Color,
    Point,
    Polygon,
    Ring,
    Shape,
    Tessellation,
    point_in_ring,
    point_in_triangle,
    signed_area,
};

pub use projection::{
    Projection,
    ProjectionKind,
};

pub use spatial::{
    IndexEntry,
    SpatialIndex,
};
