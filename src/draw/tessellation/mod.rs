//! Tessellation module for map regions
//!
//! This module converts projected region shapes into flat triangle lists for
//! GPU fill rendering, and into line-segment buffers for border strokes.
//!
//! # Submodules
//! - `polygon` - Polygon triangulation using earcut
//! - `outline` - Border and outer-boundary segment buffers

mod polygon;
mod outline;

pub use polygon::{
    clean_ring,
    triangulate_polygon,
    tessellate_shape,
    tessellate_all,
};

pub use outline::{
    outline_segments,
    border_segments,
};
