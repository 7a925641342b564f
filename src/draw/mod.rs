//! Geometry pipeline: decoding, dissolving, coloring and tessellating regions
//!
//! # Submodules
//! - `geometry` - core types, projection and the spatial index
//! - `parsing` - topology documents and color strings
//! - `generation` - aggregation, dissolve and the two-tier scene
//! - `tessellation` - triangulation and border segment buffers
//! - `color` - value-to-color scale

pub mod geometry;
pub mod parsing;
pub mod generation;
pub mod tessellation;
pub mod color;
