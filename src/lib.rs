//! Interactive choropleth map core
//!
//! Colors fine-grained regions (postal codes) by a numeric value, aggregates
//! them into coarse groups with dissolved outlines, and renders either tier
//! depending on zoom. Pan, zoom, hover and click-to-select are driven by the
//! host, which also supplies boundary files and frame timestamps.
//!
//! # Modules
//! - `config` - map options and style
//! - `dataset` - input records
//! - `source` - lazy boundary file loading
//! - `draw` - geometry, aggregation, color scale and tessellation
//! - `view` - viewport, interaction and events
//! - `render` - renderer and backends
//! - `map` - `ChoroplethMap`, tying it all together
//! - `server` - JSON-RPC host over stdin/stdout

pub mod config;
pub mod dataset;
pub mod draw;
pub mod map;
pub mod render;
pub mod server;
pub mod source;
pub mod view;

pub use config::MapOptions;
pub use dataset::{Dataset, RegionDatum};
pub use draw::color::{ColorScale, LegendEntry};
pub use draw::generation::LodTier;
pub use draw::geometry::{Bounds, Point, Polygon, Shape};
pub use map::{ChoroplethMap, MapSummary};
pub use render::{BackendError, RecordingBackend, RenderBackend, RenderStatus};
pub use source::{BoundaryStore, CodeScheme, Coverage, DirectoryStore, FetchRequest, MemoryStore};
pub use view::{MapEvent, ViewportTransform};
