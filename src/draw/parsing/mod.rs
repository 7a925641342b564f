//! Parsing of boundary documents and configured colors
//!
//! # Submodules
//! - `topology` - TopoJSON decoding with arcs kept for dissolving
//! - `colors` - hex color parsing for palettes

mod colors;
mod topology;

pub use colors::{
    parse_hex_color,
    parse_palette,
    to_hex,
};

pub use topology::{
    ArcPolygon,
    TopoFeature,
    Topology,
    decode_arc_ref,
};
