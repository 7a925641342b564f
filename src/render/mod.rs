//! Rendering: LOD tier choice, culling and draw calls against a backend
//!
//! # Submodules
//! - `backend` - backend trait, typed backend errors, recording backend
//! - `renderer` - per-frame drawing of a scene
//! - `binary` - packing recorded frames for GPU upload by a webview

mod backend;
mod renderer;
mod binary;

pub use backend::{
    BackendError,
    DrawCommand,
    RecordingBackend,
    RenderBackend,
    RenderStatus,
};

pub use renderer::{
    Frame,
    FrameStats,
    RenderStyle,
    Renderer,
};

pub use binary::{FRAME_MAGIC, frame_to_bytes};
