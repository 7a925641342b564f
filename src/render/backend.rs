//! Rendering backend seam
//!
//! The renderer issues a handful of primitive calls per frame; a GPU host
//! implements them over its own buffers. `RecordingBackend` keeps the calls as
//! data so frames can be inspected or shipped to a webview.

use crate::draw::geometry::Color;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// The backend cannot be created on this host (missing capability, no adapter)
    #[error("rendering backend unavailable: {0}")]
    Unavailable(String),
    /// The surface went away mid-session
    #[error("render surface lost: {0}")]
    SurfaceLost(String),
}

/// Health of the rendering path as seen by the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum RenderStatus {
    Ready,
    /// Rendering is off for the rest of the session; the host picks a fallback
    Failed(String),
}

pub trait RenderBackend {
    fn begin_frame(&mut self, width: u32, height: u32, clear: Color) -> Result<(), BackendError>;
    /// Column-major 3x3 affine matrix applied to every following draw
    fn set_transform(&mut self, matrix: [f32; 9]);
    /// Non-indexed triangle list, x/y pairs
    fn fill_triangles(&mut self, code: &str, vertices: &[f32], color: Color);
    /// Independent segments, x0, y0, x1, y1 each; `width` in screen pixels
    fn stroke_lines(&mut self, segments: &[f32], color: Color, width: f32);
    fn end_frame(&mut self) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Begin { width: u32, height: u32, clear: Color },
    SetTransform([f32; 9]),
    Fill { code: String, vertices: Vec<f32>, color: Color },
    Stroke { segments: Vec<f32>, color: Color, width: f32 },
    End,
}

/// Keeps the commands of the last completed frame
#[derive(Debug, Default)]
pub struct RecordingBackend {
    current: Vec<DrawCommand>,
    last: Vec<DrawCommand>,
    frames: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last
    }

    /// Completed frames so far
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Codes filled in the last frame, in draw order
    pub fn filled_codes(&self) -> Vec<&str> {
        self.last
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Fill { code, .. } => Some(code.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self, width: u32, height: u32, clear: Color) -> Result<(), BackendError> {
        self.current.clear();
        self.current.push(DrawCommand::Begin { width, height, clear });
        Ok(())
    }

    fn set_transform(&mut self, matrix: [f32; 9]) {
        self.current.push(DrawCommand::SetTransform(matrix));
    }

    fn fill_triangles(&mut self, code: &str, vertices: &[f32], color: Color) {
        self.current.push(DrawCommand::Fill { code: code.to_string(), vertices: vertices.to_vec(), color });
    }

    fn stroke_lines(&mut self, segments: &[f32], color: Color, width: f32) {
        self.current.push(DrawCommand::Stroke { segments: segments.to_vec(), color, width });
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        self.current.push(DrawCommand::End);
        self.last = std::mem::take(&mut self.current);
        self.frames += 1;
        Ok(())
    }
}
