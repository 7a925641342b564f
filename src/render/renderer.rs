//! Frame drawing
//!
//! Order per frame: clear, one viewport matrix, the culled fills of the active
//! tier, the selected group's fine regions, then border and outline strokes.
//! Buffers are never touched; hover highlighting swaps the color at the call.

use super::backend::{BackendError, RenderBackend};
use crate::config::MapStyle;
use crate::draw::generation::{LodTier, Scene};
use crate::draw::geometry::{Bounds, Color};
use crate::view::ViewportTransform;
use serde::Serialize;

const BORDER_WIDTH: f32 = 0.5;
const OUTLINE_WIDTH: f32 = 1.5;

/// Inputs of one frame
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub transform: ViewportTransform,
    pub width: u32,
    pub height: u32,
    /// Projected rectangle on screen
    pub visible: Bounds,
    pub hovered: Option<&'a str>,
    pub selected: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameStats {
    pub lod: LodTier,
    /// Tessellations drawn, overlay included
    pub filled: usize,
    /// Tessellations of the active tier skipped as off-screen
    pub culled: usize,
    pub strokes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub background: Color,
    pub highlight: Color,
    pub border: Color,
    pub outline: Color,
    pub show_borders: bool,
    pub show_outline: bool,
}

impl RenderStyle {
    pub fn from_map_style(style: &MapStyle, show_borders: bool, show_outline: bool) -> Self {
        Self {
            background: [0.0, 0.0, 0.0, 0.0],
            highlight: style.highlight,
            border: style.border,
            outline: style.outline,
            show_borders,
            show_outline,
        }
    }
}

pub struct Renderer<B: RenderBackend> {
    backend: B,
    style: RenderStyle,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(backend: B, style: RenderStyle) -> Self {
        Self { backend, style }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn draw(&mut self, frame: &Frame<'_>) -> Result<FrameStats, BackendError> {
        let scene = frame.scene;
        let lod = scene.lod_for(frame.transform.scale);
        let tier = scene.tier(lod);

        self.backend.begin_frame(frame.width, frame.height, self.style.background)?;
        self.backend.set_transform(frame.transform.matrix());

        let visible = tier.index.cull(&frame.visible);
        let mut filled = 0;
        for entry in &visible {
            let Some(tess) = tier.tessellations.get(entry.feature) else { continue };
            let color = self.pick_color(&tess.code, tess.color, frame.hovered);
            self.backend.fill_triangles(&tess.code, &tess.vertices, color);
            filled += 1;
        }
        let culled = tier.len() - visible.len();

        // Drill-down overlay; the fine tier already contains it
        if let (Some(group), LodTier::Coarse) = (frame.selected, lod) {
            for &i in scene.members_of(group) {
                let Some(tess) = scene.fine.tessellations.get(i) else { continue };
                if !tess.bounds.intersects(&frame.visible) {
                    continue;
                }
                let color = self.pick_color(&tess.code, tess.color, frame.hovered);
                self.backend.fill_triangles(&tess.code, &tess.vertices, color);
                filled += 1;
            }
        }

        let mut strokes = 0;
        if self.style.show_borders && !scene.borders.is_empty() {
            self.backend.stroke_lines(&scene.borders, self.style.border, BORDER_WIDTH);
            strokes += 1;
        }
        if self.style.show_outline && !scene.outlines.is_empty() {
            self.backend.stroke_lines(&scene.outlines, self.style.outline, OUTLINE_WIDTH);
            strokes += 1;
        }

        self.backend.end_frame()?;
        tracing::trace!("[Renderer] {:?}: {} filled, {} culled, {} stroke pass(es)", lod, filled, culled, strokes);
        Ok(FrameStats { lod, filled, culled, strokes })
    }

    fn pick_color(&self, code: &str, base: Color, hovered: Option<&str>) -> Color {
        if hovered == Some(code) {
            self.style.highlight
        } else {
            base
        }
    }
}
