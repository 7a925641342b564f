//! The map: one dataset, one surface, one viewport
//!
//! `ChoroplethMap` owns every component and is driven entirely by the host:
//! data and surface size through `render`, boundary files through
//! `complete_fetch`, input through the pointer/wheel methods and time through
//! `frame`. Nothing is drawn unless something changed since the last frame.

use crate::config::{MapOptions, MapStyle};
use crate::dataset::{Dataset, RegionDatum};
use crate::draw::color::{ColorScale, LegendEntry};
use crate::draw::generation::{Aggregation, LodTier, Scene, SceneInput};
use crate::draw::geometry::{Bounds, Point, Projection, Shape};
use crate::render::{BackendError, Frame, FrameStats, RenderBackend, RenderStatus, RenderStyle, Renderer};
use crate::source::{BoundaryStore, Coverage, FetchRequest, GeometryFeature, GeometrySource};
use crate::view::{
    EventBus, HitTarget, InteractionController, InteractionState, MapEvent, ViewportController, ViewportTransform,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

/// Snapshot for hosts polling state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSummary {
    pub status: RenderStatus,
    pub generation: u64,
    pub coverage: Coverage,
    pub transform: ViewportTransform,
    pub lod: LodTier,
    pub interaction: InteractionState,
    pub features: usize,
    pub groups: usize,
}

pub struct ChoroplethMap<B: RenderBackend> {
    options: MapOptions,
    style: MapStyle,
    source: GeometrySource,
    dataset: Dataset,
    aggregation: Aggregation,
    fine_scale: ColorScale,
    coarse_scale: ColorScale,
    scene: Scene,
    viewport: ViewportController,
    interaction: InteractionController,
    events: EventBus,
    renderer: Option<Renderer<B>>,
    status: RenderStatus,
    width: u32,
    height: u32,
    dirty: bool,
}

impl<B: RenderBackend> ChoroplethMap<B> {
    /// Create the map, initializing the backend once. A failed initialization
    /// leaves the map in `RenderStatus::Failed`; it still tracks data and input.
    pub fn new(options: MapOptions, init: impl FnOnce() -> Result<B, BackendError>) -> Self {
        let options = options.normalized();
        let style = options.style();
        let render_style = RenderStyle::from_map_style(&style, options.show_borders, options.show_outline);

        let (renderer, status) = match init() {
            Ok(backend) => (Some(Renderer::new(backend, render_style)), RenderStatus::Ready),
            Err(e) => {
                tracing::warn!("[Map] rendering disabled: {}", e);
                (None, RenderStatus::Failed(e.to_string()))
            }
        };

        let home = options.initial_transform.unwrap_or_default();
        let viewport = ViewportController::new(options.min_scale, options.max_scale, options.animation_ms, home);
        let interaction = InteractionController::new(options.click_threshold, options.wheel_sensitivity);
        let source = GeometrySource::new(options.scheme.clone(), options.code_properties.clone());
        let fine_scale = ColorScale::new(Vec::new(), style.palette.clone(), style.neutral);
        let coarse_scale = fine_scale.clone();
        let scene = Scene::empty(Projection::identity(), options.lod_threshold);

        Self {
            options,
            style,
            source,
            dataset: Dataset::default(),
            aggregation: Aggregation::default(),
            fine_scale,
            coarse_scale,
            scene,
            viewport,
            interaction,
            events: EventBus::new(),
            renderer,
            status,
            width: 1,
            height: 1,
            dirty: true,
        }
    }

    /// Event subscription; a subscriber joining after a failure still sees it once
    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        let replay = match &self.status {
            RenderStatus::Failed(_) => Some(MapEvent::StatusChanged(self.status.clone())),
            RenderStatus::Ready => None,
        };
        self.events.subscribe_with(replay)
    }

    /// Show `data` on a `width` x `height` surface. Returns the boundary
    /// fetches the host should perform and hand back to `complete_fetch`.
    pub fn render(&mut self, data: Vec<RegionDatum>, width: u32, height: u32) -> Vec<FetchRequest> {
        self.dataset = Dataset::from_records(data);
        self.set_size(width, height);
        let requests = self.source.begin_load(self.dataset.codes());
        tracing::info!(
            "[Map] {} record(s), {} boundary fetch(es) issued",
            self.dataset.len(),
            requests.len()
        );
        self.rebuild();
        requests
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width.max(1), height.max(1)) == (self.width, self.height) {
            return;
        }
        self.set_size(width, height);
        self.rebuild();
    }

    /// Apply one fetch outcome; stale ones are dropped. Returns whether it applied.
    pub fn complete_fetch(&mut self, request: &FetchRequest, outcome: anyhow::Result<Option<String>>) -> bool {
        if !self.source.complete(request, outcome) {
            return false;
        }
        self.rebuild();
        true
    }

    /// Satisfy `requests` synchronously from a store
    pub fn load_from_store(&mut self, store: &dyn BoundaryStore, requests: &[FetchRequest]) -> usize {
        requests
            .iter()
            .filter(|request| {
                let outcome = store.fetch(&request.subdivision);
                self.complete_fetch(request, outcome)
            })
            .count()
    }

    pub fn pointer_down(&mut self, pos: Point) {
        self.interaction.pointer_down(pos);
    }

    pub fn pointer_move(&mut self, pos: Point) {
        let changed = self.interaction.pointer_move(pos, &mut self.viewport, &self.scene, &mut self.events);
        self.dirty |= changed;
    }

    pub fn pointer_up(&mut self, pos: Point, now_ms: f64) {
        let changed =
            self.interaction.pointer_up(pos, now_ms, &mut self.viewport, &self.scene, &mut self.events);
        self.dirty |= changed;
    }

    pub fn pointer_leave(&mut self) {
        let changed = self.interaction.pointer_leave(&mut self.viewport, &mut self.events);
        self.dirty |= changed;
    }

    pub fn wheel(&mut self, pos: Point, delta_y: f64) {
        let changed = self.interaction.wheel(pos, delta_y, &mut self.viewport, &mut self.events);
        self.dirty |= changed;
    }

    /// Clear the selection and animate back to the overview
    pub fn reset_view(&mut self, now_ms: f64) {
        self.interaction.set_selection(None, &mut self.events);
        self.viewport.reset(now_ms);
        self.dirty = true;
    }

    /// Jump to a transform (clamped), cancelling any animation
    pub fn set_transform(&mut self, transform: ViewportTransform) {
        if self.viewport.set_transform(transform) {
            self.events.emit(MapEvent::TransformChanged(self.viewport.transform()));
            self.dirty = true;
        }
    }

    /// Advance animations and draw if anything changed. `None` when idle or failed.
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameStats> {
        if self.viewport.tick(now_ms) {
            self.events.emit(MapEvent::TransformChanged(self.viewport.transform()));
            self.dirty = true;
        }
        if !self.dirty {
            return None;
        }
        self.dirty = false;

        let renderer = self.renderer.as_mut()?;
        let frame = Frame {
            scene: &self.scene,
            transform: self.viewport.transform(),
            width: self.width,
            height: self.height,
            visible: self.viewport.visible_rect(),
            hovered: self.interaction.hovered(),
            selected: self.interaction.selected(),
        };
        match renderer.draw(&frame) {
            Ok(stats) => Some(stats),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Legend of the tier drawn at the current scale
    pub fn legend(&self) -> Vec<LegendEntry> {
        self.legend_for(self.lod())
    }

    pub fn legend_for(&self, lod: LodTier) -> Vec<LegendEntry> {
        match lod {
            LodTier::Fine => self.fine_scale.legend(),
            LodTier::Coarse => self.coarse_scale.legend(),
        }
    }

    pub fn lod(&self) -> LodTier {
        self.scene.lod_for(self.viewport.transform().scale)
    }

    pub fn status(&self) -> &RenderStatus {
        &self.status
    }

    pub fn summary(&self) -> MapSummary {
        MapSummary {
            status: self.status.clone(),
            generation: self.source.generation(),
            coverage: self.source.coverage(),
            transform: self.viewport.transform(),
            lod: self.lod(),
            interaction: self.interaction.state().clone(),
            features: self.scene.fine.len(),
            groups: self.aggregation.len(),
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.viewport.transform()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn interaction(&self) -> &InteractionState {
        self.interaction.state()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn coverage(&self) -> Coverage {
        self.source.coverage()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn backend(&self) -> Option<&B> {
        self.renderer.as_ref().map(Renderer::backend)
    }

    /// Projected position of a lon/lat (or planar input) point
    pub fn project(&self, p: Point) -> Point {
        self.scene.projection.project(p)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.viewport.set_canvas(self.width as f64, self.height as f64, self.options.padding);
    }

    fn fail(&mut self, error: BackendError) {
        tracing::warn!("[Map] rendering stopped: {}", error);
        self.renderer = None;
        self.status = RenderStatus::Failed(error.to_string());
        self.events.emit(MapEvent::StatusChanged(self.status.clone()));
    }

    /// Rebuild groups, scales, projection and tiers from what is loaded now
    fn rebuild(&mut self) {
        let features: Vec<Arc<GeometryFeature>> = self.source.features().cloned().collect();
        self.aggregation = Aggregation::build(&features, &self.dataset);
        self.fine_scale = ColorScale::new(self.dataset.values(), self.style.palette.clone(), self.style.neutral);
        self.coarse_scale = ColorScale::new(self.aggregation.totals(), self.style.palette.clone(), self.style.neutral);

        let extent = features
            .iter()
            .filter_map(|f| f.shape.bounds())
            .reduce(|a, b| a.union(&b));
        let projection = match extent {
            Some(extent) => Projection::fit(
                self.options.projection,
                &extent,
                self.width as f64,
                self.height as f64,
                self.options.padding,
            ),
            None => Projection::identity(),
        };

        self.keep_view_across_refit(projection);

        let outlines: Vec<&Shape> = self.source.subdivisions().filter_map(|s| s.outline.as_ref()).collect();
        self.scene = Scene::build(SceneInput {
            features: &features,
            aggregation: &self.aggregation,
            outlines,
            dataset: &self.dataset,
            fine_scale: &self.fine_scale,
            coarse_scale: &self.coarse_scale,
            projection,
            lod_threshold: self.options.lod_threshold,
        });

        self.interaction.revalidate(&self.scene, &mut self.events);
        self.dirty = true;
    }

    /// Away from the overview, what is on screen stays in place across a
    /// refit; at the overview the refit shows the grown extent.
    fn keep_view_across_refit(&mut self, projection: Projection) {
        let previous = self.scene.projection;
        let had_content = !self.scene.fine.is_empty() || !self.scene.coarse.is_empty();
        let at_overview = !self.viewport.is_animating()
            && self.viewport.transform() == self.viewport.home()
            && self.interaction.selected().is_none();
        if !had_content || at_overview || previous == projection || previous.kind != projection.kind {
            return;
        }

        let ratio = previous.scale / projection.scale;
        let shift = Point::new(
            previous.offset_x - projection.offset_x * ratio,
            previous.offset_y - projection.offset_y * ratio,
        );
        if self.viewport.reproject(ratio, shift) {
            tracing::debug!("[Map] view carried across refit (ratio {:.3})", ratio);
            self.events.emit(MapEvent::TransformChanged(self.viewport.transform()));
        }
    }

    /// Projected bounds of a group, if it is loaded
    pub fn group_bounds(&self, group_code: &str) -> Option<Bounds> {
        self.scene.group_bounds(group_code)
    }
}
