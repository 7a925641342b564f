//! Pointer and wheel handling
//!
//! A press starts a drag *candidate*. Moves accumulate travel while a
//! candidate exists and never hover-test; the view stays put until the travel
//! passes the click threshold, at which point the candidate becomes a real drag
//! and the view catches up with the pointer and pans 1:1 from then on.
//! Releasing below the threshold is a click, resolved by hit-testing at the
//! release point.

use super::events::{EventBus, MapEvent};
use super::viewport::ViewportController;
use crate::draw::geometry::{Bounds, Point};
use serde::Serialize;

/// Bound on `ln(zoom factor)` per wheel event; larger deltas saturate at the scale limits
const MAX_WHEEL_EXPONENT: f64 = 50.0;

/// A region under the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// Fine code or group code, whichever tier answered
    pub code: String,
    pub group_code: String,
}

/// Hit-testing and group lookup for the drawn scene
pub trait HitTarget {
    /// Region containing the projected `point` when viewed at `scale`
    fn hit(&self, point: Point, scale: f64, selected_group: Option<&str>) -> Option<Hit>;
    /// Projected bounds of a group's merged shape
    fn group_bounds(&self, group_code: &str) -> Option<Bounds>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractionState {
    pub hovered_code: Option<String>,
    pub selected_group: Option<String>,
    pub drag_active: bool,
}

#[derive(Debug, Clone, Copy)]
struct DragCandidate {
    origin: Point,
    last: Point,
    /// Total pointer travel since the press
    distance: f64,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
    candidate: Option<DragCandidate>,
    click_threshold: f64,
    wheel_sensitivity: f64,
}

impl InteractionController {
    pub fn new(click_threshold: f64, wheel_sensitivity: f64) -> Self {
        Self { state: InteractionState::default(), candidate: None, click_threshold, wheel_sensitivity }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn hovered(&self) -> Option<&str> {
        self.state.hovered_code.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.state.selected_group.as_deref()
    }

    pub fn pointer_down(&mut self, pos: Point) {
        self.candidate = Some(DragCandidate { origin: pos, last: pos, distance: 0.0 });
        self.state.drag_active = false;
    }

    /// Returns whether anything visible changed
    pub fn pointer_move(
        &mut self,
        pos: Point,
        viewport: &mut ViewportController,
        target: &dyn HitTarget,
        events: &mut EventBus,
    ) -> bool {
        if self.candidate.is_some() {
            return self.drag_to(pos, viewport, events);
        }

        let transform = viewport.transform();
        let code = target
            .hit(transform.invert(pos), transform.scale, self.selected())
            .map(|hit| hit.code);
        if code == self.state.hovered_code {
            return false;
        }
        self.state.hovered_code = code.clone();
        events.emit(MapEvent::Hover(code));
        true
    }

    /// Returns whether anything visible changed
    pub fn pointer_up(
        &mut self,
        pos: Point,
        now_ms: f64,
        viewport: &mut ViewportController,
        target: &dyn HitTarget,
        events: &mut EventBus,
    ) -> bool {
        if self.candidate.is_none() {
            return false;
        }
        let changed = self.drag_to(pos, viewport, events);
        let Some(candidate) = self.candidate.take() else {
            return changed;
        };
        viewport.end_drag();
        let was_drag = self.state.drag_active || candidate.distance >= self.click_threshold;
        self.state.drag_active = false;
        if was_drag {
            tracing::trace!("[Interaction] drag finished after {:.1}px", candidate.distance);
            return changed;
        }

        let transform = viewport.transform();
        let hit = target.hit(transform.invert(pos), transform.scale, self.selected());
        match hit {
            Some(hit) if self.selected() == Some(hit.group_code.as_str()) => {
                self.state.selected_group = None;
                events.emit(MapEvent::Select(None));
                viewport.reset(now_ms);
            }
            Some(hit) => {
                if let Some(bounds) = target.group_bounds(&hit.group_code) {
                    viewport.zoom_to_bounds(&bounds, now_ms);
                }
                self.state.selected_group = Some(hit.group_code.clone());
                events.emit(MapEvent::Select(Some(hit.group_code)));
            }
            None if self.state.selected_group.is_some() => {
                self.state.selected_group = None;
                events.emit(MapEvent::Select(None));
            }
            None => return changed,
        }
        true
    }

    /// Pointer left the surface: drop hover and any pending drag
    pub fn pointer_leave(&mut self, viewport: &mut ViewportController, events: &mut EventBus) -> bool {
        if self.candidate.take().is_some() {
            viewport.end_drag();
        }
        self.state.drag_active = false;
        if self.state.hovered_code.take().is_some() {
            events.emit(MapEvent::Hover(None));
            return true;
        }
        false
    }

    /// Zoom anchored at the cursor; negative `delta_y` zooms in
    pub fn wheel(&mut self, pos: Point, delta_y: f64, viewport: &mut ViewportController, events: &mut EventBus) -> bool {
        let exponent = (-delta_y * self.wheel_sensitivity).clamp(-MAX_WHEEL_EXPONENT, MAX_WHEEL_EXPONENT);
        let factor = exponent.exp();
        if !viewport.zoom_at(pos, factor) {
            return false;
        }
        events.emit(MapEvent::TransformChanged(viewport.transform()));
        true
    }

    /// Set or clear the selection without animating
    pub fn set_selection(&mut self, group_code: Option<String>, events: &mut EventBus) -> bool {
        if self.state.selected_group == group_code {
            return false;
        }
        self.state.selected_group = group_code.clone();
        events.emit(MapEvent::Select(group_code));
        true
    }

    /// Drop a selection whose group no longer exists after a rebuild
    pub fn revalidate(&mut self, target: &dyn HitTarget, events: &mut EventBus) -> bool {
        let stale = self.selected().is_some_and(|group| target.group_bounds(group).is_none());
        stale && self.set_selection(None, events)
    }

    fn drag_to(&mut self, pos: Point, viewport: &mut ViewportController, events: &mut EventBus) -> bool {
        let Some(candidate) = self.candidate.as_mut() else {
            return false;
        };
        let (dx, dy) = (pos.x - candidate.last.x, pos.y - candidate.last.y);
        candidate.distance += dx.hypot(dy);
        candidate.last = pos;

        let (dx, dy) = if self.state.drag_active {
            (dx, dy)
        } else if candidate.distance >= self.click_threshold {
            self.state.drag_active = true;
            viewport.begin_drag();
            // Catch up with everything travelled since the press
            (pos.x - candidate.origin.x, pos.y - candidate.origin.y)
        } else {
            return false;
        };
        if !viewport.pan_by(dx, dy) {
            return false;
        }
        events.emit(MapEvent::TransformChanged(viewport.transform()));
        true
    }
}
