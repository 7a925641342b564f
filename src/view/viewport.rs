//! Viewport transform and its controller
//!
//! The transform maps projected space to screen pixels:
//! `screen = projected * scale + translate`. The controller owns the only
//! mutable copy, clamps scale, and runs eased animations driven by host
//! supplied frame timestamps.

use crate::draw::geometry::{Bounds, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewportTransform {
    pub const fn new(translate_x: f64, translate_y: f64, scale: f64) -> Self {
        Self { translate_x, translate_y, scale }
    }

    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Projected -> screen
    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.translate_x, p.y * self.scale + self.translate_y)
    }

    /// Screen -> projected
    pub fn invert(&self, p: Point) -> Point {
        Point::new((p.x - self.translate_x) / self.scale, (p.y - self.translate_y) / self.scale)
    }

    /// Column-major 3x3 affine matrix
    pub fn matrix(&self) -> [f32; 9] {
        let (s, tx, ty) = (self.scale as f32, self.translate_x as f32, self.translate_y as f32);
        [s, 0.0, 0.0, 0.0, s, 0.0, tx, ty, 1.0]
    }

    /// Same screen mapping after projected space changed as `old = new * ratio + shift`
    pub fn reprojected(&self, ratio: f64, shift: Point) -> ViewportTransform {
        ViewportTransform {
            translate_x: self.translate_x + self.scale * shift.x,
            translate_y: self.translate_y + self.scale * shift.y,
            scale: self.scale * ratio,
        }
    }

    /// Interpolate toward `other` with ease-out cubic progress
    pub fn lerp_with_easing(&self, other: &ViewportTransform, t: f64) -> ViewportTransform {
        let e = ease_out_cubic(t);
        ViewportTransform {
            translate_x: self.translate_x + (other.translate_x - self.translate_x) * e,
            translate_y: self.translate_y + (other.translate_y - self.translate_y) * e,
            scale: self.scale + (other.scale - self.scale) * e,
        }
    }
}

/// Decelerating curve: slope falls monotonically to zero at `t = 1`
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub from: ViewportTransform,
    pub to: ViewportTransform,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl Animation {
    fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewState {
    Idle,
    Dragging,
    Animating(Animation),
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: ViewportTransform,
    state: ViewState,
    /// Target of `reset`
    home: ViewportTransform,
    min_scale: f64,
    max_scale: f64,
    animation_ms: f64,
    padding: f64,
    width: f64,
    height: f64,
}

impl ViewportController {
    pub fn new(min_scale: f64, max_scale: f64, animation_ms: f64, home: ViewportTransform) -> Self {
        let mut controller = Self {
            transform: home,
            state: ViewState::Idle,
            home,
            min_scale,
            max_scale,
            animation_ms,
            padding: 0.0,
            width: 1.0,
            height: 1.0,
        };
        controller.home = controller.clamped(home);
        controller.transform = controller.home;
        controller
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, ViewState::Animating(_))
    }

    pub fn home(&self) -> ViewportTransform {
        self.home
    }

    pub fn set_canvas(&mut self, width: f64, height: f64, padding: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.padding = padding.max(0.0);
    }

    pub fn canvas(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Jump without animating; cancels any running animation. Returns whether the transform changed.
    pub fn set_transform(&mut self, transform: ViewportTransform) -> bool {
        if matches!(self.state, ViewState::Animating(_)) {
            self.state = ViewState::Idle;
        }
        self.replace(transform)
    }

    pub fn begin_drag(&mut self) {
        self.state = ViewState::Dragging;
    }

    pub fn end_drag(&mut self) {
        if self.state == ViewState::Dragging {
            self.state = ViewState::Idle;
        }
    }

    /// Pan 1:1 with a screen-space delta
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        let t = self.transform;
        self.set_transform(ViewportTransform::new(t.translate_x + dx, t.translate_y + dy, t.scale))
    }

    /// Multiply scale by `factor`, keeping the projected point under `screen` fixed
    pub fn zoom_at(&mut self, screen: Point, factor: f64) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            return false;
        }
        let anchor = self.transform.invert(screen);
        let scale = self.clamp_scale(self.transform.scale * factor);
        self.set_transform(ViewportTransform::new(
            screen.x - anchor.x * scale,
            screen.y - anchor.y * scale,
            scale,
        ))
    }

    /// Start animating toward `target`, replacing any running animation
    pub fn animate_to(&mut self, target: ViewportTransform, now_ms: f64) {
        let to = self.clamped(target);
        if self.animation_ms <= 0.0 {
            self.state = ViewState::Idle;
            self.replace(to);
            return;
        }
        self.state = ViewState::Animating(Animation {
            from: self.transform,
            to,
            start_ms: now_ms,
            duration_ms: self.animation_ms,
        });
    }

    /// Advance the running animation; returns whether the transform changed
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let ViewState::Animating(animation) = self.state else {
            return false;
        };
        let t = animation.progress(now_ms);
        if t >= 1.0 {
            self.state = ViewState::Idle;
            return self.replace(animation.to);
        }
        self.replace(animation.from.lerp_with_easing(&animation.to, t))
    }

    /// Keep what is on screen in place after projected space was refitted
    /// (`old = new * ratio + shift`), carrying a running animation along.
    /// Returns whether the transform changed.
    pub fn reproject(&mut self, ratio: f64, shift: Point) -> bool {
        if !(ratio.is_finite() && ratio > 0.0 && shift.is_finite()) {
            return false;
        }
        if let ViewState::Animating(mut animation) = self.state {
            animation.from = animation.from.reprojected(ratio, shift);
            animation.to = self.clamped(animation.to.reprojected(ratio, shift));
            self.state = ViewState::Animating(animation);
        }
        self.replace(self.transform.reprojected(ratio, shift))
    }

    /// Transform that fits `bounds` (projected) into the canvas with padding
    pub fn fit_bounds(&self, bounds: &Bounds) -> ViewportTransform {
        let avail_w = (self.width - 2.0 * self.padding).max(1.0);
        let avail_h = (self.height - 2.0 * self.padding).max(1.0);
        let scale = if bounds.width() > 0.0 && bounds.height() > 0.0 {
            (avail_w / bounds.width()).min(avail_h / bounds.height())
        } else {
            self.max_scale
        };
        self.centered_on(bounds.center(), scale)
    }

    /// Transform putting `point` (projected) at the canvas center at `scale`
    pub fn centered_on(&self, point: Point, scale: f64) -> ViewportTransform {
        let scale = self.clamp_scale(scale);
        ViewportTransform::new(self.width * 0.5 - point.x * scale, self.height * 0.5 - point.y * scale, scale)
    }

    pub fn zoom_to_bounds(&mut self, bounds: &Bounds, now_ms: f64) {
        let target = self.fit_bounds(bounds);
        self.animate_to(target, now_ms);
    }

    pub fn zoom_to_point(&mut self, point: Point, scale: f64, now_ms: f64) {
        let target = self.centered_on(point, scale);
        self.animate_to(target, now_ms);
    }

    /// Animate back to the overview
    pub fn reset(&mut self, now_ms: f64) {
        self.animate_to(self.home, now_ms);
    }

    /// Projected-space rectangle currently visible on the canvas
    pub fn visible_rect(&self) -> Bounds {
        let a = self.transform.invert(Point::new(0.0, 0.0));
        let b = self.transform.invert(Point::new(self.width, self.height));
        Bounds::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        if !scale.is_finite() {
            return self.transform.scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }

    fn clamped(&self, t: ViewportTransform) -> ViewportTransform {
        ViewportTransform { scale: self.clamp_scale(t.scale), ..t }
    }

    fn replace(&mut self, transform: ViewportTransform) -> bool {
        let next = self.clamped(transform);
        if !(next.translate_x.is_finite() && next.translate_y.is_finite()) || next == self.transform {
            return false;
        }
        self.transform = next;
        true
    }
}
