use eframe::egui::{Pos2, Rect, Vec2};

pub(crate) const MIN_ZOOM: f32 = 0.05;
pub(crate) const MAX_ZOOM: f32 = 8.0;
pub(crate) const INSPECT_ZOOM: f32 = 3.0;
pub(crate) const OVERVIEW_ZOOM: f32 = 1.0;
pub(crate) const FOCUS_CENTER_MS: u64 = 1000;
pub(crate) const INSPECT_ZOOM_MS: u64 = 2000;
pub(crate) const OVERVIEW_ZOOM_MS: u64 = 1000;
pub(crate) const FIT_DURATION_MS: u64 = 400;
pub(crate) const FIT_PADDING_PX: f32 = 48.0;

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

#[derive(Clone, Copy, Debug)]
struct Tween<T> {
    from: T,
    to: T,
    duration_secs: f64,
    started_at: Option<f64>,
}

impl<T: Lerp> Tween<T> {
    fn new(from: T, to: T, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            duration_secs: duration_ms as f64 / 1000.0,
            started_at: None,
        }
    }

    /// Value at `now` and whether the tween has finished. The clock starts on
    /// the first sample.
    fn sample(&mut self, now: f64) -> (T, bool) {
        let started_at = *self.started_at.get_or_insert(now);
        if self.duration_secs <= 0.0 {
            return (self.to, true);
        }

        let t = ((now - started_at) / self.duration_secs).clamp(0.0, 1.0) as f32;
        (self.from.lerp(self.to, ease_out_cubic(t)), t >= 1.0)
    }
}

/// View transform over the layout's world space. `center` is the world point
/// drawn at the middle of the canvas.
#[derive(Clone, Debug)]
pub(crate) struct Camera {
    center: Vec2,
    zoom: f32,
    center_tween: Option<Tween<Vec2>>,
    zoom_tween: Option<Tween<f32>>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: OVERVIEW_ZOOM,
            center_tween: None,
            zoom_tween: None,
        }
    }
}

impl Camera {
    #[cfg(test)]
    pub(crate) fn center(&self) -> Vec2 {
        self.center
    }

    pub(crate) fn zoom(&self) -> f32 {
        self.zoom
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.center_tween.is_some() || self.zoom_tween.is_some()
    }

    pub(crate) fn center_at(&mut self, world: Vec2, duration_ms: u64) {
        if duration_ms == 0 {
            self.center = world;
            self.center_tween = None;
        } else {
            self.center_tween = Some(Tween::new(self.center, world, duration_ms));
        }
    }

    pub(crate) fn zoom_to(&mut self, level: f32, duration_ms: u64) {
        let level = level.clamp(MIN_ZOOM, MAX_ZOOM);
        if duration_ms == 0 {
            self.zoom = level;
            self.zoom_tween = None;
        } else {
            self.zoom_tween = Some(Tween::new(self.zoom, level, duration_ms));
        }
    }

    /// Frames `bounds` (world space) inside a viewport of `viewport` pixels.
    pub(crate) fn zoom_to_fit(
        &mut self,
        viewport: Vec2,
        bounds: Rect,
        padding_px: f32,
        duration_ms: u64,
    ) {
        if !bounds.is_finite() || viewport.x <= 0.0 || viewport.y <= 0.0 {
            return;
        }

        let usable = (viewport - Vec2::splat(padding_px * 2.0)).max(Vec2::splat(1.0));
        let extent = bounds.size().max(Vec2::splat(1.0));
        let zoom = (usable.x / extent.x).min(usable.y / extent.y);

        self.center_at(bounds.center().to_vec2(), duration_ms);
        self.zoom_to(zoom, duration_ms);
    }

    /// Advances running tweens; returns true while any is still moving.
    pub(crate) fn step(&mut self, now: f64) -> bool {
        if let Some(tween) = self.center_tween.as_mut() {
            let (value, done) = tween.sample(now);
            self.center = value;
            if done {
                self.center_tween = None;
            }
        }
        if let Some(tween) = self.zoom_tween.as_mut() {
            let (value, done) = tween.sample(now);
            self.zoom = value;
            if done {
                self.zoom_tween = None;
            }
        }
        self.is_animating()
    }

    pub(crate) fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + (world - self.center) * self.zoom
    }

    pub(crate) fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        self.center + (screen - rect.center()) / self.zoom
    }

    /// Scroll zoom that keeps the world point under `pointer` fixed.
    pub(crate) fn zoom_at(&mut self, rect: Rect, pointer: Pos2, factor: f32) {
        self.center_tween = None;
        self.zoom_tween = None;

        let world_before = self.screen_to_world(rect, pointer);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.center = world_before - (pointer - rect.center()) / self.zoom;
    }

    pub(crate) fn pan_by(&mut self, screen_delta: Vec2) {
        self.center_tween = None;
        self.center -= screen_delta / self.zoom;
    }
}
