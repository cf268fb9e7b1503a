use super::physics::Aabb;
use super::rendering::PIXELS_PER_WORLD;
use super::world::{EntityId, Vec2};

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFollow {
    pub target: EntityId,
    /// Fraction of the remaining distance closed per tick, in `(0, 1]`.
    pub lerp: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Camera2D {
    pub position: Vec2,
    zoom: f32,
    bounds: Option<Aabb>,
    follow: Option<CameraFollow>,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::default(),
            zoom: CAMERA_ZOOM_DEFAULT,
            bounds: None,
            follow: None,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }

    pub fn pixels_per_world(&self) -> f32 {
        PIXELS_PER_WORLD * self.effective_zoom()
    }

    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = Some(bounds);
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn start_follow(&mut self, target: EntityId, lerp: f32) {
        let lerp = if lerp.is_finite() {
            lerp.clamp(f32::EPSILON, 1.0)
        } else {
            1.0
        };
        self.follow = Some(CameraFollow { target, lerp });
    }

    pub fn follow(&self) -> Option<CameraFollow> {
        self.follow
    }

    pub fn stop_follow(&mut self) {
        self.follow = None;
    }

    pub(crate) fn update(&mut self, follow_position: Option<Vec2>, viewport_px: (u32, u32)) {
        if let (Some(follow), Some(target)) = (self.follow, follow_position) {
            self.position = self.position + (target - self.position) * follow.lerp;
        }
        self.clamp_to_bounds(viewport_px);
    }

    /// Keeps the visible rectangle inside the bounds; centers on an axis where
    /// the bounds are smaller than the view.
    fn clamp_to_bounds(&mut self, viewport_px: (u32, u32)) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let pixels_per_world = self.pixels_per_world();
        let half_w = viewport_px.0 as f32 / (2.0 * pixels_per_world);
        let half_h = viewport_px.1 as f32 / (2.0 * pixels_per_world);
        self.position.x = clamp_axis(self.position.x, bounds.min.x, bounds.max.x, half_w);
        self.position.y = clamp_axis(self.position.y, bounds.min.y, bounds.max.y, half_h);
    }
}

fn clamp_axis(value: f32, min: f32, max: f32, half_view: f32) -> f32 {
    if max - min <= half_view * 2.0 {
        return (min + max) * 0.5;
    }
    value.clamp(min + half_view, max - half_view)
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}
