use crate::app::{Camera2D, Vec2};

/// Screen pixels per world unit (one tile) at zoom 1.
pub const PIXELS_PER_WORLD: f32 = 32.0;

/// World is y-up, screen is y-down with the camera at the viewport center.
pub fn world_to_screen_px(camera: &Camera2D, window_size: (u32, u32), world: Vec2) -> Vec2 {
    let pixels_per_world = camera.pixels_per_world();
    Vec2 {
        x: (world.x - camera.position.x) * pixels_per_world + window_size.0 as f32 * 0.5,
        y: window_size.1 as f32 * 0.5 - (world.y - camera.position.y) * pixels_per_world,
    }
}

pub fn screen_to_world_px(camera: &Camera2D, window_size: (u32, u32), screen_px: Vec2) -> Vec2 {
    let pixels_per_world = camera.pixels_per_world();
    Vec2 {
        x: camera.position.x + (screen_px.x - window_size.0 as f32 * 0.5) / pixels_per_world,
        y: camera.position.y - (screen_px.y - window_size.1 as f32 * 0.5) / pixels_per_world,
    }
}
