mod camera;
mod input;
mod loop_runner;
mod metrics;
mod physics;
mod rendering;
mod scene;
mod tilemap;
mod tools;
mod ui;
mod world;

pub use camera::{Camera2D, CameraFollow, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN};
pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use physics::{Aabb, Body, BodyKind, Contact};
pub use rendering::{
    screen_to_world_px, text_width_px, world_to_screen_px, Renderer, TextureError,
    TexturePainter, TextureStore, GLYPH_ADVANCE_PX, LINE_ADVANCE_PX, PIXELS_PER_WORLD,
};
pub use scene::{InputSnapshot, Scene, SceneCommand};
pub use tilemap::{TileDef, Tilemap, TilemapError};
pub use ui::{wrap_text, ScreenRect, UiLayer, UiPanel, UiText};
pub use world::{Entity, EntityId, RenderableDesc, SceneWorld, Transform, Vec2};
