use std::collections::HashSet;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{Camera2D, Entity, SceneWorld, Tilemap, UiPanel, Vec2};

use super::font::{text_width_px, GLYPH_HEIGHT, LINE_ADVANCE_PX, TEXT_SCALE};
use super::frame::Frame;
use super::{world_to_screen_px, PIXELS_PER_WORLD};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const TILE_FALLBACK_COLOR: [u8; 4] = [68, 74, 62, 255];
const ENTITY_FALLBACK_COLOR: [u8; 4] = [220, 220, 240, 255];
const ENTITY_FALLBACK_HALF_SIZE_WORLD: f32 = 0.25;
const VIEW_CULL_PADDING_PX: f32 = 16.0;
const PANEL_INSET_PX: f32 = 12.0;

#[derive(Debug, Clone, Copy)]
struct WorldBounds {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileRectInclusive {
    x_min: u32,
    x_max: u32,
    y_min: u32,
    y_max: u32,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
    warned_missing_texture_keys: HashSet<String>,
    draw_order_scratch: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
            warned_missing_texture_keys: HashSet::new(),
            draw_order_scratch: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        overlay: Option<&UiPanel>,
    ) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }
        let mut frame = Frame::new(self.pixels.frame_mut(), self.width, self.height);
        draw_scene(
            &mut frame,
            world,
            overlay,
            &mut self.warned_missing_texture_keys,
            &mut self.draw_order_scratch,
        );
        self.pixels.render()
    }
}

fn draw_scene(
    frame: &mut Frame<'_>,
    world: &SceneWorld,
    overlay: Option<&UiPanel>,
    warned_missing_texture_keys: &mut HashSet<String>,
    draw_order: &mut Vec<usize>,
) {
    frame.clear(CLEAR_COLOR);
    let window_size = (frame.width(), frame.height());
    let view_bounds = view_bounds_world(world.camera(), window_size, VIEW_CULL_PADDING_PX);

    if let Some(tilemap) = world.tilemap() {
        draw_tilemap(frame, world, tilemap, &view_bounds, warned_missing_texture_keys);
    }

    collect_sorted_draw_order(world.entities(), draw_order);
    for &index in draw_order.iter() {
        let entity = &world.entities()[index];
        draw_entity(frame, world, entity, &view_bounds, warned_missing_texture_keys);
    }

    for panel in world.ui().panels() {
        draw_panel(frame, panel);
    }
    if let Some(panel) = overlay {
        draw_panel(frame, panel);
    }
}

fn draw_tilemap(
    frame: &mut Frame<'_>,
    world: &SceneWorld,
    tilemap: &Tilemap,
    view_bounds: &WorldBounds,
    warned_missing_texture_keys: &mut HashSet<String>,
) {
    let Some(visible) = visible_tile_rect(tilemap, view_bounds) else {
        return;
    };
    let camera = world.camera();
    let window_size = (frame.width(), frame.height());
    let origin = tilemap.origin();

    for y in visible.y_min..=visible.y_max {
        for x in visible.x_min..=visible.x_max {
            let Some(def) = tilemap.tile_def_at(x, y) else {
                continue;
            };
            // Corners are projected separately so neighbouring tiles share
            // edges exactly at fractional zoom.
            let top_left = world_to_screen_px(
                camera,
                window_size,
                Vec2::new(origin.x + x as f32, origin.y + y as f32 + 1.0),
            );
            let bottom_right = world_to_screen_px(
                camera,
                window_size,
                Vec2::new(origin.x + x as f32 + 1.0, origin.y + y as f32),
            );
            let left = top_left.x.round() as i32;
            let top = top_left.y.round() as i32;
            let width = (bottom_right.x.round() as i32 - left).max(1);
            let height = (bottom_right.y.round() as i32 - top).max(1);

            match world.textures().get(&def.texture_key) {
                Some(image) => {
                    frame.blit_scaled(image, left, top, width as u32, height as u32, None)
                }
                None => {
                    warn_missing_texture_once(warned_missing_texture_keys, &def.texture_key);
                    frame.fill_rect(left, top, width, height, TILE_FALLBACK_COLOR);
                }
            }
        }
    }
}

fn draw_entity(
    frame: &mut Frame<'_>,
    world: &SceneWorld,
    entity: &Entity,
    view_bounds: &WorldBounds,
    warned_missing_texture_keys: &mut HashSet<String>,
) {
    let camera = world.camera();
    let zoom = camera.effective_zoom();
    let window_size = (frame.width(), frame.height());
    let center = world_to_screen_px(camera, window_size, entity.transform.position);
    let renderable = &entity.renderable;

    match world.textures().get(&renderable.texture_key) {
        Some(image) => {
            let (texture_w, texture_h) = image.dimensions();
            let half_w_world = texture_w as f32 / PIXELS_PER_WORLD * 0.5;
            let half_h_world = texture_h as f32 / PIXELS_PER_WORLD * 0.5;
            if !bounds_intersects_box(view_bounds, entity.transform.position, half_w_world, half_h_world)
            {
                return;
            }
            let scaled_w = (texture_w as f32 * zoom).round().max(1.0) as u32;
            let scaled_h = (texture_h as f32 * zoom).round().max(1.0) as u32;
            let left = center.x.round() as i32 - scaled_w as i32 / 2;
            let top = center.y.round() as i32 - scaled_h as i32 / 2;
            frame.blit_scaled(image, left, top, scaled_w, scaled_h, renderable.tint);
        }
        None => {
            warn_missing_texture_once(warned_missing_texture_keys, &renderable.texture_key);
            let half_px = (ENTITY_FALLBACK_HALF_SIZE_WORLD * camera.pixels_per_world())
                .round()
                .max(1.0) as i32;
            frame.fill_rect(
                center.x.round() as i32 - half_px,
                center.y.round() as i32 - half_px,
                half_px * 2,
                half_px * 2,
                ENTITY_FALLBACK_COLOR,
            );
        }
    }
}

fn draw_panel(frame: &mut Frame<'_>, panel: &UiPanel) {
    let rect = panel.rect;
    let left = rect.x.round() as i32;
    let top = rect.y.round() as i32;
    let width = rect.width.round() as i32;
    let height = rect.height.round() as i32;
    frame.fill_rect(left, top, width, height, panel.background);
    if let Some(border) = panel.border {
        frame.stroke_rect(left, top, width, height, border);
    }

    let block_height = panel.lines.len() as i32 * LINE_ADVANCE_PX;
    let mut y = if panel.centered {
        top + (height - block_height) / 2 + (LINE_ADVANCE_PX - GLYPH_HEIGHT * TEXT_SCALE) / 2
    } else {
        top + PANEL_INSET_PX as i32
    };
    for line in &panel.lines {
        let x = if panel.centered {
            left + (width - text_width_px(&line.text)) / 2
        } else {
            left + PANEL_INSET_PX as i32
        };
        frame.draw_text(x, y, &line.text, line.color);
        y += LINE_ADVANCE_PX;
    }
}

/// Indices into `entities` ordered by depth, then by the order they entered
/// the world.
fn collect_sorted_draw_order(entities: &[Entity], out: &mut Vec<usize>) {
    out.clear();
    out.extend(0..entities.len());
    out.sort_by_key(|&index| {
        let entity = &entities[index];
        (entity.renderable.depth, entity.applied_spawn_order())
    });
}

fn warn_missing_texture_once(warned: &mut HashSet<String>, key: &str) {
    if warned.insert(key.to_string()) {
        warn!(texture_key = key, "texture_missing_using_fallback");
    }
}

fn view_bounds_world(camera: &Camera2D, window_size: (u32, u32), padding_px: f32) -> WorldBounds {
    let pixels_per_world = camera.pixels_per_world();
    let safe_pixels_per_world = if pixels_per_world.is_finite() && pixels_per_world > f32::EPSILON {
        pixels_per_world
    } else {
        PIXELS_PER_WORLD
    };
    let half_w_world = window_size.0 as f32 / (2.0 * safe_pixels_per_world);
    let half_h_world = window_size.1 as f32 / (2.0 * safe_pixels_per_world);
    let padding_world = padding_px.max(0.0) / safe_pixels_per_world;

    WorldBounds {
        min_x: camera.position.x - half_w_world - padding_world,
        max_x: camera.position.x + half_w_world + padding_world,
        min_y: camera.position.y - half_h_world - padding_world,
        max_y: camera.position.y + half_h_world + padding_world,
    }
}

fn bounds_intersects_box(bounds: &WorldBounds, center: Vec2, half_w: f32, half_h: f32) -> bool {
    !(center.x + half_w < bounds.min_x
        || center.x - half_w > bounds.max_x
        || center.y + half_h < bounds.min_y
        || center.y - half_h > bounds.max_y)
}

fn visible_tile_rect(tilemap: &Tilemap, bounds: &WorldBounds) -> Option<TileRectInclusive> {
    if tilemap.width() == 0 || tilemap.height() == 0 {
        return None;
    }

    let origin = tilemap.origin();
    let raw_x_min = (bounds.min_x - origin.x).floor() as i64;
    let raw_x_max = (bounds.max_x - origin.x).ceil() as i64 - 1;
    let raw_y_min = (bounds.min_y - origin.y).floor() as i64;
    let raw_y_max = (bounds.max_y - origin.y).ceil() as i64 - 1;

    let x_min = raw_x_min.max(0);
    let x_max = raw_x_max.min(i64::from(tilemap.width()) - 1);
    let y_min = raw_y_min.max(0);
    let y_max = raw_y_max.min(i64::from(tilemap.height()) - 1);
    if x_min > x_max || y_min > y_max {
        return None;
    }

    Some(TileRectInclusive {
        x_min: x_min as u32,
        x_max: x_max as u32,
        y_min: y_min as u32,
        y_max: y_max as u32,
    })
}
