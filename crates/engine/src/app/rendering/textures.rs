use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::texture_keys::{validate_texture_key, TextureKeyError};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("invalid texture key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: TextureKeyError,
    },
    #[error("failed to decode texture '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Named RGBA textures the renderer samples by `RenderableDesc::texture_key`
/// and `TileDef::texture_key`.
#[derive(Debug, Default)]
pub struct TextureStore {
    textures: HashMap<String, RgbaImage>,
}

impl TextureStore {
    pub fn insert(&mut self, key: &str, image: RgbaImage) -> Result<(), TextureError> {
        validate_texture_key(key).map_err(|source| TextureError::InvalidKey {
            key: key.to_string(),
            source,
        })?;
        self.textures.insert(key.to_string(), image);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&RgbaImage> {
        self.textures.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Replaces `key` with `<dir>/<key>.png` when that file exists.
    /// Returns whether an override was loaded.
    pub fn load_png_override(&mut self, dir: &Path, key: &str) -> Result<bool, TextureError> {
        validate_texture_key(key).map_err(|source| TextureError::InvalidKey {
            key: key.to_string(),
            source,
        })?;
        let path = dir.join(format!("{key}.png"));
        if !path.is_file() {
            return Ok(false);
        }
        let image = image::open(&path)
            .map_err(|source| TextureError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        self.textures.insert(key.to_string(), image);
        Ok(true)
    }
}

/// Small raster painter for procedurally generated textures.
#[derive(Debug, Clone)]
pub struct TexturePainter {
    image: RgbaImage,
}

impl TexturePainter {
    /// Starts from a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: [u8; 4]) {
        let (image_w, image_h) = self.image.dimensions();
        let end_x = x.saturating_add(width).min(image_w);
        let end_y = y.saturating_add(height).min(image_h);
        for py in y..end_y {
            for px in x..end_x {
                self.image.put_pixel(px, py, Rgba(color));
            }
        }
    }

    pub fn stroke_rect(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        line_width: u32,
        color: [u8; 4],
    ) {
        let line = line_width.min(width / 2).min(height / 2).max(1);
        self.fill_rect(x, y, width, line, color);
        self.fill_rect(x, (y + height).saturating_sub(line), width, line, color);
        self.fill_rect(x, y, line, height, color);
        self.fill_rect((x + width).saturating_sub(line), y, line, height, color);
    }

    /// Pixel centers within `radius` of `(cx, cy)` are painted.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
        self.paint_where(cx, cy, color, |distance| distance <= radius);
    }

    /// Ring of `line_width` centered on the circle edge.
    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, line_width: f32, color: [u8; 4]) {
        let half = line_width * 0.5;
        let (inner, outer) = (radius - half, radius + half);
        self.paint_where(cx, cy, color, |distance| distance >= inner && distance <= outer);
    }

    fn paint_where(&mut self, cx: f32, cy: f32, color: [u8; 4], inside: impl Fn(f32) -> bool) {
        let (width, height) = self.image.dimensions();
        for py in 0..height {
            for px in 0..width {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if inside((dx * dx + dy * dy).sqrt()) {
                    self.image.put_pixel(px, py, Rgba(color));
                }
            }
        }
    }

    pub fn finish(self) -> RgbaImage {
        self.image
    }
}
