use thiserror::Error;

use super::world::Vec2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDef {
    pub texture_key: String,
    pub solid: bool,
}

/// Tilemap origin convention:
/// - `origin` is the world position of tile (0,0) bottom-left corner.
/// - One tile is one world unit; the center of tile (x,y) is
///   `origin + (x + 0.5, y + 0.5)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    origin: Vec2,
    palette: Vec<TileDef>,
    tiles: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile {index} uses id {tile_id} but the palette has {palette_len} entries")]
    UnknownTileId {
        index: usize,
        tile_id: u16,
        palette_len: usize,
    },
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        origin: Vec2,
        palette: Vec<TileDef>,
        tiles: Vec<u16>,
    ) -> Result<Self, TilemapError> {
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        if let Some((index, &tile_id)) = tiles
            .iter()
            .enumerate()
            .find(|(_, &id)| usize::from(id) >= palette.len())
        {
            return Err(TilemapError::UnknownTileId {
                index,
                tile_id,
                palette_len: palette.len(),
            });
        }
        Ok(Self {
            width,
            height,
            origin,
            palette,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u16> {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn tile_def_at(&self, x: u32, y: u32) -> Option<&TileDef> {
        self.tile_at(x, y)
            .and_then(|id| self.palette.get(usize::from(id)))
    }

    /// Out-of-range cells are open; world bounds handle the map edge.
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x > i64::from(u32::MAX) || y > i64::from(u32::MAX) {
            return false;
        }
        self.tile_def_at(x as u32, y as u32)
            .map_or(false, |def| def.solid)
    }

    pub fn tile_center_world(&self, x: u32, y: u32) -> Option<Vec2> {
        self.index_of(x, y)?;
        Some(Vec2 {
            x: self.origin.x + x as f32 + 0.5,
            y: self.origin.y + y as f32 + 0.5,
        })
    }

    pub fn tile_coords_at_world(&self, position: Vec2) -> Option<(u32, u32)> {
        let local_x = (position.x - self.origin.x).floor();
        let local_y = (position.y - self.origin.y).floor();
        if local_x < 0.0 || local_y < 0.0 {
            return None;
        }
        let (x, y) = (local_x as u32, local_y as u32);
        self.index_of(x, y).map(|_| (x, y))
    }
}
