use std::path::Path;

use engine::{TextureError, TexturePainter, TextureStore};

use super::city::{BUILDING_TEXTURE_KEY, GRASS_TEXTURE_KEY, ROAD_TEXTURE_KEY};

pub(crate) const PLAYER_TEXTURE_KEY: &str = "actor/player";
pub(crate) const NPC_TEXTURE_KEY: &str = "actor/npc";

const TEXTURE_SIZE_PX: u32 = 32;
const ACTOR_RADIUS_PX: f32 = 14.0;

const PLAYER_COLOR: [u8; 4] = [0x34, 0x98, 0xdb, 0xff];
const PLAYER_OUTLINE_COLOR: [u8; 4] = [0xff, 0xff, 0xff, 0xff];
const NPC_COLOR: [u8; 4] = [0xe7, 0x4c, 0x3c, 0xff];
const ROAD_COLOR: [u8; 4] = [0x7f, 0x8c, 0x8d, 0xff];
const BUILDING_COLOR: [u8; 4] = [0x2c, 0x3e, 0x50, 0xff];
const BUILDING_TRIM_COLOR: [u8; 4] = [0xbd, 0xc3, 0xc7, 0xff];
const GRASS_COLOR: [u8; 4] = [0x27, 0xae, 0x60, 0xff];

pub(crate) const TEXTURE_KEYS: [&str; 5] = [
    PLAYER_TEXTURE_KEY,
    NPC_TEXTURE_KEY,
    ROAD_TEXTURE_KEY,
    BUILDING_TEXTURE_KEY,
    GRASS_TEXTURE_KEY,
];

fn paint(key: &str) -> TexturePainter {
    let mut painter = TexturePainter::new(TEXTURE_SIZE_PX, TEXTURE_SIZE_PX);
    let center = TEXTURE_SIZE_PX as f32 * 0.5;
    match key {
        PLAYER_TEXTURE_KEY => {
            painter.fill_circle(center, center, ACTOR_RADIUS_PX, PLAYER_COLOR);
            painter.stroke_circle(center, center, ACTOR_RADIUS_PX, 2.0, PLAYER_OUTLINE_COLOR);
        }
        NPC_TEXTURE_KEY => painter.fill_circle(center, center, ACTOR_RADIUS_PX, NPC_COLOR),
        ROAD_TEXTURE_KEY => {
            painter.fill_rect(0, 0, TEXTURE_SIZE_PX, TEXTURE_SIZE_PX, ROAD_COLOR)
        }
        BUILDING_TEXTURE_KEY => {
            painter.fill_rect(0, 0, TEXTURE_SIZE_PX, TEXTURE_SIZE_PX, BUILDING_COLOR);
            painter.stroke_rect(2, 2, 28, 28, 2, BUILDING_TRIM_COLOR);
        }
        GRASS_TEXTURE_KEY => {
            painter.fill_rect(0, 0, TEXTURE_SIZE_PX, TEXTURE_SIZE_PX, GRASS_COLOR)
        }
        _ => {}
    }
    painter
}

/// Registers the generated textures, then swaps in `<dir>/<key>.png` for any
/// key that has a file there. Returns the number of overrides loaded.
pub(crate) fn register_textures(
    store: &mut TextureStore,
    override_dir: Option<&Path>,
) -> Result<usize, TextureError> {
    for key in TEXTURE_KEYS {
        store.insert(key, paint(key).finish())?;
    }

    let Some(dir) = override_dir else {
        return Ok(0);
    };
    let mut overrides = 0;
    for key in TEXTURE_KEYS {
        if store.load_png_override(dir, key)? {
            overrides += 1;
        }
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn pixel(store: &TextureStore, key: &str, x: u32, y: u32) -> [u8; 4] {
        store.get(key).expect("texture").get_pixel(x, y).0
    }

    #[test]
    fn all_keys_are_generated() {
        let mut store = TextureStore::default();
        assert_eq!(register_textures(&mut store, None).expect("register"), 0);
        assert_eq!(store.len(), TEXTURE_KEYS.len());
        for key in TEXTURE_KEYS {
            assert_eq!(
                store.get(key).map(|image| image.dimensions()),
                Some((TEXTURE_SIZE_PX, TEXTURE_SIZE_PX))
            );
        }
    }

    #[test]
    fn actors_are_circles_and_tiles_are_filled() {
        let mut store = TextureStore::default();
        register_textures(&mut store, None).expect("register");
        assert_eq!(pixel(&store, PLAYER_TEXTURE_KEY, 16, 16), PLAYER_COLOR);
        assert_eq!(pixel(&store, PLAYER_TEXTURE_KEY, 16, 2), PLAYER_OUTLINE_COLOR);
        assert_eq!(pixel(&store, NPC_TEXTURE_KEY, 16, 16), NPC_COLOR);
        assert_eq!(pixel(&store, NPC_TEXTURE_KEY, 0, 0)[3], 0);
        assert_eq!(pixel(&store, ROAD_TEXTURE_KEY, 0, 0), ROAD_COLOR);
        assert_eq!(pixel(&store, BUILDING_TEXTURE_KEY, 2, 16), BUILDING_TRIM_COLOR);
        assert_eq!(pixel(&store, BUILDING_TEXTURE_KEY, 16, 16), BUILDING_COLOR);
        assert_eq!(pixel(&store, GRASS_TEXTURE_KEY, 31, 31), GRASS_COLOR);
    }

    #[test]
    fn empty_override_dir_keeps_generated_textures() {
        let temp = TempDir::new().expect("temp");
        let mut store = TextureStore::default();
        let overrides = register_textures(&mut store, Some(temp.path())).expect("register");
        assert_eq!(overrides, 0);
        assert_eq!(pixel(&store, GRASS_TEXTURE_KEY, 0, 0), GRASS_COLOR);
    }

    #[test]
    fn broken_override_is_an_error() {
        let temp = TempDir::new().expect("temp");
        std::fs::create_dir_all(temp.path().join("tile")).expect("mkdir");
        std::fs::write(temp.path().join("tile").join("road.png"), b"nope").expect("write");
        let mut store = TextureStore::default();
        let err = register_textures(&mut store, Some(temp.path())).expect_err("decode");
        assert!(matches!(err, TextureError::Decode { .. }));
    }
}
