mod font;
mod frame;
mod renderer;
mod textures;
mod transform;

pub use font::{text_width_px, GLYPH_ADVANCE_PX, LINE_ADVANCE_PX};
pub use renderer::Renderer;
pub use textures::{TextureError, TexturePainter, TextureStore};
pub use transform::{screen_to_world_px, world_to_screen_px, PIXELS_PER_WORLD};
