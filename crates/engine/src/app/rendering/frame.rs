use super::font::{glyph_for, GLYPH_ADVANCE_PX, GLYPH_WIDTH, TEXT_SCALE};

/// Borrowed RGBA8 framebuffer with clipped drawing primitives.
pub(crate) struct Frame<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let byte_offset = pixel.checked_mul(4)?;
        (byte_offset + 4 <= self.pixels.len()).then_some(byte_offset)
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let offset = self.offset(x, y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(out)
    }

    /// Source-over blend; the destination stays opaque.
    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let alpha = u16::from(color[3]);
        if alpha == 0 {
            return;
        }
        let dst = &mut self.pixels[offset..offset + 4];
        if alpha == 255 {
            dst.copy_from_slice(&[color[0], color[1], color[2], 255]);
            return;
        }
        for channel in 0..3 {
            let src = u16::from(color[channel]);
            let old = u16::from(dst[channel]);
            dst[channel] = ((src * alpha + old * (255 - alpha)) / 255) as u8;
        }
        dst[3] = 255;
    }

    pub(crate) fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: [u8; 4]) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(width).min(self.width as i32);
        let end_y = y.saturating_add(height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.blend_pixel(px, py, color);
            }
        }
    }

    pub(crate) fn stroke_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: [u8; 4]) {
        if width <= 1 || height <= 1 {
            return;
        }
        self.fill_rect(x, y, width, 1, color);
        self.fill_rect(x, y + height - 1, width, 1, color);
        self.fill_rect(x, y + 1, 1, height - 2, color);
        self.fill_rect(x + width - 1, y + 1, 1, height - 2, color);
    }

    /// Draws `text` with its top-left corner at `(x, y)`. Characters without a
    /// glyph render as `?`.
    pub(crate) fn draw_text(&mut self, x: i32, y: i32, text: &str, color: [u8; 4]) {
        let mut pen_x = x;
        for ch in text.chars() {
            let rows = glyph_for(ch);
            for (row_index, row_bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    self.fill_rect(
                        pen_x + col * TEXT_SCALE,
                        y + row_index as i32 * TEXT_SCALE,
                        TEXT_SCALE,
                        TEXT_SCALE,
                        color,
                    );
                }
            }
            pen_x += GLYPH_ADVANCE_PX;
        }
    }

    /// Nearest-neighbour blit of an RGBA image stretched over the given
    /// screen rectangle.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn blit_scaled(
        &mut self,
        image: &image::RgbaImage,
        left: i32,
        top: i32,
        scaled_width: u32,
        scaled_height: u32,
        tint: Option<[u8; 3]>,
    ) {
        let (src_w, src_h) = image.dimensions();
        if src_w == 0 || src_h == 0 || scaled_width == 0 || scaled_height == 0 {
            return;
        }
        let draw_left = left.max(0);
        let draw_top = top.max(0);
        let draw_right = left.saturating_add(scaled_width as i32).min(self.width as i32);
        let draw_bottom = top.saturating_add(scaled_height as i32).min(self.height as i32);

        for out_y in draw_top..draw_bottom {
            let src_y = ((out_y - top) as u64 * u64::from(src_h) / u64::from(scaled_height)) as u32;
            for out_x in draw_left..draw_right {
                let src_x =
                    ((out_x - left) as u64 * u64::from(src_w) / u64::from(scaled_width)) as u32;
                let texel = image.get_pixel(src_x.min(src_w - 1), src_y.min(src_h - 1)).0;
                let color = match tint {
                    Some(tint) => [
                        multiply_channel(texel[0], tint[0]),
                        multiply_channel(texel[1], tint[1]),
                        multiply_channel(texel[2], tint[2]),
                        texel[3],
                    ],
                    None => texel,
                };
                self.blend_pixel(out_x, out_y, color);
            }
        }
    }
}

fn multiply_channel(value: u8, tint: u8) -> u8 {
    ((u16::from(value) * u16::from(tint)) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> Vec<u8> {
        vec![0u8; (width * height * 4) as usize]
    }

    #[test]
    fn fill_rect_is_clipped_to_frame() {
        let mut pixels = blank(4, 4);
        let mut frame = Frame::new(&mut pixels, 4, 4);
        frame.fill_rect(-2, -2, 4, 4, [255, 0, 0, 255]);
        assert_eq!(frame.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(2, 2), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(9, 9), None);
    }

    #[test]
    fn half_alpha_blends_with_destination() {
        let mut pixels = blank(1, 1);
        let mut frame = Frame::new(&mut pixels, 1, 1);
        frame.clear([0, 0, 0, 255]);
        frame.blend_pixel(0, 0, [255, 255, 255, 128]);
        let [r, g, b, a] = frame.pixel(0, 0).expect("pixel");
        assert_eq!((r, g, b, a), (128, 128, 128, 255));
    }

    #[test]
    fn text_draws_lit_cells_only() {
        let mut pixels = blank(64, 32);
        let mut frame = Frame::new(&mut pixels, 64, 32);
        frame.draw_text(0, 0, "1", [255, 255, 255, 255]);
        // "1" has its top row lit only in the middle column.
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(TEXT_SCALE, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn black_tint_produces_silhouette() {
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 100, 50, 255]));
        let mut pixels = blank(4, 4);
        let mut frame = Frame::new(&mut pixels, 4, 4);
        frame.clear([255, 255, 255, 255]);
        frame.blit_scaled(&image, 0, 0, 4, 4, Some([0, 0, 0]));
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(frame.pixel(3, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn blit_skips_transparent_texels() {
        let mut image = image::RgbaImage::new(2, 1);
        image.put_pixel(1, 0, image::Rgba([10, 20, 30, 255]));
        let mut pixels = blank(2, 1);
        let mut frame = Frame::new(&mut pixels, 2, 1);
        frame.blit_scaled(&image, 0, 0, 2, 1, None);
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(1, 0), Some([10, 20, 30, 255]));
    }
}
