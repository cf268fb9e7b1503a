pub(crate) const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;
pub(crate) const TEXT_SCALE: i32 = 3;
pub const GLYPH_ADVANCE_PX: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
pub const LINE_ADVANCE_PX: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;

// Packed 3x5 bitmaps, five 3-bit rows from top to bottom.
const fn rows(bits: u16) -> [u8; GLYPH_HEIGHT as usize] {
    [
        ((bits >> 12) & 0b111) as u8,
        ((bits >> 9) & 0b111) as u8,
        ((bits >> 6) & 0b111) as u8,
        ((bits >> 3) & 0b111) as u8,
        (bits & 0b111) as u8,
    ]
}

fn packed_glyph(ch: char) -> Option<u16> {
    let bits = match ch.to_ascii_uppercase() {
        ' ' => 0,
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_010_010_010,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b010_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b011_100_100_100_011,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_110_100_111,
        'F' => 0b111_100_110_100_100,
        'G' => 0b011_100_101_101_011,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_010,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101,
        'N' => 0b110_101_101_101_101,
        'O' => 0b010_101_101_101_010,
        'P' => 0b110_101_110_100_100,
        'Q' => 0b010_101_101_110_011,
        'R' => 0b110_101_110_101_101,
        'S' => 0b011_100_010_001_110,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_111_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '!' => 0b010_010_010_000_010,
        '"' => 0b101_101_000_000_000,
        '#' => 0b101_111_101_111_101,
        '%' => 0b101_001_010_100_101,
        '&' => 0b010_101_010_101_011,
        '\'' => 0b010_010_000_000_000,
        '(' => 0b001_010_010_010_001,
        ')' => 0b100_010_010_010_100,
        '*' => 0b000_101_010_101_000,
        '+' => 0b000_010_111_010_000,
        ',' => 0b000_000_000_010_100,
        '-' => 0b000_000_111_000_000,
        '.' => 0b000_000_000_000_010,
        '/' => 0b001_001_010_100_100,
        ':' => 0b000_010_000_010_000,
        ';' => 0b000_010_000_010_100,
        '<' => 0b001_010_100_010_001,
        '=' => 0b000_111_000_111_000,
        '>' => 0b100_010_001_010_100,
        '?' => 0b111_001_011_000_010,
        '[' => 0b011_010_010_010_011,
        ']' => 0b110_010_010_010_110,
        '_' => 0b000_000_000_000_111,
        '|' => 0b010_010_010_010_010,
        _ => return None,
    };
    Some(bits)
}

/// Glyph rows for `ch`; lowercase folds to uppercase and anything else
/// falls back to `?`.
pub(crate) fn glyph_for(ch: char) -> [u8; GLYPH_HEIGHT as usize] {
    let bits = packed_glyph(ch)
        .or_else(|| packed_glyph('?'))
        .unwrap_or(0);
    rows(bits)
}

pub fn text_width_px(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE_PX
}
