//! Embedded 8x8 bitmap font and text layout.
//!
//! Glyphs are drawn by nearest-neighbor scaling the 8x8 cells, so band
//! textures need no font file or rasterizer dependency. Metrics follow
//! east-asian width conventions: narrow glyphs advance half an em, wide
//! glyphs (CJK ideographs, kana, hangul) a full em. Wide glyphs have no
//! bitmap and render as a hollow placeholder box, but their metrics are
//! exact, which is what the band repeat computation depends on.

use crate::raster::Raster;

/// Glyph cell size in font units.
pub const GLYPH_SIZE: u32 = 8;

/// Bitmaps for ASCII 0x20..=0x7F, one byte per row, top row first.
/// Bit 0 of each byte is the leftmost column.
const FONT: [[u8; 8]; 96] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x18, 0x3C, 0x3C, 0x18, 0x18, 0x00, 0x18, 0x00], // '!'
    [0x36, 0x36, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x36, 0x36, 0x7F, 0x36, 0x7F, 0x36, 0x36, 0x00], // '#'
    [0x0C, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x0C, 0x00], // '$'
    [0x00, 0x63, 0x33, 0x18, 0x0C, 0x66, 0x63, 0x00], // '%'
    [0x1C, 0x36, 0x1C, 0x6E, 0x3B, 0x33, 0x6E, 0x00], // '&'
    [0x06, 0x06, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00], // '\''
    [0x18, 0x0C, 0x06, 0x06, 0x06, 0x0C, 0x18, 0x00], // '('
    [0x06, 0x0C, 0x18, 0x18, 0x18, 0x0C, 0x06, 0x00], // ')'
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // '*'
    [0x00, 0x0C, 0x0C, 0x3F, 0x0C, 0x0C, 0x00, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ','
    [0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00], // '.'
    [0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01, 0x00], // '/'
    [0x3E, 0x63, 0x73, 0x7B, 0x6F, 0x67, 0x3E, 0x00], // '0'
    [0x0C, 0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x3F, 0x00], // '1'
    [0x1E, 0x33, 0x30, 0x1C, 0x06, 0x33, 0x3F, 0x00], // '2'
    [0x1E, 0x33, 0x30, 0x1C, 0x30, 0x33, 0x1E, 0x00], // '3'
    [0x38, 0x3C, 0x36, 0x33, 0x7F, 0x30, 0x78, 0x00], // '4'
    [0x3F, 0x03, 0x1F, 0x30, 0x30, 0x33, 0x1E, 0x00], // '5'
    [0x1C, 0x06, 0x03, 0x1F, 0x33, 0x33, 0x1E, 0x00], // '6'
    [0x3F, 0x33, 0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x00], // '7'
    [0x1E, 0x33, 0x33, 0x1E, 0x33, 0x33, 0x1E, 0x00], // '8'
    [0x1E, 0x33, 0x33, 0x3E, 0x30, 0x18, 0x0E, 0x00], // '9'
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x00], // ':'
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ';'
    [0x18, 0x0C, 0x06, 0x03, 0x06, 0x0C, 0x18, 0x00], // '<'
    [0x00, 0x00, 0x3F, 0x00, 0x00, 0x3F, 0x00, 0x00], // '='
    [0x06, 0x0C, 0x18, 0x30, 0x18, 0x0C, 0x06, 0x00], // '>'
    [0x1E, 0x33, 0x30, 0x18, 0x0C, 0x00, 0x0C, 0x00], // '?'
    [0x3E, 0x63, 0x7B, 0x7B, 0x7B, 0x03, 0x1E, 0x00], // '@'
    [0x0C, 0x1E, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x00], // 'A'
    [0x3F, 0x66, 0x66, 0x3E, 0x66, 0x66, 0x3F, 0x00], // 'B'
    [0x3C, 0x66, 0x03, 0x03, 0x03, 0x66, 0x3C, 0x00], // 'C'
    [0x1F, 0x36, 0x66, 0x66, 0x66, 0x36, 0x1F, 0x00], // 'D'
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x46, 0x7F, 0x00], // 'E'
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x06, 0x0F, 0x00], // 'F'
    [0x3C, 0x66, 0x03, 0x03, 0x73, 0x66, 0x7C, 0x00], // 'G'
    [0x33, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x33, 0x00], // 'H'
    [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'I'
    [0x78, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E, 0x00], // 'J'
    [0x67, 0x66, 0x36, 0x1E, 0x36, 0x66, 0x67, 0x00], // 'K'
    [0x0F, 0x06, 0x06, 0x06, 0x46, 0x66, 0x7F, 0x00], // 'L'
    [0x63, 0x77, 0x7F, 0x7F, 0x6B, 0x63, 0x63, 0x00], // 'M'
    [0x63, 0x67, 0x6F, 0x7B, 0x73, 0x63, 0x63, 0x00], // 'N'
    [0x1C, 0x36, 0x63, 0x63, 0x63, 0x36, 0x1C, 0x00], // 'O'
    [0x3F, 0x66, 0x66, 0x3E, 0x06, 0x06, 0x0F, 0x00], // 'P'
    [0x1E, 0x33, 0x33, 0x33, 0x3B, 0x1E, 0x38, 0x00], // 'Q'
    [0x3F, 0x66, 0x66, 0x3E, 0x36, 0x66, 0x67, 0x00], // 'R'
    [0x1E, 0x33, 0x07, 0x0E, 0x38, 0x33, 0x1E, 0x00], // 'S'
    [0x3F, 0x2D, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'T'
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x33, 0x3F, 0x00], // 'U'
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // 'V'
    [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // 'W'
    [0x63, 0x63, 0x36, 0x1C, 0x1C, 0x36, 0x63, 0x00], // 'X'
    [0x33, 0x33, 0x33, 0x1E, 0x0C, 0x0C, 0x1E, 0x00], // 'Y'
    [0x7F, 0x63, 0x31, 0x18, 0x4C, 0x66, 0x7F, 0x00], // 'Z'
    [0x1E, 0x06, 0x06, 0x06, 0x06, 0x06, 0x1E, 0x00], // '['
    [0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x40, 0x00], // '\\'
    [0x1E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1E, 0x00], // ']'
    [0x08, 0x1C, 0x36, 0x63, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // '_'
    [0x0C, 0x0C, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00], // '`'
    [0x00, 0x00, 0x1E, 0x30, 0x3E, 0x33, 0x6E, 0x00], // 'a'
    [0x07, 0x06, 0x06, 0x3E, 0x66, 0x66, 0x3B, 0x00], // 'b'
    [0x00, 0x00, 0x1E, 0x33, 0x03, 0x33, 0x1E, 0x00], // 'c'
    [0x38, 0x30, 0x30, 0x3E, 0x33, 0x33, 0x6E, 0x00], // 'd'
    [0x00, 0x00, 0x1E, 0x33, 0x3F, 0x03, 0x1E, 0x00], // 'e'
    [0x1C, 0x36, 0x06, 0x0F, 0x06, 0x06, 0x0F, 0x00], // 'f'
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x1F], // 'g'
    [0x07, 0x06, 0x36, 0x6E, 0x66, 0x66, 0x67, 0x00], // 'h'
    [0x0C, 0x00, 0x0E, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'i'
    [0x30, 0x00, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E], // 'j'
    [0x07, 0x06, 0x66, 0x36, 0x1E, 0x36, 0x67, 0x00], // 'k'
    [0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'l'
    [0x00, 0x00, 0x33, 0x7F, 0x7F, 0x6B, 0x63, 0x00], // 'm'
    [0x00, 0x00, 0x1F, 0x33, 0x33, 0x33, 0x33, 0x00], // 'n'
    [0x00, 0x00, 0x1E, 0x33, 0x33, 0x33, 0x1E, 0x00], // 'o'
    [0x00, 0x00, 0x3B, 0x66, 0x66, 0x3E, 0x06, 0x0F], // 'p'
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x78], // 'q'
    [0x00, 0x00, 0x3B, 0x6E, 0x66, 0x06, 0x0F, 0x00], // 'r'
    [0x00, 0x00, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x00], // 's'
    [0x08, 0x0C, 0x3E, 0x0C, 0x0C, 0x2C, 0x18, 0x00], // 't'
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x33, 0x6E, 0x00], // 'u'
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // 'v'
    [0x00, 0x00, 0x63, 0x6B, 0x7F, 0x7F, 0x36, 0x00], // 'w'
    [0x00, 0x00, 0x63, 0x36, 0x1C, 0x36, 0x63, 0x00], // 'x'
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x3E, 0x30, 0x1F], // 'y'
    [0x00, 0x00, 0x3F, 0x19, 0x0C, 0x26, 0x3F, 0x00], // 'z'
    [0x38, 0x0C, 0x0C, 0x07, 0x0C, 0x0C, 0x38, 0x00], // '{'
    [0x18, 0x18, 0x18, 0x00, 0x18, 0x18, 0x18, 0x00], // '|'
    [0x07, 0x0C, 0x0C, 0x38, 0x0C, 0x0C, 0x07, 0x00], // '}'
    [0x6E, 0x3B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // '~'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // DEL
];

/// Bitmap for a printable ASCII character, if it has one.
pub fn glyph(c: char) -> Option<&'static [u8; 8]> {
    let code = c as u32;
    if (0x20..0x7F).contains(&code) {
        Some(&FONT[(code - 0x20) as usize])
    } else {
        None
    }
}

/// Whether a character occupies a full em cell (CJK ideographs, kana,
/// hangul syllables).
pub fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x309F   // hiragana
        | 0x30A0..=0x30FF // katakana
        | 0x4E00..=0x9FFF // CJK unified ideographs
        | 0xAC00..=0xD7AF // hangul syllables
    )
}

/// Horizontal advance of one character at em size `px`.
pub fn advance(c: char, px: f32, spacing: f32) -> f32 {
    let cell = if is_wide(c) { px } else { px / 2.0 };
    cell * spacing
}

/// Width of a string at em size `px` with a letter-spacing multiplier.
pub fn measure_text(text: &str, px: f32, spacing: f32) -> f32 {
    text.chars().map(|c| advance(c, px, spacing)).sum()
}

/// Draw a string with its top-left corner at `(x, y)`. Returns the pen
/// x position after the last character.
pub fn draw_text(
    raster: &mut Raster,
    text: &str,
    x: f32,
    y: f32,
    px: f32,
    spacing: f32,
    color: [u8; 4],
) -> f32 {
    let mut pen = x;
    for c in text.chars() {
        let step = advance(c, px, spacing);
        if is_wide(c) {
            draw_placeholder(raster, pen, y, px, color);
        } else if let Some(bitmap) = glyph(c) {
            draw_glyph(raster, bitmap, pen, y, px / 2.0, px, color);
        }
        pen += step;
    }
    pen
}

fn draw_glyph(
    raster: &mut Raster,
    bitmap: &[u8; 8],
    x: f32,
    y: f32,
    cell_w: f32,
    cell_h: f32,
    color: [u8; 4],
) {
    let w = cell_w.ceil() as u32;
    let h = cell_h.ceil() as u32;
    for dy in 0..h {
        let row = bitmap[(dy * GLYPH_SIZE / h.max(1)).min(7) as usize];
        for dx in 0..w {
            let col = (dx * GLYPH_SIZE / w.max(1)).min(7);
            if (row >> col) & 1 == 1 {
                let px = x as i64 + dx as i64;
                let py = y as i64 + dy as i64;
                if px >= 0 && py >= 0 {
                    raster.blend_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

// Wide glyphs render as a hollow box spanning the full em cell.
fn draw_placeholder(raster: &mut Raster, x: f32, y: f32, px: f32, color: [u8; 4]) {
    let size = px as u32;
    let inset = (px / 8.0).max(1.0) as u32;
    let stroke = inset;
    for dy in inset..size.saturating_sub(inset) {
        for dx in inset..size.saturating_sub(inset) {
            let on_edge = dx < inset + stroke
                || dx >= size.saturating_sub(inset + stroke)
                || dy < inset + stroke
                || dy >= size.saturating_sub(inset + stroke);
            if on_edge {
                let wx = x as i64 + dx as i64;
                let wy = y as i64 + dy as i64;
                if wx >= 0 && wy >= 0 {
                    raster.blend_pixel(wx as u32, wy as u32, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_glyphs_present() {
        assert!(glyph('A').is_some());
        assert!(glyph(' ').is_some());
        assert!(glyph('~').is_some());
        assert!(glyph('\n').is_none());
        assert!(glyph('愛').is_none());
    }

    #[test]
    fn test_wide_classification() {
        assert!(is_wide('愛'));
        assert!(is_wide('あ'));
        assert!(is_wide('한'));
        assert!(!is_wide('A'));
        assert!(!is_wide('/'));
    }

    #[test]
    fn test_measure_widths() {
        // narrow glyphs advance half an em, wide a full em
        assert_eq!(measure_text("AB", 16.0, 1.0), 16.0);
        assert_eq!(measure_text("愛", 16.0, 1.0), 16.0);
        assert_eq!(measure_text("", 16.0, 1.0), 0.0);
        // spacing multiplies the advance
        assert_eq!(measure_text("AB", 16.0, 1.1), 16.0 * 1.1);
    }

    #[test]
    fn test_draw_covers_pixels() {
        let mut r = Raster::new(32, 32);
        draw_text(&mut r, "I", 0.0, 0.0, 16.0, 1.0, [255, 255, 255, 255]);
        let covered = r.data.chunks_exact(4).filter(|p| p[3] > 0).count();
        assert!(covered > 0);
    }

    #[test]
    fn test_draw_returns_pen_position() {
        let mut r = Raster::new(64, 16);
        let pen = draw_text(&mut r, "AB", 2.0, 0.0, 16.0, 1.0, [255; 4]);
        assert_eq!(pen, 2.0 + 16.0);
    }
}
