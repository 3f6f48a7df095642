//! Procedural texture synthesis.
//!
//! Every texture the scene shows is generated here at startup (the heart
//! frames once their images decode): the central glow and nebula
//! sprites, the planet surface, rounded neon frames for decoded images,
//! the repeating text bands wrapped around the rings, and the idle hint
//! sprites. All functions are pure over their inputs; the ones that look
//! "organic" (planet spots/swirls, nebula hues) take an explicit RNG.
//!
//! | Function | Output |
//! |----------|--------|
//! | [`glow_sprite`] | soft radial sprite, color fading to transparent |
//! | [`planet_surface`] | layered gradient + spots + swirl strokes |
//! | [`neon_frame`] | rounded-corner letterboxed image frame |
//! | [`text_band`] | repeating glow text strip + repeat factor |
//! | [`hint_label`] / [`hint_cursor`] / [`hint_ring`] | idle hint sprites |

use glam::Vec2;
use rand::Rng;

use crate::device::DeviceProfile;
use crate::font;
use crate::raster::Raster;

/// Expand `0xRRGGBB` into an RGBA pixel.
pub const fn rgba(hex: u32, alpha: u8) -> [u8; 4] {
    [
        ((hex >> 16) & 0xFF) as u8,
        ((hex >> 8) & 0xFF) as u8,
        (hex & 0xFF) as u8,
        alpha,
    ]
}

/// HSL to RGBA, hue in degrees, saturation/lightness in `[0, 1]`.
pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: u8) -> [u8; 4] {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let hp = hue.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
        alpha,
    ]
}

/// Planet base gradient. Positions are normalized to the raster radius;
/// the gradient proper starts a quarter of the way out (the core stays
/// flat), matching a radial ramp whose inner radius is an eighth of the
/// texture size.
pub const PLANET_GRADIENT_STOPS: [(f32, [u8; 4]); 8] = [
    (0.25, rgba(0xf8bbd0, 255)),
    (0.34, rgba(0xf48fb1, 255)),
    (0.415, rgba(0xf06292, 255)),
    (0.5125, rgba(0xffffff, 255)),
    (0.625, rgba(0xe1aaff, 255)),
    (0.715, rgba(0xa259f7, 255)),
    (0.8125, rgba(0xb2ff59, 255)),
    (1.0, rgba(0x3fd8c7, 255)),
];

/// Spot colors for the planet surface; duplicates weight the pinks.
pub const PLANET_SPOT_PALETTE: [[u8; 4]; 10] = [
    rgba(0xf8bbd0, 0xCC),
    rgba(0xf8bbd0, 0xCC),
    rgba(0xf48fb1, 0xCC),
    rgba(0xf48fb1, 0xCC),
    rgba(0xf06292, 0xCC),
    rgba(0xf06292, 0xCC),
    rgba(0xffffff, 0xCC),
    rgba(0xe1aaff, 0xCC),
    rgba(0xa259f7, 0xCC),
    rgba(0xb2ff59, 0xCC),
];

const BAND_STROKE_GLOW_TINT: [u8; 3] = [0xe0, 0xb3, 0xff];
const BAND_FILL_GLOW_TINT: [u8; 3] = [0xff, 0xb3, 0xde];

/// Soft radial sprite: `color` at the center fading to transparent at
/// the edge. Used for the central glow and the nebula blobs.
pub fn glow_sprite(color: [u8; 4], size: u32) -> Raster {
    let mut r = Raster::new(size, size);
    r.fill_radial_gradient(&[(0.0, color), (1.0, [0, 0, 0, 0])]);
    r
}

/// Random-hue nebula sprite (saturation 0.8, lightness 0.5, alpha 0.6).
pub fn nebula_sprite(size: u32, rng: &mut impl Rng) -> Raster {
    let hue = rng.gen_range(0.0..360.0);
    glow_sprite(hsla(hue, 0.8, 0.5, 153), size)
}

/// Layered planet surface: the 8-stop base gradient, then soft colored
/// spots from the fixed palette, then translucent swirl strokes.
/// Deliberately unseeded by the caller so every session's planet looks
/// different; generated once and cached by the scene builder.
pub fn planet_surface(profile: &DeviceProfile, rng: &mut impl Rng) -> Raster {
    let size = profile.planet_texture_size;
    let s = size as f32;
    let mut out = Raster::new(size, size);
    out.fill_radial_gradient(&PLANET_GRADIENT_STOPS);

    for _ in 0..profile.planet_spot_count {
        let x = rng.gen::<f32>() * s;
        let y = rng.gen::<f32>() * s;
        let radius = profile.planet_spot_radius + rng.gen::<f32>() * profile.planet_spot_radius_jitter;
        let color = PLANET_SPOT_PALETTE[rng.gen_range(0..PLANET_SPOT_PALETTE.len())];
        out.radial_blob(x, y, radius, color);
    }

    for _ in 0..profile.planet_swirl_count {
        let pts = [
            Vec2::new(rng.gen::<f32>() * s, rng.gen::<f32>() * s),
            Vec2::new(rng.gen::<f32>() * s, rng.gen::<f32>() * s),
            Vec2::new(rng.gen::<f32>() * s, rng.gen::<f32>() * s),
            Vec2::new(rng.gen::<f32>() * s, rng.gen::<f32>() * s),
        ];
        let width = profile.planet_swirl_width + rng.gen::<f32>() * profile.planet_swirl_width_jitter;
        let alpha = ((0.12 + rng.gen::<f32>() * 0.18) * 255.0) as u8;
        out.stroke_bezier(pts, width, [180, 120, 200, alpha]);
    }

    out
}

/// Rounded-corner frame for a decoded heart image: letterboxed into a
/// square, corner radius a tenth of the size, transparent margins.
pub fn neon_frame(image: &Raster, size: u32) -> Raster {
    let mut out = Raster::new(size, size);
    out.blit_rounded(image, size as f32 * 0.1);
    out
}

/// Script classes used to adjust ring typography.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    /// Full-width: CJK ideographs, kana, hangul.
    Wide,
    /// ASCII.
    Narrow,
    /// Everything else (combining marks, extended Latin, ...).
    Other,
}

/// Classify one character.
pub fn classify(c: char) -> ScriptClass {
    if font::is_wide(c) {
        ScriptClass::Wide
    } else if (c as u32) <= 0x7F {
        ScriptClass::Narrow
    } else {
        ScriptClass::Other
    }
}

/// Fraction of wide-script characters in a string (0.0 for empty).
pub fn wide_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let wide = text.chars().filter(|&c| classify(c) == ScriptClass::Wide).count();
    wide as f32 / total as f32
}

/// Typography inputs for one band.
#[derive(Debug, Clone)]
pub struct BandStyle {
    /// Em size in texture pixels.
    pub font_px: f32,
    /// Letter-spacing multiplier.
    pub spacing: f32,
    /// Band texture height in pixels.
    pub height: u32,
    /// Blur radius of the violet under-glow.
    pub stroke_glow: f32,
    /// Blur radius of the pink top-glow.
    pub fill_glow: f32,
}

/// A rendered band plus the numbers the ring mapper needs.
#[derive(Debug, Clone)]
pub struct TextBand {
    pub raster: Raster,
    /// How many times the segment repeats across the band.
    pub repeats: u32,
    /// Width of one segment in texture pixels.
    pub segment_width: f32,
    /// Band width / target circumference; the texture-coordinate repeat
    /// applied when wrapping the band around a ring. Always > 0.
    pub repeat_factor: f32,
}

/// Render a repeating text band wide enough to wrap a circumference.
///
/// The segment repeats `ceil(circumference / segment_width)` times so
/// the band is at least as wide as the circumference. A degenerate
/// segment (empty or unmeasurable text) falls back to exactly one
/// repetition.
pub fn text_band(segment: &str, circumference: f32, style: &BandStyle) -> TextBand {
    let segment_width = font::measure_text(segment, style.font_px, style.spacing);

    let repeats = if segment_width < 1.0 || circumference <= 0.0 {
        1
    } else {
        (circumference / segment_width).ceil().max(1.0) as u32
    };

    let band_width = (segment_width * repeats as f32).ceil().max(1.0) as u32;
    let height = style.height.max(1);

    // Sharp white mask first; the glows are blurred, tinted copies.
    let mut mask = Raster::new(band_width, height);
    let top = height as f32 * 0.84 - style.font_px;
    let mut pen = 0.0;
    for _ in 0..repeats {
        pen = font::draw_text(
            &mut mask,
            segment,
            pen,
            top,
            style.font_px,
            style.spacing,
            [255, 255, 255, 255],
        );
    }

    let mut out = Raster::new(band_width, height);
    let mut stroke_glow = mask.clone();
    stroke_glow.box_blur(style.stroke_glow.max(1.0) as u32);
    out.composite(&stroke_glow.tinted(BAND_STROKE_GLOW_TINT));
    let mut fill_glow = mask.clone();
    fill_glow.box_blur(style.fill_glow.max(1.0) as u32);
    out.composite(&fill_glow.tinted(BAND_FILL_GLOW_TINT));
    out.composite(&mask);

    let repeat_factor = if circumference > 0.0 {
        band_width as f32 / circumference
    } else {
        1.0
    };

    TextBand {
        raster: out,
        repeats,
        segment_width,
        repeat_factor,
    }
}

/// Instructional hint label, wording chosen by input capability.
pub fn hint_label(profile: &DeviceProfile) -> Raster {
    let size = profile.hint_canvas_size;
    let text = if profile.touch {
        "Tap the Planet"
    } else {
        "Click the Planet"
    };
    let px = profile.hint_font_px;
    let width = font::measure_text(text, px, 1.0);
    let x = (size as f32 - width) / 2.0;
    let y = (size as f32 - px) / 2.0;

    let mut mask = Raster::new(size, size);
    font::draw_text(&mut mask, text, x, y, px, 1.0, [255, 255, 255, 255]);

    let mut out = Raster::new(size, size);
    let mut glow = mask.clone();
    glow.box_blur(5);
    out.composite(&glow.tinted(BAND_FILL_GLOW_TINT));
    out.composite(&mask);
    out
}

/// Pointer-cursor arrow sprite for the idle hint, drawn as a filled
/// polygon on a transparent square.
pub fn hint_cursor(size: u32) -> Raster {
    let s = size as f32;
    let h = s * 0.8;
    let w = h * 0.5;
    let cx = s / 2.0;
    let cy = s * 0.1;
    // Arrow pointing down at the planet, tip at the top.
    let outline = [
        Vec2::new(0.0, 0.0),
        Vec2::new(-w * 0.4, h * 0.7),
        Vec2::new(-w * 0.25, h * 0.7),
        Vec2::new(-w * 0.5, h),
        Vec2::new(w * 0.5, h),
        Vec2::new(w * 0.25, h * 0.7),
        Vec2::new(w * 0.4, h * 0.7),
    ];
    let pts: Vec<Vec2> = outline.iter().map(|p| Vec2::new(cx + p.x, cy + p.y)).collect();
    let mut out = Raster::new(size, size);
    out.fill_polygon(&pts, [255, 255, 255, 255]);
    out
}

/// Pulsing ring sprite for the idle hint.
pub fn hint_ring(size: u32) -> Raster {
    let s = size as f32;
    let mut out = Raster::new(size, size);
    out.fill_ring(s / 2.0, s / 2.0, s * 0.425, s * 0.05, [255, 255, 255, 153]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceProfile, Tier};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_rgba_unpack() {
        assert_eq!(rgba(0xff66ff, 255), [0xff, 0x66, 0xff, 255]);
        assert_eq!(rgba(0x000000, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_hsla_primaries() {
        assert_eq!(hsla(0.0, 1.0, 0.5, 255), [255, 0, 0, 255]);
        let g = hsla(120.0, 1.0, 0.5, 255);
        assert!(g[1] > 200 && g[0] < 20 && g[2] < 20);
    }

    #[test]
    fn test_glow_sprite_fades_out() {
        let g = glow_sprite([255, 255, 255, 255], 64);
        assert!(g.get(32, 32)[3] > 200);
        assert!(g.get(0, 32)[3] < 60);
    }

    #[test]
    fn test_planet_surface_is_opaque_inside() {
        let profile = DeviceProfile::for_tier(Tier::Constrained, true);
        let mut rng = SmallRng::seed_from_u64(7);
        let p = planet_surface(&profile, &mut rng);
        assert_eq!(p.width, profile.planet_texture_size);
        let c = p.width / 2;
        assert_eq!(p.get(c, c)[3], 255);
    }

    #[test]
    fn test_classify_scripts() {
        assert_eq!(classify('A'), ScriptClass::Narrow);
        assert_eq!(classify('愛'), ScriptClass::Wide);
        assert_eq!(classify('é'), ScriptClass::Other);
        assert!(wide_ratio("愛A") > 0.0);
        assert_eq!(wide_ratio(""), 0.0);
    }

    fn style() -> BandStyle {
        BandStyle {
            font_px: 16.0,
            spacing: 1.0,
            height: 20,
            stroke_glow: 2.0,
            fill_glow: 3.0,
        }
    }

    #[test]
    fn test_band_covers_circumference() {
        let band = text_band("Hello   ", 500.0, &style());
        assert!(band.raster.width as f32 >= 500.0);
        assert!(band.repeat_factor > 0.0);
        // factor * circumference recovers the band width
        assert!((band.repeat_factor * 500.0 - band.raster.width as f32).abs() < 1.0);
    }

    #[test]
    fn test_band_degenerate_text_single_repeat() {
        let band = text_band("", 500.0, &style());
        assert_eq!(band.repeats, 1);
        assert!(band.repeat_factor > 0.0);
        assert!(band.raster.width >= 1);
    }

    #[test]
    fn test_band_repeat_count_minimal() {
        let band = text_band("Hi ", 100.0, &style());
        let seg = band.segment_width;
        assert_eq!(band.repeats, (100.0 / seg).ceil() as u32);
        // one fewer repeat would fall short of the circumference
        assert!(seg * (band.repeats - 1) as f32 <= 100.0);
    }

    #[test]
    fn test_hint_sprites_have_coverage() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        for r in [hint_label(&profile), hint_cursor(64), hint_ring(64)] {
            assert!(r.data.chunks_exact(4).any(|p| p[3] > 0));
        }
    }
}
