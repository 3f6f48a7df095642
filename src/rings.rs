//! Orbiting text rings around the planet.
//!
//! Each configured string becomes one ring: a cylinder band wrapped
//! with a repeating glow-text texture, spinning at its own rate on a
//! tilted plane. Ring radii grow strictly outward from just above the
//! planet surface. Tilt/roll/pitch oscillators are wired with
//! amplitudes and phases but zero speed, so the rings hold their plane;
//! setting a speed is all it takes to let a ring sway.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

use crate::device::DeviceProfile;
use crate::texture::{self, BandStyle, TextBand};

/// Gap appended after each text before it repeats around the band.
pub const SEPARATOR: &str = "   ";

/// Sinusoidal motion primitive: `amplitude * sin(t * speed + phase)`.
#[derive(Debug, Clone, Copy)]
pub struct Oscillator {
    pub speed: f32,
    pub amplitude: f32,
    pub phase: f32,
}

impl Oscillator {
    /// Amplitude and phase wired, speed zero: contributes nothing until
    /// a speed is set.
    pub fn dormant(amplitude: f32, phase: f32) -> Self {
        Self {
            speed: 0.0,
            amplitude,
            phase,
        }
    }

    pub fn sin_at(&self, t: f32) -> f32 {
        (t * self.speed + self.phase).sin() * self.amplitude
    }

    pub fn cos_at(&self, t: f32) -> f32 {
        (t * self.speed + self.phase).cos() * self.amplitude
    }
}

/// One orbiting text ring.
#[derive(Debug, Clone)]
pub struct TextRing {
    pub index: usize,
    pub radius: f32,
    /// Current spin angle, advanced every frame.
    pub angle_offset: f32,
    /// Spin rate in radians per frame.
    pub speed: f32,
    /// Fixed plane tilt distributing the rings across half a turn.
    pub base_tilt: f32,
    pub tilt: Oscillator,
    pub roll: Oscillator,
    pub pitch: Oscillator,
    pub band: TextBand,
    pub font_px: f32,
    pub spacing: f32,
}

impl TextRing {
    /// Advance the spin by one frame.
    pub fn advance(&mut self) {
        self.angle_offset += self.speed;
    }

    /// Euler rotation (x, y, z) at time `t` seconds.
    pub fn rotation_at(&self, t: f32) -> Vec3 {
        Vec3::new(
            self.base_tilt + self.tilt.sin_at(t),
            self.angle_offset + self.pitch.sin_at(t),
            self.roll.cos_at(t),
        )
    }

    /// Vertical bob at time `t`, driven at 0.7x the tilt speed.
    /// Effectively zero while the tilt oscillator is dormant.
    pub fn bob_at(&self, t: f32) -> f32 {
        (t * self.tilt.speed * 0.7 + self.tilt.phase).sin() * 0.3
    }
}

/// Typography for ring `index`: the two innermost rings run smaller and
/// tighter, and any wide-script presence shrinks the font slightly
/// while widening the spacing.
fn ring_typography(index: usize, text: &str, profile: &DeviceProfile) -> (f32, f32) {
    let (mut font_scale, mut spacing) = match index {
        0 => (profile.ring_font_scale_first, 0.9),
        1 => (profile.ring_font_scale_second, 1.0),
        _ => (profile.ring_font_scale, 1.1),
    };
    if texture::wide_ratio(text) > 0.0 {
        font_scale *= 0.9;
        spacing *= 1.1;
    }
    (font_scale, spacing)
}

/// Build all rings for the configured texts.
pub fn build_rings(texts: &[String], profile: &DeviceProfile) -> Vec<TextRing> {
    let count = texts.len();
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let radius = profile.ring_base_radius() + i as f32 * profile.ring_spacing;
            let (font_scale, spacing) = ring_typography(i, text, profile);
            let height = profile.ring_texture_height;
            let font_px =
                profile.ring_min_font_px.max(0.8 * height as f32) * font_scale;

            let circumference = TAU * radius * profile.ring_circumference_scale;
            let segment = format!("{text}{SEPARATOR}");
            let band = texture::text_band(
                &segment,
                circumference,
                &BandStyle {
                    font_px,
                    spacing,
                    height,
                    stroke_glow: profile.ring_stroke_glow,
                    fill_glow: profile.ring_fill_glow,
                },
            );

            TextRing {
                index: i,
                radius,
                angle_offset: 0.15 * PI * 0.5,
                speed: profile.ring_speed + 0.00025,
                base_tilt: i as f32 / count as f32 * PI,
                tilt: Oscillator::dormant(PI / 3.0, TAU),
                roll: Oscillator::dormant(PI / 6.0, TAU),
                pitch: Oscillator::dormant(PI / 8.0, TAU),
                band,
                font_px,
                spacing,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Tier;

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Ring {i}")).collect()
    }

    #[test]
    fn test_ring_radii_arithmetic() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        let rings = build_rings(&texts(4), &profile);
        let radii: Vec<f32> = rings.iter().map(|r| r.radius).collect();
        assert_eq!(radii, vec![11.0, 16.0, 21.0, 26.0]);
    }

    #[test]
    fn test_ring_radii_strictly_increase() {
        let profile = DeviceProfile::for_tier(Tier::Constrained, true);
        let rings = build_rings(&texts(6), &profile);
        for pair in rings.windows(2) {
            assert!(pair[1].radius > pair[0].radius);
        }
    }

    #[test]
    fn test_inner_ring_presets_are_smaller() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        let rings = build_rings(&texts(3), &profile);
        assert!(rings[0].font_px < rings[1].font_px);
        assert!(rings[1].font_px < rings[2].font_px);
        assert!(rings[0].spacing < rings[2].spacing);
    }

    #[test]
    fn test_wide_script_adjusts_typography() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        let plain = build_rings(&["Hello".to_string(), "a".into(), "b".into()], &profile);
        let wide = build_rings(&["愛してる".to_string(), "a".into(), "b".into()], &profile);
        assert!(wide[0].font_px < plain[0].font_px);
        assert!(wide[0].spacing > plain[0].spacing);
    }

    #[test]
    fn test_band_covers_ring_circumference() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        let rings = build_rings(&texts(2), &profile);
        for ring in &rings {
            let circumference = TAU * ring.radius * profile.ring_circumference_scale;
            assert!(ring.band.raster.width as f32 >= circumference);
            assert!(ring.band.repeat_factor > 0.0);
        }
    }

    #[test]
    fn test_base_tilt_distribution() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        let rings = build_rings(&texts(4), &profile);
        for (i, ring) in rings.iter().enumerate() {
            let expected = i as f32 / 4.0 * PI;
            assert!((ring.base_tilt - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dormant_oscillators_hold_plane() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        let mut rings = build_rings(&texts(2), &profile);
        let ring = &mut rings[0];
        let r0 = ring.rotation_at(0.0);
        let r1 = ring.rotation_at(100.0);
        assert_eq!(r0, r1);
        assert!(ring.bob_at(50.0).abs() < 1e-6);

        // spin still advances
        let before = ring.angle_offset;
        ring.advance();
        assert!(ring.angle_offset > before);
        assert!((ring.angle_offset - before - ring.speed).abs() < 1e-9);
    }

    #[test]
    fn test_enabling_oscillator_moves_ring() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        let mut rings = build_rings(&texts(1), &profile);
        rings[0].tilt.speed = 1.0;
        let a = rings[0].rotation_at(0.3).x;
        let b = rings[0].rotation_at(1.2).x;
        assert!((a - b).abs() > 1e-4);
        assert!(rings[0].bob_at(0.3).abs() <= 0.3);
    }
}
