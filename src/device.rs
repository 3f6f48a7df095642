//! Device capability classification and the tunable table derived from it.
//!
//! Every density, size, speed and threshold used anywhere in the scene is
//! resolved here, exactly once, at startup. Downstream components take a
//! [`DeviceProfile`] and never re-inspect raw environment signals, so there
//! is a single place to read (or tweak) the quality settings for each tier.
//!
//! # Example
//!
//! ```
//! use stardrift::device::{DeviceProfile, EnvSignals, Tier};
//!
//! let signals = EnvSignals::new("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)", 5);
//! let profile = DeviceProfile::new(&signals);
//! assert_eq!(profile.tier, Tier::Constrained);
//! assert!(profile.touch);
//! ```

use glam::{Vec2, Vec3};

/// Capability tier driving every density/quality tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Low-power device: reduced particle counts, smaller textures,
    /// cheaper materials.
    Constrained,
    /// Everything else. Unrecognized environments land here.
    Full,
}

/// Raw environment signals sampled once at startup.
///
/// The descriptor plays the role of a user-agent string; hosts that have
/// no such string pass whatever platform identifier they have and get the
/// full tier.
#[derive(Debug, Clone)]
pub struct EnvSignals {
    /// Free-form environment descriptor (user-agent-like).
    pub descriptor: String,
    /// Number of touch points the input layer reports (0 = no touch).
    pub max_touch_points: u32,
}

/// Descriptor fragments that classify an environment as constrained.
const CONSTRAINED_MARKERS: &[&str] = &[
    "android", "webos", "iphone", "ipad", "ipod", "blackberry", "iemobile", "opera mini",
];

impl EnvSignals {
    pub fn new(descriptor: impl Into<String>, max_touch_points: u32) -> Self {
        Self {
            descriptor: descriptor.into(),
            max_touch_points,
        }
    }

    /// Sample signals from the local platform. Desktop hosts have no
    /// user-agent, so the OS identifier stands in and resolves to the
    /// full tier.
    pub fn detect() -> Self {
        Self::new(std::env::consts::OS, 0)
    }

    /// Classify into a tier. Deterministic; unknown descriptors are `Full`.
    pub fn tier(&self) -> Tier {
        let descriptor = self.descriptor.to_ascii_lowercase();
        if CONSTRAINED_MARKERS.iter().any(|m| descriptor.contains(m)) {
            Tier::Constrained
        } else {
            Tier::Full
        }
    }

    /// Whether the environment delivers touch input (affects hint wording
    /// and fullscreen behavior, not the tier).
    pub fn is_touch(&self) -> bool {
        self.max_touch_points > 0
    }
}

/// Immutable table of every tier-derived tunable.
///
/// Created once at init, read-only afterwards. Fields are grouped by the
/// component that consumes them.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub tier: Tier,
    pub touch: bool,

    // Camera / renderer
    pub fov: f32,
    pub fov_portrait: f32,
    pub fov_landscape: f32,
    pub fog_density: f32,
    pub pixel_ratio_cap: f32,
    pub antialias: bool,
    pub camera_start: Vec3,
    pub auto_rotate_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub zoom_speed: f32,
    pub rotate_speed: f32,

    // Central glow + nebula sprites
    pub glow_scale: f32,
    pub nebula_count: u32,
    pub nebula_texture_size: u32,
    pub nebula_scale: f32,
    pub nebula_spread: f32,

    // Spiral galaxy field
    pub galaxy_count: u32,
    pub galaxy_arms: u32,
    pub galaxy_radius: f32,
    pub galaxy_spin: f32,
    pub galaxy_randomness: f32,
    pub galaxy_randomness_power: f32,
    pub galaxy_exclusion: f32,
    pub galaxy_point_size: f32,

    // Heart clusters
    pub heart_max_density: u32,
    pub heart_min_density: u32,
    pub heart_group_cap: u32,
    pub heart_point_size: f32,
    pub neon_texture_size: u32,
    pub lod_near_distance: f32,

    // Starfield
    pub star_count: u32,
    pub star_spread: f32,
    pub star_size: f32,
    pub star_idle_fraction: f32,

    // Shooting stars
    pub meteor_max: usize,
    pub meteor_spawn_chance: f32,
    pub meteor_trail_len: usize,
    pub meteor_max_life: u32,
    pub meteor_head_radius: f32,
    pub meteor_glow_radius: f32,
    pub meteor_range: f32,

    // Planet
    pub planet_radius: f32,
    pub planet_segments: u32,
    pub planet_texture_size: u32,
    pub planet_spot_count: u32,
    pub planet_swirl_count: u32,
    pub planet_spot_radius: f32,
    pub planet_spot_radius_jitter: f32,
    pub planet_swirl_width: f32,
    pub planet_swirl_width_jitter: f32,

    // Text rings
    pub ring_spacing: f32,
    pub ring_speed: f32,
    pub ring_texture_height: u32,
    pub ring_min_font_px: f32,
    pub ring_circumference_scale: f32,
    pub ring_font_scale: f32,
    pub ring_font_scale_first: f32,
    pub ring_font_scale_second: f32,
    pub ring_stroke_glow: f32,
    pub ring_fill_glow: f32,

    // Hint icon + text
    pub hint_canvas_size: u32,
    pub hint_font_px: f32,
    pub hint_plane: Vec2,
    pub hint_icon_height: f32,
    pub hint_icon_scale: f32,
    pub hint_icon_z: f32,
    pub hint_text_y: f32,
    pub hint_tap_amplitude: f32,

    // Intro transition
    pub fade_step: f32,
    pub flight_step: f32,
    pub flight_mid_z: f32,
    pub flight_end: Vec3,
    pub audio_volume: f32,
}

impl DeviceProfile {
    /// Resolve a profile from environment signals.
    pub fn new(signals: &EnvSignals) -> Self {
        Self::for_tier(signals.tier(), signals.is_touch())
    }

    /// Convenience: sample the local platform and resolve.
    pub fn detect() -> Self {
        Self::new(&EnvSignals::detect())
    }

    /// Build the full tunable table for a tier.
    pub fn for_tier(tier: Tier, touch: bool) -> Self {
        let constrained = tier == Tier::Constrained;
        // One ternary per tunable, all in one place.
        let pick_f = |c: f32, f: f32| if constrained { c } else { f };
        let pick_u = |c: u32, f: u32| if constrained { c } else { f };

        Self {
            tier,
            touch,

            fov: pick_f(85.0, 75.0),
            fov_portrait: 85.0,
            fov_landscape: 75.0,
            fog_density: pick_f(0.002, 0.0015),
            pixel_ratio_cap: pick_f(1.5, 2.0),
            antialias: !constrained,
            camera_start: Vec3::new(0.0, 20.0, pick_f(25.0, 30.0)),
            auto_rotate_speed: pick_f(0.3, 0.5),
            min_distance: pick_f(12.0, 15.0),
            max_distance: pick_f(200.0, 300.0),
            zoom_speed: pick_f(0.5, 0.3),
            rotate_speed: pick_f(0.5, 0.3),

            glow_scale: pick_f(6.0, 8.0),
            nebula_count: pick_u(8, 15),
            nebula_texture_size: pick_u(128, 256),
            nebula_scale: pick_f(60.0, 100.0),
            nebula_spread: pick_f(120.0, 175.0),

            galaxy_count: pick_u(50_000, 100_000),
            galaxy_arms: 6,
            galaxy_radius: pick_f(80.0, 100.0),
            galaxy_spin: 0.5,
            galaxy_randomness: 0.2,
            galaxy_randomness_power: 20.0,
            galaxy_exclusion: pick_f(25.0, 30.0),
            galaxy_point_size: pick_f(30.0, 50.0),

            heart_max_density: pick_u(25_000, 50_000),
            heart_min_density: pick_u(5_000, 10_000),
            heart_group_cap: 24,
            heart_point_size: pick_f(1.2, 1.8),
            neon_texture_size: pick_u(128, 256),
            lod_near_distance: pick_f(8.0, 10.0),

            star_count: pick_u(10_000, 20_000),
            star_spread: pick_f(600.0, 900.0),
            star_size: pick_f(0.5, 0.7),
            star_idle_fraction: pick_f(0.05, 0.1),

            meteor_max: if constrained { 2 } else { 3 },
            meteor_spawn_chance: pick_f(0.01, 0.02),
            meteor_trail_len: if constrained { 50 } else { 100 },
            meteor_max_life: pick_u(200, 300),
            meteor_head_radius: pick_f(1.5, 2.0),
            meteor_glow_radius: pick_f(2.0, 3.0),
            meteor_range: pick_f(150.0, 200.0),

            planet_radius: pick_f(8.0, 10.0),
            planet_segments: pick_u(32, 48),
            planet_texture_size: pick_u(256, 512),
            planet_spot_count: pick_u(20, 40),
            planet_swirl_count: pick_u(4, 8),
            planet_spot_radius: pick_f(20.0, 30.0),
            planet_spot_radius_jitter: pick_f(60.0, 120.0),
            planet_swirl_width: pick_f(4.0, 8.0),
            planet_swirl_width_jitter: pick_f(8.0, 18.0),

            ring_spacing: pick_f(3.0, 5.0),
            ring_speed: pick_f(0.0015, 0.002),
            ring_texture_height: pick_u(100, 150),
            ring_min_font_px: pick_f(80.0, 130.0),
            ring_circumference_scale: pick_f(120.0, 180.0),
            ring_font_scale: pick_f(0.6, 0.75),
            ring_font_scale_first: pick_f(0.45, 0.55),
            ring_font_scale_second: pick_f(0.55, 0.65),
            ring_stroke_glow: pick_f(12.0, 18.0),
            ring_fill_glow: pick_f(16.0, 24.0),

            hint_canvas_size: pick_u(256, 512),
            hint_font_px: pick_f(30.0, 50.0),
            hint_plane: if constrained {
                Vec2::new(12.0, 6.0)
            } else {
                Vec2::new(16.0, 8.0)
            },
            hint_icon_height: pick_f(1.2, 1.5),
            hint_icon_scale: pick_f(0.6, 0.8),
            hint_icon_z: pick_f(12.0, 15.0),
            hint_text_y: pick_f(12.0, 15.0),
            hint_tap_amplitude: pick_f(1.0, 1.5),

            fade_step: pick_f(0.035, 0.025),
            flight_step: pick_f(0.003, 0.0025),
            flight_mid_z: pick_f(120.0, 160.0),
            flight_end: if constrained {
                Vec3::new(-30.0, 80.0, 80.0)
            } else {
                Vec3::new(-40.0, 100.0, 100.0)
            },
            audio_volume: pick_f(0.7, 1.0),
        }
    }

    /// Base radius of the innermost text ring.
    pub fn ring_base_radius(&self) -> f32 {
        self.planet_radius * 1.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_descriptors_are_constrained() {
        for ua in [
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)",
            "Mozilla/5.0 (Linux; Android 14; Pixel 8)",
            "Mozilla/5.0 (compatible; IEMobile 11.0)",
        ] {
            assert_eq!(EnvSignals::new(ua, 5).tier(), Tier::Constrained);
        }
    }

    #[test]
    fn test_unknown_descriptor_defaults_to_full() {
        assert_eq!(EnvSignals::new("some-embedded-runtime/1.0", 0).tier(), Tier::Full);
        assert_eq!(EnvSignals::new("", 0).tier(), Tier::Full);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let signals = EnvSignals::new("Mozilla/5.0 (iPad; CPU OS 16_0)", 5);
        let a = DeviceProfile::new(&signals);
        let b = DeviceProfile::new(&signals);
        assert_eq!(a.tier, b.tier);
        assert_eq!(a.galaxy_count, b.galaxy_count);
        assert_eq!(a.flight_end, b.flight_end);
    }

    #[test]
    fn test_full_tier_table() {
        let p = DeviceProfile::for_tier(Tier::Full, false);
        assert_eq!(p.galaxy_count, 100_000);
        assert_eq!(p.galaxy_arms, 6);
        assert_eq!(p.galaxy_exclusion, 30.0);
        assert_eq!(p.planet_radius, 10.0);
        assert_eq!(p.ring_spacing, 5.0);
        assert!((p.ring_base_radius() - 11.0).abs() < 1e-6);
        assert!(p.antialias);
    }

    #[test]
    fn test_constrained_tier_scales_down() {
        let c = DeviceProfile::for_tier(Tier::Constrained, true);
        let f = DeviceProfile::for_tier(Tier::Full, false);
        assert!(c.galaxy_count < f.galaxy_count);
        assert!(c.star_count < f.star_count);
        assert!(c.meteor_max < f.meteor_max);
        assert!(c.fade_step > f.fade_step);
        assert!(c.touch);
    }
}
