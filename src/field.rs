//! Particle field generation: spiral galaxy, heart clusters, starfield.
//!
//! Output buffers are packed `Vec<f32>` triples ready for vertex-buffer
//! upload. Generators never error: rejected samples shrink the output
//! instead, so the accepted count never exceeds the requested count.
//!
//! # Example
//!
//! ```
//! use stardrift::field::{spiral_galaxy, GalaxyParams};
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! let mut rng = SmallRng::seed_from_u64(42);
//! let field = spiral_galaxy(&GalaxyParams::default(), &mut rng);
//! assert!(field.len() > 0);
//! assert_eq!(field.positions.len(), field.colors.len());
//! ```

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

use crate::device::DeviceProfile;

/// Galaxy point color at the core.
pub const GALAXY_INNER_COLOR: u32 = 0xff66ff;
/// Galaxy point color at the rim.
pub const GALAXY_OUTER_COLOR: u32 = 0x66ffff;
/// Heart-cluster distant color near the core.
pub const HEART_INNER_COLOR: u32 = 0xd63ed6;
/// Heart-cluster distant color at the rim.
pub const HEART_OUTER_COLOR: u32 = 0x48b8b8;

/// Probability that a galaxy sample inside the exclusion radius is
/// dropped (the remainder keeps a thin dusting over the planet).
const INTERIOR_REJECTION: f32 = 0.8;

/// Expand `0xRRGGBB` into a linear 0..1 color vector.
pub fn hex_color(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    )
}

/// Spiral sampling parameters shared by the galaxy and heart clusters.
#[derive(Debug, Clone)]
pub struct GalaxyParams {
    pub count: u32,
    pub arms: u32,
    pub radius: f32,
    pub spin: f32,
    pub randomness: f32,
    /// Exponent of the radial distribution; high values crowd samples
    /// toward the center.
    pub randomness_power: f32,
    /// Radius below which samples are rejected.
    pub exclusion: f32,
}

impl GalaxyParams {
    pub fn from_profile(profile: &DeviceProfile) -> Self {
        Self {
            count: profile.galaxy_count,
            arms: profile.galaxy_arms,
            radius: profile.galaxy_radius,
            spin: profile.galaxy_spin,
            randomness: profile.galaxy_randomness,
            randomness_power: profile.galaxy_randomness_power,
            exclusion: profile.galaxy_exclusion,
        }
    }
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            count: 100_000,
            arms: 6,
            radius: 100.0,
            spin: 0.5,
            randomness: 0.2,
            randomness_power: 20.0,
            exclusion: 30.0,
        }
    }
}

/// Packed positions with parallel per-point colors.
#[derive(Debug, Clone, Default)]
pub struct ParticleField {
    /// xyz triples.
    pub positions: Vec<f32>,
    /// rgb triples, parallel to `positions`.
    pub colors: Vec<f32>,
}

impl ParticleField {
    pub fn with_capacity(points: usize) -> Self {
        Self {
            positions: Vec::with_capacity(points * 3),
            colors: Vec::with_capacity(points * 3),
        }
    }

    pub fn push_point(&mut self, position: Vec3, color: Vec3) {
        self.positions.extend_from_slice(&position.to_array());
        self.colors.extend_from_slice(&color.to_array());
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn point(&self, i: usize) -> Vec3 {
        Vec3::new(
            self.positions[i * 3],
            self.positions[i * 3 + 1],
            self.positions[i * 3 + 2],
        )
    }

    /// Mean of all point positions. Zero for an empty field.
    pub fn centroid(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        let mut sum = Vec3::ZERO;
        for i in 0..self.len() {
            sum += self.point(i);
        }
        sum / self.len() as f32
    }

    /// Shift every point by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[0] += offset.x;
            chunk[1] += offset.y;
            chunk[2] += offset.z;
        }
    }
}

fn spiral_position(params: &GalaxyParams, index: u32, radius: f32, jitter: Vec3) -> Vec3 {
    let branch_angle = (index % params.arms) as f32 / params.arms as f32 * TAU;
    let spin_angle = radius * params.spin;
    let total = branch_angle + spin_angle;
    Vec3::new(
        total.cos() * radius + jitter.x,
        jitter.y,
        total.sin() * radius + jitter.z,
    )
}

/// Generate the background spiral galaxy.
///
/// Samples inside the exclusion radius survive with probability 0.2,
/// leaving a thin dusting over the planet; everything else follows the
/// power-law spiral. Accepted points are packed contiguously, so the
/// field is exactly as long as the number of survivors.
pub fn spiral_galaxy(params: &GalaxyParams, rng: &mut impl Rng) -> ParticleField {
    let inner = hex_color(GALAXY_INNER_COLOR);
    let outer = hex_color(GALAXY_OUTER_COLOR);
    let mut field = ParticleField::with_capacity(params.count as usize);

    for i in 0..params.count {
        let radius = rng.gen::<f32>().powf(params.randomness_power) * params.radius;
        let jitter = Vec3::new(
            (rng.gen::<f32>() - 0.5) * params.randomness * radius,
            (rng.gen::<f32>() - 0.5) * params.randomness * radius * 1.2,
            (rng.gen::<f32>() - 0.5) * params.randomness * radius,
        );

        if radius < params.exclusion && rng.gen::<f32>() < INTERIOR_REJECTION {
            continue;
        }

        let brightness = 0.7 + 0.3 * rng.gen::<f32>();
        let color = inner.lerp(outer, radius / params.radius) * brightness;
        field.push_point(spiral_position(params, i, radius, jitter), color);
    }

    field
}

/// One image cluster: shared positions, two color sets.
#[derive(Debug, Clone)]
pub struct HeartField {
    /// Re-centered point positions (colors unset; the near/far sets
    /// below bind depending on camera distance).
    pub positions: ParticleField,
    /// Uniform white, bound when the cluster is close to the camera.
    pub colors_near: Vec<f32>,
    /// Spiral gradient, bound at distance.
    pub colors_far: Vec<f32>,
}

impl HeartField {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Generate one heart cluster along the same spiral as the galaxy.
///
/// Unlike the galaxy, interior samples are always rejected, vertical
/// jitter is halved, and the branch angle derives from the global point
/// index so consecutive groups continue the arm pattern. Returns the
/// field (already re-centered on its centroid) and the centroid itself,
/// which becomes the cluster's world position.
pub fn heart_cluster(
    params: &GalaxyParams,
    group: u32,
    per_group: u32,
    rng: &mut impl Rng,
) -> (HeartField, Vec3) {
    let inner = hex_color(HEART_INNER_COLOR);
    let outer = hex_color(HEART_OUTER_COLOR);

    let mut positions = ParticleField::with_capacity(per_group as usize);
    let mut colors_near = Vec::with_capacity(per_group as usize * 3);

    for i in 0..per_group {
        let radius = rng.gen::<f32>().powf(params.randomness_power) * params.radius;
        if radius < params.exclusion {
            continue;
        }

        let global_idx = group * per_group + i;
        let jitter = Vec3::new(
            (rng.gen::<f32>() - 0.5) * params.randomness * radius,
            (rng.gen::<f32>() - 0.5) * params.randomness * radius * 0.5,
            (rng.gen::<f32>() - 0.5) * params.randomness * radius,
        );

        let brightness = 0.7 + 0.3 * rng.gen::<f32>();
        let far = inner.lerp(outer, radius / params.radius) * brightness;
        positions.push_point(spiral_position(params, global_idx, radius, jitter), far);
        colors_near.extend_from_slice(&[1.0, 1.0, 1.0]);
    }

    let centroid = positions.centroid();
    positions.translate(-centroid);

    let colors_far = std::mem::take(&mut positions.colors);
    let field = HeartField {
        positions,
        colors_near,
        colors_far,
    };
    (field, centroid)
}

/// Per-cluster point budget: interpolates from the max density at one
/// group down to the min density at `heart_group_cap` groups, then
/// clamps so all clusters together never exceed the galaxy count.
pub fn points_per_group(num_groups: u32, profile: &DeviceProfile) -> u32 {
    if num_groups == 0 {
        return 0;
    }
    let max_d = profile.heart_max_density;
    let min_d = profile.heart_min_density;
    let cap = profile.heart_group_cap;

    let mut per_group = if num_groups <= 1 {
        max_d
    } else if num_groups >= cap {
        min_d
    } else {
        let t = (num_groups - 1) as f32 / (cap - 1) as f32;
        (max_d as f32 * (1.0 - t) + min_d as f32 * t) as u32
    };

    if per_group * num_groups > profile.galaxy_count {
        per_group = profile.galaxy_count / num_groups;
    }
    per_group
}

/// Uniform starfield in a cube of side `spread` centered on the origin.
pub fn starfield(count: u32, spread: f32, rng: &mut impl Rng) -> ParticleField {
    let mut field = ParticleField::with_capacity(count as usize);
    for _ in 0..count {
        let p = Vec3::new(
            (rng.gen::<f32>() - 0.5) * spread,
            (rng.gen::<f32>() - 0.5) * spread,
            (rng.gen::<f32>() - 0.5) * spread,
        );
        field.push_point(p, Vec3::ONE);
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Tier;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(1234)
    }

    #[test]
    fn test_galaxy_count_invariant() {
        let params = GalaxyParams::default();
        let field = spiral_galaxy(&params, &mut rng());
        assert!(field.len() <= params.count as usize);
        assert!(field.len() > 0);
        assert_eq!(field.positions.len(), field.colors.len());
        assert_eq!(field.positions.len() % 3, 0);
    }

    #[test]
    fn test_galaxy_full_tier_scenario() {
        // a power-20 radial law crowds most samples inside the
        // exclusion radius, so survivors are a small nonzero fraction
        let params = GalaxyParams {
            count: 100_000,
            arms: 6,
            radius: 100.0,
            exclusion: 30.0,
            ..GalaxyParams::default()
        };
        let field = spiral_galaxy(&params, &mut rng());
        assert!(field.len() > 0);
        assert!(field.len() < 100_000);
        assert!(field.len() < 50_000, "expected heavy interior rejection");
    }

    #[test]
    fn test_galaxy_interior_rejection_thins_the_core() {
        let params = GalaxyParams::default();
        let field = spiral_galaxy(&params, &mut rng());
        // the power-20 law lands ~91% of raw samples deep inside the
        // exclusion radius; the 80% rejection keeps roughly a fifth of
        // those as a thin dusting, so deep survivors come out near 18%
        // of the requested count
        let deep = (0..field.len())
            .filter(|&i| field.point(i).length() < params.exclusion * 0.5)
            .count();
        let fraction = deep as f32 / params.count as f32;
        assert!(fraction > 0.05, "core dusting vanished: {fraction}");
        assert!(fraction < 0.35, "interior rejection not applied: {fraction}");
    }

    #[test]
    fn test_heart_cluster_exact_exclusion() {
        let params = GalaxyParams::default();
        let (field, centroid) = heart_cluster(&params, 0, 20_000, &mut rng());
        assert!(field.len() <= 20_000);
        assert!(!field.is_empty());
        // rejection is exact on the sampled radius; jitter can move a
        // point inward by at most randomness * radius per axis
        let slack = params.exclusion * (1.0 - params.randomness * 1.5);
        for i in 0..field.len() {
            let p = field.positions.point(i) + centroid;
            let planar = (p.x * p.x + p.z * p.z).sqrt();
            assert!(planar >= slack, "point {i} at planar radius {planar}");
        }
    }

    #[test]
    fn test_heart_cluster_recentered() {
        let params = GalaxyParams::default();
        let (field, centroid) = heart_cluster(&params, 3, 10_000, &mut rng());
        assert!(centroid.length() > 0.0);
        let resid = field.positions.centroid();
        assert!(resid.length() < 1e-2, "residual centroid {resid}");
        assert_eq!(field.colors_near.len(), field.colors_far.len());
        assert_eq!(field.colors_near.len(), field.positions.positions.len());
        assert!(field
            .colors_near
            .chunks_exact(3)
            .all(|c| c == [1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_points_per_group_interpolation() {
        let profile = DeviceProfile::for_tier(Tier::Full, false);
        // one or two clusters fit inside the shared galaxy budget, so
        // the raw interpolation comes through unclamped
        assert_eq!(points_per_group(1, &profile), profile.heart_max_density);
        let two = points_per_group(2, &profile);
        assert!(two < profile.heart_max_density);
        assert!(two > profile.heart_min_density);
        assert!(two * 2 <= profile.galaxy_count);
        // denser layouts hit the budget clamp: per-group becomes an
        // even split of the galaxy count
        assert_eq!(points_per_group(12, &profile), profile.galaxy_count / 12);
        assert_eq!(points_per_group(24, &profile), profile.galaxy_count / 24);
        assert_eq!(points_per_group(30, &profile), profile.galaxy_count / 30);
        // total never exceeds the galaxy budget
        for groups in [2, 3, 5, 12, 24, 30] {
            assert!(points_per_group(groups, &profile) * groups <= profile.galaxy_count);
        }
    }

    #[test]
    fn test_starfield_uniform_cube() {
        let field = starfield(5_000, 900.0, &mut rng());
        assert_eq!(field.len(), 5_000);
        for i in 0..field.len() {
            let p = field.point(i);
            assert!(p.x.abs() <= 450.0 && p.y.abs() <= 450.0 && p.z.abs() <= 450.0);
        }
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color(0xffffff), Vec3::ONE);
        assert_eq!(hex_color(0x000000), Vec3::ZERO);
        let c = hex_color(0xff66ff);
        assert!((c.x - 1.0).abs() < 1e-6 && (c.y - 0.4).abs() < 0.01);
    }
}
