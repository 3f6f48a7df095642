//! Shooting stars: random Bezier flight paths with resampled trails.
//!
//! A spawner keeps the population under a tier cap, rolling a spawn
//! chance once per frame. Each star advances fixed `speed` along its
//! curve and is removed on the first update past the end of the path;
//! age against `max_life` only shapes the opacity ramps, so a star
//! that outlives its fade window keeps flying invisibly until the
//! path ends.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::device::DeviceProfile;

/// Progress offset between consecutive trail samples.
pub const TRAIL_STEP: f32 = 0.01;

/// Life ticks over which opacity fades in and out.
const FADE_TICKS: u32 = 30;

/// A cubic Bezier flight path.
#[derive(Debug, Clone, Copy)]
pub struct CubicBezier {
    pub p0: Vec3,
    pub p1: Vec3,
    pub p2: Vec3,
    pub p3: Vec3,
}

impl CubicBezier {
    /// Evaluate at `t` in `[0, 1]` (Bernstein form).
    pub fn point(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    /// A long diagonal sweep across the scene: start on the left of the
    /// range, end far right, controls pulled toward the midline.
    pub fn random_span(range: f32, rng: &mut impl Rng) -> Self {
        let p0 = Vec3::new(
            -range + rng.gen::<f32>() * 50.0,
            -100.0 + rng.gen::<f32>() * 200.0,
            -100.0 + rng.gen::<f32>() * 200.0,
        );
        let p3 = Vec3::new(
            range * 2.0 + rng.gen::<f32>() * 100.0,
            p0.y + (-100.0 + rng.gen::<f32>() * 200.0),
            p0.z + (-100.0 + rng.gen::<f32>() * 200.0),
        );
        let p1 = Vec3::new(
            p0.x + range + rng.gen::<f32>() * 50.0,
            p0.y + (-50.0 + rng.gen::<f32>() * 100.0),
            p0.z + (-50.0 + rng.gen::<f32>() * 100.0),
        );
        let p2 = Vec3::new(
            p3.x - range + rng.gen::<f32>() * 50.0,
            p3.y + (-50.0 + rng.gen::<f32>() * 100.0),
            p3.z + (-50.0 + rng.gen::<f32>() * 100.0),
        );
        Self { p0, p1, p2, p3 }
    }
}

/// One live shooting star.
#[derive(Debug, Clone)]
pub struct ShootingStar {
    pub curve: CubicBezier,
    pub progress: f32,
    pub speed: f32,
    pub life: u32,
    pub max_life: u32,
    /// Current head position on the curve.
    pub head: Vec3,
    /// Trail sample points, head first, resampled every frame at
    /// decreasing progress offsets clamped to the path start.
    pub trail: Vec<Vec3>,
}

impl ShootingStar {
    pub fn spawn(profile: &DeviceProfile, rng: &mut impl Rng) -> Self {
        let curve = CubicBezier::random_span(profile.meteor_range, rng);
        let head = curve.point(0.0);
        Self {
            curve,
            progress: 0.0,
            speed: 0.001 + rng.gen::<f32>() * 0.001,
            life: 0,
            max_life: profile.meteor_max_life,
            head,
            trail: vec![head; profile.meteor_trail_len],
        }
    }

    /// Advance one frame. Returns `false` when the star should be
    /// removed, which happens exactly on the first update where the
    /// path is exhausted; head and trail are only updated for
    /// surviving stars.
    pub fn update(&mut self) -> bool {
        self.life += 1;
        self.progress += self.speed;
        if self.progress > 1.0 {
            return false;
        }

        self.head = self.curve.point(self.progress);
        for (j, p) in self.trail.iter_mut().enumerate() {
            let t = (self.progress - j as f32 * TRAIL_STEP).max(0.0);
            *p = self.curve.point(t);
        }
        true
    }

    /// Head opacity: linear ramp over the first and last fade windows.
    pub fn opacity(&self) -> f32 {
        let o = if self.life < FADE_TICKS {
            self.life as f32 / FADE_TICKS as f32
        } else if self.life > self.max_life.saturating_sub(FADE_TICKS) {
            (self.max_life.saturating_sub(self.life)) as f32 / FADE_TICKS as f32
        } else {
            1.0
        };
        o.clamp(0.0, 1.0)
    }

    /// Trail opacity tracks the head at 70%.
    pub fn trail_opacity(&self) -> f32 {
        self.opacity() * 0.7
    }
}

/// Population manager: at most one spawn per frame while under the cap.
#[derive(Debug)]
pub struct MeteorSpawner {
    pub stars: Vec<ShootingStar>,
    max_stars: usize,
    spawn_chance: f32,
    profile: DeviceProfile,
    rng: SmallRng,
}

impl MeteorSpawner {
    /// One star is launched immediately so the sky is never empty at
    /// startup.
    pub fn new(profile: &DeviceProfile) -> Self {
        Self::with_rng(profile, SmallRng::from_entropy())
    }

    pub fn with_rng(profile: &DeviceProfile, mut rng: SmallRng) -> Self {
        let first = ShootingStar::spawn(profile, &mut rng);
        Self {
            stars: vec![first],
            max_stars: profile.meteor_max,
            spawn_chance: profile.meteor_spawn_chance,
            profile: profile.clone(),
            rng,
        }
    }

    /// Advance all stars, drop the finished ones, then roll the spawn
    /// chance if there is room.
    pub fn update(&mut self) {
        self.stars.retain_mut(|star| star.update());

        if self.stars.len() < self.max_stars && self.rng.gen::<f32>() < self.spawn_chance {
            self.stars.push(ShootingStar::spawn(&self.profile, &mut self.rng));
        }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}
