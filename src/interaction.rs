//! The one-shot pointer gate in front of the intro.
//!
//! The first click or tap whose picking ray hits the planet fires the
//! transition; everything after that is ignored here (orbit input goes
//! through the controls instead). Side effects the host must perform,
//! like requesting fullscreen on constrained devices, come back as
//! fields of [`GateOutcome`] rather than being executed inline.

use crate::animation::Driver;
use crate::audio::AudioSink;
use crate::camera::{Camera, OrbitControls};
use crate::device::{DeviceProfile, Tier};
use crate::scene::Scene;
use glam::Vec3;

/// What a pointer press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOutcome {
    /// The press hit the planet and fired the transition.
    pub triggered: bool,
    /// The host should request fullscreen (constrained tier only).
    pub request_fullscreen: bool,
}

impl GateOutcome {
    const IGNORED: Self = Self {
        triggered: false,
        request_fullscreen: false,
    };
}

/// Handle a pointer press at window coordinates `(x, y)`.
///
/// Returns immediately once the intro has started; otherwise casts a
/// ray through the press point and fires the driver on a planet hit.
#[allow(clippy::too_many_arguments)]
pub fn press(
    x: f32,
    y: f32,
    viewport: (f32, f32),
    profile: &DeviceProfile,
    camera: &Camera,
    driver: &mut Driver,
    scene: &mut Scene,
    controls: &mut OrbitControls,
    audio: &mut dyn AudioSink,
) -> GateOutcome {
    if driver.state.intro_started {
        return GateOutcome::IGNORED;
    }

    let ray = camera.screen_ray(x, y, viewport.0, viewport.1);
    if !ray.intersects_sphere(Vec3::ZERO, profile.planet_radius) {
        return GateOutcome::IGNORED;
    }

    driver.trigger(scene, camera, controls, audio);
    GateOutcome {
        triggered: true,
        request_fullscreen: profile.tier == Tier::Constrained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::config::SceneConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn harness(tier: Tier) -> (DeviceProfile, Scene, Camera, OrbitControls, Driver) {
        let profile = DeviceProfile::for_tier(tier, tier == Tier::Constrained);
        let config = SceneConfig::default().with_heart_images(["a.jpg"]);
        let mut rng = SmallRng::seed_from_u64(3);
        let scene = Scene::build(&profile, &config, &mut rng);
        let camera = Camera::new(&profile, 800.0 / 600.0);
        let controls = OrbitControls::new(&profile);
        let driver = Driver::new(&profile);
        (profile, scene, camera, controls, driver)
    }

    #[test]
    fn test_center_press_triggers() {
        let (profile, mut scene, camera, mut controls, mut driver) = harness(Tier::Full);
        let outcome = press(
            400.0,
            300.0,
            (800.0, 600.0),
            &profile,
            &camera,
            &mut driver,
            &mut scene,
            &mut controls,
            &mut NullAudio,
        );
        assert!(outcome.triggered);
        assert!(!outcome.request_fullscreen);
        assert!(driver.state.intro_started);
        assert_eq!(scene.star_draw, scene.star_total);
    }

    #[test]
    fn test_corner_press_ignored() {
        let (profile, mut scene, camera, mut controls, mut driver) = harness(Tier::Full);
        let outcome = press(
            2.0,
            2.0,
            (800.0, 600.0),
            &profile,
            &camera,
            &mut driver,
            &mut scene,
            &mut controls,
            &mut NullAudio,
        );
        assert!(!outcome.triggered);
        assert!(!driver.state.intro_started);
        assert!(scene.star_draw < scene.star_total);
    }

    #[test]
    fn test_presses_after_trigger_ignored() {
        let (profile, mut scene, camera, mut controls, mut driver) = harness(Tier::Full);
        let first = press(
            400.0,
            300.0,
            (800.0, 600.0),
            &profile,
            &camera,
            &mut driver,
            &mut scene,
            &mut controls,
            &mut NullAudio,
        );
        assert!(first.triggered);
        let second = press(
            400.0,
            300.0,
            (800.0, 600.0),
            &profile,
            &camera,
            &mut driver,
            &mut scene,
            &mut controls,
            &mut NullAudio,
        );
        assert_eq!(second, GateOutcome::IGNORED);
    }

    #[test]
    fn test_constrained_tier_requests_fullscreen() {
        let (profile, mut scene, camera, mut controls, mut driver) = harness(Tier::Constrained);
        let outcome = press(
            400.0,
            300.0,
            (800.0, 600.0),
            &profile,
            &camera,
            &mut driver,
            &mut scene,
            &mut controls,
            &mut NullAudio,
        );
        assert!(outcome.triggered);
        assert!(outcome.request_fullscreen);
    }
}
