//! End-to-end tests of the headless scene: build, idle, press, fade,
//! flythrough. The GPU host is not involved; everything here runs on
//! the CPU-side scene graph.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use stardrift::animation::Driver;
use stardrift::audio::NullAudio;
use stardrift::camera::{Camera, OrbitControls};
use stardrift::config::SceneConfig;
use stardrift::device::{DeviceProfile, Tier};
use stardrift::interaction;
use stardrift::scene::Scene;
use stardrift::Vec3;

const VIEWPORT: (f32, f32) = (1280.0, 720.0);

struct Harness {
    profile: DeviceProfile,
    scene: Scene,
    camera: Camera,
    controls: OrbitControls,
    driver: Driver,
    audio: NullAudio,
    frame: u32,
}

impl Harness {
    fn new(tier: Tier) -> Self {
        let profile = DeviceProfile::for_tier(tier, tier == Tier::Constrained);
        let config = SceneConfig::default().with_heart_images(["a.jpg", "b.jpg", "c.jpg"]);
        let mut rng = SmallRng::seed_from_u64(2024);
        let scene = Scene::build(&profile, &config, &mut rng);
        let camera = Camera::new(&profile, VIEWPORT.0 / VIEWPORT.1);
        let controls = OrbitControls::new(&profile);
        let driver = Driver::new(&profile);
        Self {
            profile,
            scene,
            camera,
            controls,
            driver,
            audio: NullAudio,
            frame: 0,
        }
    }

    fn step(&mut self) {
        self.frame += 1;
        let time = self.frame as f32 / 60.0;
        self.driver
            .update(&mut self.scene, &mut self.camera, &mut self.controls, time);
        self.controls.update(&mut self.camera, 1.0 / 60.0);
    }

    fn press_center(&mut self) -> interaction::GateOutcome {
        interaction::press(
            VIEWPORT.0 / 2.0,
            VIEWPORT.1 / 2.0,
            VIEWPORT,
            &self.profile,
            &self.camera,
            &mut self.driver,
            &mut self.scene,
            &mut self.controls,
            &mut self.audio,
        )
    }
}

#[test]
fn test_full_intro_sequence() {
    let mut h = Harness::new(Tier::Full);

    // a few idle frames: dimmed ambience, visible hint, partial starfield
    for _ in 0..10 {
        h.step();
    }
    assert!(!h.driver.state.intro_started);
    assert!(h.scene.star_draw < h.scene.star_total);
    assert!(h.scene.graph.node(h.scene.hint_icon).visible);
    assert_eq!(h.scene.graph.node(h.scene.galaxy_node).opacity, 0.1);

    // the press lands on the planet at screen center
    let outcome = h.press_center();
    assert!(outcome.triggered);
    assert_eq!(h.scene.star_draw, h.scene.star_total);
    assert!(!h.controls.enabled);

    // run until the flythrough hands over to the orbit controls
    let mut frames = 0u32;
    while h.driver.in_flight() {
        h.step();
        frames += 1;
        assert!(frames < 10_000, "flight never completed");
    }
    assert!(h.controls.enabled);
    assert_eq!(h.camera.position, h.profile.flight_end);

    // by now the fade has saturated and the hint is gone
    assert_eq!(h.driver.state.fade_opacity, 1.0);
    assert_eq!(h.scene.graph.node(h.scene.galaxy_node).opacity, 1.0);
    assert!(!h.scene.graph.node(h.scene.hint_icon).visible);
    for entity in &h.scene.rings {
        let node = h.scene.graph.node(entity.node);
        assert_eq!(node.opacity, 1.0);
        assert_eq!(node.color, Vec3::ONE);
    }
}

#[test]
fn test_press_on_constrained_tier_asks_for_fullscreen() {
    let mut h = Harness::new(Tier::Constrained);
    let outcome = h.press_center();
    assert!(outcome.triggered);
    assert!(outcome.request_fullscreen);
}

#[test]
fn test_second_press_is_ignored() {
    let mut h = Harness::new(Tier::Full);
    assert!(h.press_center().triggered);
    let again = h.press_center();
    assert!(!again.triggered);
    assert!(!again.request_fullscreen);
}

#[test]
fn test_miss_keeps_scene_idle() {
    let mut h = Harness::new(Tier::Full);
    let outcome = interaction::press(
        5.0,
        5.0,
        VIEWPORT,
        &h.profile,
        &h.camera,
        &mut h.driver,
        &mut h.scene,
        &mut h.controls,
        &mut h.audio,
    );
    assert!(!outcome.triggered);
    h.step();
    assert!(!h.driver.state.intro_started);
    assert!(h.scene.star_draw < h.scene.star_total);
}

#[test]
fn test_config_shapes_the_scene() {
    let profile = DeviceProfile::for_tier(Tier::Full, false);
    let config = SceneConfig::default()
        .with_heart_images(["one.png", "two.png"])
        .with_ring_texts(["Alpha", "Beta", "Gamma"]);
    let mut rng = SmallRng::seed_from_u64(9);
    let scene = Scene::build(&profile, &config, &mut rng);

    assert_eq!(scene.clusters.len(), 2);
    assert_eq!(scene.rings.len(), 3);

    // ring radii climb outward from the planet
    for pair in scene.rings.windows(2) {
        assert!(pair[1].ring.radius > pair[0].ring.radius);
    }
    assert!(scene.rings[0].ring.radius > profile.planet_radius);
}

#[test]
fn test_ring_bands_carry_ink() {
    let profile = DeviceProfile::for_tier(Tier::Full, false);
    let config = SceneConfig::default();
    let mut rng = SmallRng::seed_from_u64(31);
    let scene = Scene::build(&profile, &config, &mut rng);

    for entity in &scene.rings {
        let band = &entity.ring.band;
        assert_eq!(band.raster.height, profile.ring_texture_height);
        assert!(band.raster.data.chunks_exact(4).any(|px| px[3] > 0));
        assert!(band.repeat_factor > 0.0);
    }
}

#[test]
fn test_builds_are_deterministic_per_seed() {
    let profile = DeviceProfile::for_tier(Tier::Constrained, true);
    let config = SceneConfig::default().with_heart_images(["a.jpg"]);
    let a = Scene::build(&profile, &config, &mut SmallRng::seed_from_u64(77));
    let b = Scene::build(&profile, &config, &mut SmallRng::seed_from_u64(77));

    assert_eq!(a.galaxy.positions, b.galaxy.positions);
    assert_eq!(a.galaxy.colors, b.galaxy.colors);
    assert_eq!(a.starfield.positions, b.starfield.positions);
    assert_eq!(a.clusters[0].pivot, b.clusters[0].pivot);
}

#[test]
fn test_constrained_budgets_are_smaller() {
    let full = DeviceProfile::for_tier(Tier::Full, false);
    let constrained = DeviceProfile::for_tier(Tier::Constrained, true);

    assert!(constrained.galaxy_count < full.galaxy_count);
    assert!(constrained.star_count < full.star_count);
    assert!(constrained.planet_texture_size < full.planet_texture_size);
    assert!(constrained.meteor_max <= full.meteor_max);
    assert!(constrained.planet_radius < full.planet_radius);
}

#[test]
fn test_meteors_stay_bounded_over_a_long_run() {
    let mut h = Harness::new(Tier::Constrained);
    h.press_center();
    for _ in 0..3_000 {
        h.step();
        assert!(h.scene.meteors.len() <= h.profile.meteor_max);
    }
}
