//! Per-frame animation and the idle/triggered state machine.
//!
//! The scene has exactly two states and one transition: Idle until the
//! planet is activated, then Triggered forever. The [`Driver`] owns the
//! state and applies every per-frame mutation in a fixed order:
//!
//! 1. hint bob/pulse (or hide),
//! 2. fade ramp,
//! 3. shooting-star population,
//! 4. heart-cluster LOD swaps,
//! 5. ring spin and oscillator sampling,
//! 6. the state opacity/color pass (last, so nothing later in the
//!    frame undoes the forced ring opacity),
//! 7. camera-flight stepping, handing over to orbit controls when done,
//! 8. the starfield opacity override.

use glam::Vec3;
use log::warn;

use crate::audio::AudioSink;
use crate::camera::{Camera, CameraFlight, FlightStep, OrbitControls};
use crate::device::DeviceProfile;
use crate::scene::{LodMode, Role, Scene};

/// Hint tap frequency in Hz.
const TAP_FREQUENCY: f32 = 2.5;

/// Idle opacity of everything that fades in later.
const IDLE_DIM: f32 = 0.1;

/// Mutable intro state. `intro_started` is one-way; `fade_opacity`
/// never decreases once the fade is in progress.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub intro_started: bool,
    pub fade_in_progress: bool,
    pub fade_opacity: f32,
}

impl SceneState {
    pub fn new() -> Self {
        Self {
            intro_started: false,
            fade_in_progress: false,
            fade_opacity: IDLE_DIM,
        }
    }
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the state machine and applies the per-frame update.
pub struct Driver {
    profile: DeviceProfile,
    pub state: SceneState,
    flight: Option<CameraFlight>,
}

impl Driver {
    pub fn new(profile: &DeviceProfile) -> Self {
        Self {
            profile: profile.clone(),
            state: SceneState::new(),
            flight: None,
        }
    }

    /// Whether the camera flight is still running.
    pub fn in_flight(&self) -> bool {
        self.flight.is_some()
    }

    /// Fire the one-way transition. Idempotent: repeat calls do
    /// nothing. Audio rejection is logged and ignored.
    pub fn trigger(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        controls: &mut OrbitControls,
        audio: &mut dyn AudioSink,
    ) {
        if self.state.intro_started {
            return;
        }
        self.state.intro_started = true;
        self.state.fade_in_progress = true;

        scene.star_draw = scene.star_total;

        if let Err(e) = audio.play_loop() {
            warn!("soundtrack did not start: {e}");
        }

        controls.enabled = false;
        self.flight = Some(CameraFlight::new(camera.position, &self.profile));
    }

    /// Apply one frame. `time` is elapsed seconds.
    pub fn update(
        &mut self,
        scene: &mut Scene,
        camera: &mut Camera,
        controls: &mut OrbitControls,
        time: f32,
    ) {
        self.animate_hint(scene, camera.position, time);

        if self.state.fade_in_progress && self.state.fade_opacity < 1.0 {
            self.state.fade_opacity =
                (self.state.fade_opacity + self.profile.fade_step).min(1.0);
        }

        scene.meteors.update();
        self.swap_lod(scene, camera.position);
        self.animate_rings(scene, time);
        self.apply_state_pass(scene);
        self.step_flight(camera, controls);

        // The starfield stays fully lit no matter what the passes above
        // decided.
        let star = scene.graph.node_mut(scene.starfield_node);
        star.opacity = 1.0;
        star.transparent = false;
    }

    fn animate_hint(&self, scene: &mut Scene, eye: Vec3, time: f32) {
        if self.state.intro_started {
            for id in [scene.hint_icon, scene.hint_ring, scene.hint_text] {
                scene.graph.node_mut(id).visible = false;
            }
            return;
        }

        let tap = (time * TAP_FREQUENCY).sin();
        let initial = Vec3::new(1.5, 1.5, self.profile.hint_icon_z);
        // the icon taps along its line of sight toward the planet
        let toward_planet = (-initial).normalize();
        let offset = toward_planet * -(tap * self.profile.hint_tap_amplitude);

        let icon = scene.graph.node_mut(scene.hint_icon);
        icon.visible = true;
        icon.position = initial + offset;

        let ring = scene.graph.node_mut(scene.hint_ring);
        ring.visible = true;
        ring.position = initial + offset;
        ring.scale = Vec3::splat(self.profile.hint_icon_scale * (1.0 + tap * 0.1));
        ring.opacity = 0.5 + tap * 0.2;
        ring.transparent = true;

        let text = scene.graph.node_mut(scene.hint_text);
        text.visible = true;
        text.opacity = 0.7 + (time * 3.0).sin() * 0.3;
        text.transparent = true;
        text.position.y = self.profile.hint_text_y + (time * 2.0).sin() * 0.5;
        // billboard toward the camera
        let to_eye = eye - text.position;
        text.rotation.y = to_eye.x.atan2(to_eye.z);
    }

    fn swap_lod(&self, scene: &mut Scene, eye: Vec3) {
        for cluster in &mut scene.clusters {
            if cluster.texture.is_none() {
                continue;
            }
            let mode = if cluster.any_point_within(eye, self.profile.lod_near_distance) {
                LodMode::Near
            } else {
                LodMode::Far
            };
            cluster.mode = mode;
        }
    }

    fn animate_rings(&self, scene: &mut Scene, time: f32) {
        for entity in &mut scene.rings {
            entity.ring.advance();
            let node = scene.graph.node_mut(entity.node);
            node.rotation = entity.ring.rotation_at(time);
            node.position.y = entity.ring.bob_at(time);
        }
    }

    /// The opacity/color pass, applied after all other mutation so the
    /// forced values win the frame.
    fn apply_state_pass(&mut self, scene: &mut Scene) {
        if !self.state.intro_started {
            self.state.fade_opacity = IDLE_DIM;
            for (_, node) in scene.graph.iter_mut() {
                match node.role {
                    Role::Starfield | Role::Ring => {
                        node.transparent = false;
                        node.opacity = 1.0;
                        if node.role == Role::Ring {
                            node.color = Vec3::ONE;
                        }
                    }
                    Role::Focal | Role::Glow => {
                        node.visible = true;
                    }
                    Role::Hint => {}
                    Role::Ambient | Role::Heart => {
                        node.transparent = true;
                        node.opacity = IDLE_DIM;
                    }
                }
            }
        } else {
            let fade = self.state.fade_opacity;
            for (_, node) in scene.graph.iter_mut() {
                match node.role {
                    Role::Ring | Role::Focal | Role::Glow => {
                        node.opacity = 1.0;
                        node.transparent = false;
                    }
                    Role::Hint => {
                        node.visible = false;
                    }
                    _ => {
                        node.transparent = true;
                        node.opacity = fade;
                    }
                }
                // every base color is stamped white each frame
                node.color = Vec3::ONE;
            }
        }
    }

    fn step_flight(&mut self, camera: &mut Camera, controls: &mut OrbitControls) {
        let Some(flight) = &mut self.flight else {
            return;
        };
        match flight.advance() {
            FlightStep::Running(position) => {
                camera.position = position;
                camera.target = Vec3::ZERO;
            }
            FlightStep::Complete(position) => {
                camera.position = position;
                camera.target = Vec3::ZERO;
                controls.target = Vec3::ZERO;
                controls.sync_from(camera);
                controls.enabled = true;
                self.flight = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::config::SceneConfig;
    use crate::device::Tier;
    use crate::raster::Raster;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn harness() -> (DeviceProfile, Scene, Camera, OrbitControls, Driver) {
        let profile = DeviceProfile::for_tier(Tier::Constrained, true);
        let config = SceneConfig::default().with_heart_images(["a.jpg", "b.jpg"]);
        let mut rng = SmallRng::seed_from_u64(21);
        let scene = Scene::build(&profile, &config, &mut rng);
        let camera = Camera::new(&profile, 1.5);
        let controls = OrbitControls::new(&profile);
        let driver = Driver::new(&profile);
        (profile, scene, camera, controls, driver)
    }

    #[test]
    fn test_idle_forcing() {
        let (_, mut scene, mut camera, mut controls, mut driver) = harness();
        driver.update(&mut scene, &mut camera, &mut controls, 0.5);

        assert!(!driver.state.intro_started);
        assert_eq!(driver.state.fade_opacity, 0.1);
        assert_eq!(scene.graph.node(scene.galaxy_node).opacity, 0.1);
        assert_eq!(scene.graph.node(scene.starfield_node).opacity, 1.0);
        for entity in &scene.rings {
            let node = scene.graph.node(entity.node);
            assert_eq!(node.opacity, 1.0);
            assert!(!node.transparent);
            assert_eq!(node.color, Vec3::ONE);
        }
        assert!(scene.graph.node(scene.hint_icon).visible);
        assert!(scene.graph.node(scene.hint_text).visible);
    }

    #[test]
    fn test_trigger_is_one_way_and_idempotent() {
        let (_, mut scene, mut camera, mut controls, mut driver) = harness();
        let mut audio = NullAudio;
        driver.trigger(&mut scene, &camera, &mut controls, &mut audio);
        assert!(driver.state.intro_started);
        assert_eq!(scene.star_draw, scene.star_total);
        assert!(driver.in_flight());

        // repeat trigger changes nothing
        let fade = driver.state.fade_opacity;
        driver.trigger(&mut scene, &camera, &mut controls, &mut audio);
        assert_eq!(driver.state.fade_opacity, fade);

        driver.update(&mut scene, &mut camera, &mut controls, 1.0);
        assert!(driver.state.intro_started);
        assert!(!scene.graph.node(scene.hint_icon).visible);
    }

    #[test]
    fn test_fade_monotone_and_clamped() {
        let (profile, mut scene, mut camera, mut controls, mut driver) = harness();
        driver.trigger(&mut scene, &camera, &mut controls, &mut NullAudio);
        let mut last = driver.state.fade_opacity;
        for i in 0..60 {
            driver.update(&mut scene, &mut camera, &mut controls, i as f32 * 0.016);
            assert!(driver.state.fade_opacity >= last);
            assert!(driver.state.fade_opacity <= 1.0);
            last = driver.state.fade_opacity;
        }
        assert_eq!(last, 1.0);
        // ~ (1.0 - 0.1) / step frames to saturate
        assert!(60.0 * profile.fade_step > 0.9);
    }

    #[test]
    fn test_forced_white_every_frame() {
        let (_, mut scene, mut camera, mut controls, mut driver) = harness();
        driver.trigger(&mut scene, &camera, &mut controls, &mut NullAudio);
        driver.update(&mut scene, &mut camera, &mut controls, 0.1);

        // stain a node, then confirm the next frame restores white
        scene.graph.node_mut(scene.galaxy_node).color = Vec3::new(0.2, 0.3, 0.4);
        driver.update(&mut scene, &mut camera, &mut controls, 0.2);
        for (_, node) in scene.graph.iter() {
            assert_eq!(node.color, Vec3::ONE);
        }
    }

    #[test]
    fn test_flight_completes_and_enables_controls() {
        let (profile, mut scene, mut camera, mut controls, mut driver) = harness();
        driver.trigger(&mut scene, &camera, &mut controls, &mut NullAudio);
        assert!(!controls.enabled);

        let mut frames = 0;
        while driver.in_flight() {
            driver.update(&mut scene, &mut camera, &mut controls, frames as f32 * 0.016);
            frames += 1;
            assert!(frames < 10_000, "flight never completed");
        }
        assert!(controls.enabled);
        assert_eq!(camera.position, profile.flight_end);
    }

    #[test]
    fn test_lod_swap_requires_texture() {
        let (_, mut scene, mut camera, mut controls, mut driver) = harness();
        let pivot = scene.clusters[0].pivot;
        let near_point = scene.clusters[0].field.positions.point(0) + pivot;
        camera.position = near_point;

        // untextured cluster never swaps
        driver.update(&mut scene, &mut camera, &mut controls, 0.0);
        assert_eq!(scene.clusters[0].mode, LodMode::Far);

        scene.attach_texture(0, Raster::new(4, 4));
        driver.update(&mut scene, &mut camera, &mut controls, 0.1);
        assert_eq!(scene.clusters[0].mode, LodMode::Near);

        // moving away swaps back; no hysteresis
        camera.position = Vec3::splat(5_000.0);
        driver.update(&mut scene, &mut camera, &mut controls, 0.2);
        assert_eq!(scene.clusters[0].mode, LodMode::Far);
    }

    #[test]
    fn test_rings_spin_every_frame() {
        let (_, mut scene, mut camera, mut controls, mut driver) = harness();
        let before: Vec<f32> = scene.rings.iter().map(|r| r.ring.angle_offset).collect();
        driver.update(&mut scene, &mut camera, &mut controls, 0.0);
        for (entity, prev) in scene.rings.iter().zip(before) {
            assert!(entity.ring.angle_offset > prev);
            let node = scene.graph.node(entity.node);
            assert!((node.rotation.y - entity.ring.angle_offset).abs() < 1e-6);
        }
    }
}
