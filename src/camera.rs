//! Camera, picking rays, orbit controls and the triggered flythrough.

use glam::{Mat4, Vec3, Vec4};

use crate::device::DeviceProfile;

/// Perspective camera looking at a target point.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(profile: &DeviceProfile, aspect: f32) -> Self {
        Self {
            position: profile.camera_start,
            target: Vec3::ZERO,
            fov_deg: profile.fov,
            aspect,
            near: 0.1,
            far: 100_000.0,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    /// Unproject a window-space point into a world-space picking ray.
    pub fn screen_ray(&self, x: f32, y: f32, width: f32, height: f32) -> Ray {
        let ndc_x = x / width * 2.0 - 1.0;
        let ndc_y = -(y / height * 2.0 - 1.0);
        let inv = self.view_proj().inverse();
        let near = inv * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;
        Ray {
            origin: near,
            direction: (far - near).normalize(),
        }
    }
}

/// World-space picking ray.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Whether the ray hits a sphere (either intersection point).
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return false;
        }
        // nearest hit in front of the origin
        -b + disc.sqrt() >= 0.0
    }
}

/// Spherical orbit around a fixed target with auto-rotation. Disabled
/// until the camera flight hands over control.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub auto_rotate_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl OrbitControls {
    pub fn new(profile: &DeviceProfile) -> Self {
        Self {
            enabled: false,
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.4,
            distance: profile.camera_start.length(),
            auto_rotate_speed: profile.auto_rotate_speed,
            min_distance: profile.min_distance,
            max_distance: profile.max_distance,
            rotate_speed: profile.rotate_speed,
            zoom_speed: profile.zoom_speed,
        }
    }

    /// Adopt the camera's current pose, called when the flight hands
    /// over so orbiting starts from where the flight ended.
    pub fn sync_from(&mut self, camera: &Camera) {
        let offset = camera.position - self.target;
        self.distance = offset.length().clamp(self.min_distance, self.max_distance);
        self.yaw = offset.x.atan2(offset.z);
        self.pitch = (offset.y / offset.length().max(1e-6)).asin();
    }

    /// Pointer-drag rotation, in NDC deltas.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if !self.enabled {
            return;
        }
        self.yaw -= dx * self.rotate_speed * std::f32::consts::TAU;
        self.pitch = (self.pitch + dy * self.rotate_speed * std::f32::consts::PI)
            .clamp(-1.5, 1.5);
    }

    /// Wheel / pinch zoom.
    pub fn zoom(&mut self, delta: f32) {
        if !self.enabled {
            return;
        }
        self.distance =
            (self.distance * (1.0 - delta * self.zoom_speed * 0.1)).clamp(self.min_distance, self.max_distance);
    }

    /// Apply auto-rotation and write the camera pose. No-op while
    /// disabled.
    pub fn update(&mut self, camera: &mut Camera, dt: f32) {
        if !self.enabled {
            return;
        }
        self.yaw += self.auto_rotate_speed * dt * 0.1;
        let cp = self.pitch.cos();
        camera.position = self.target
            + Vec3::new(
                self.yaw.sin() * cp,
                self.pitch.sin(),
                self.yaw.cos() * cp,
            ) * self.distance;
        camera.target = self.target;
    }
}

/// First-segment duration share of the camera flight.
const FLIGHT_SEG_1: f32 = 0.2;
/// Second-segment duration share.
const FLIGHT_SEG_2: f32 = 0.55;
/// Final eased-segment duration share.
const FLIGHT_SEG_3: f32 = 0.4;

/// Result of stepping the flight one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightStep {
    /// New camera position; keep flying.
    Running(Vec3),
    /// Final position; enable orbit controls and drop the flight.
    Complete(Vec3),
}

/// Scripted three-segment camera path from the idle pose to the orbit
/// start: drop to the galactic plane, pull back along z, then an eased
/// swing up to the final vantage.
#[derive(Debug, Clone)]
pub struct CameraFlight {
    start: Vec3,
    mid1: Vec3,
    mid2: Vec3,
    end: Vec3,
    step: f32,
    progress: f32,
}

impl CameraFlight {
    pub fn new(start: Vec3, profile: &DeviceProfile) -> Self {
        Self {
            start,
            mid1: Vec3::new(start.x, 0.0, start.z),
            mid2: Vec3::new(start.x, 0.0, profile.flight_mid_z),
            end: profile.flight_end,
            step: profile.flight_step,
            progress: 0.0,
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Advance one frame and return the camera position for it.
    pub fn advance(&mut self) -> FlightStep {
        self.progress += self.step;
        let p = self.progress;

        if p < FLIGHT_SEG_1 {
            let t = p / FLIGHT_SEG_1;
            FlightStep::Running(self.start.lerp(self.mid1, t))
        } else if p < FLIGHT_SEG_1 + FLIGHT_SEG_2 {
            let t = (p - FLIGHT_SEG_1) / FLIGHT_SEG_2;
            FlightStep::Running(self.mid1.lerp(self.mid2, t))
        } else if p < FLIGHT_SEG_1 + FLIGHT_SEG_2 + FLIGHT_SEG_3 {
            let t = (p - FLIGHT_SEG_1 - FLIGHT_SEG_2) / FLIGHT_SEG_3;
            let eased = 0.5 - 0.5 * (std::f32::consts::PI * t).cos();
            FlightStep::Running(self.mid2.lerp(self.end, eased))
        } else {
            FlightStep::Complete(self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Tier;

    fn profile() -> DeviceProfile {
        DeviceProfile::for_tier(Tier::Full, false)
    }

    #[test]
    fn test_ray_hits_centered_sphere() {
        let camera = Camera::new(&profile(), 16.0 / 9.0);
        // screen center looks at the origin where the planet sits
        let ray = camera.screen_ray(400.0, 300.0, 800.0, 600.0);
        assert!(ray.intersects_sphere(Vec3::ZERO, profile().planet_radius));
    }

    #[test]
    fn test_ray_misses_off_center() {
        let camera = Camera::new(&profile(), 16.0 / 9.0);
        let ray = camera.screen_ray(5.0, 5.0, 800.0, 600.0);
        assert!(!ray.intersects_sphere(Vec3::ZERO, profile().planet_radius));
    }

    #[test]
    fn test_sphere_behind_ray_misses() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::Z,
        };
        assert!(!ray.intersects_sphere(Vec3::ZERO, 1.0));
    }

    #[test]
    fn test_flight_progress_monotone_to_end() {
        let p = profile();
        let mut flight = CameraFlight::new(p.camera_start, &p);
        let mut last = flight.progress();
        let mut steps = 0;
        loop {
            let step = flight.advance();
            assert!(flight.progress() > last);
            last = flight.progress();
            steps += 1;
            assert!(steps < 10_000);
            match step {
                FlightStep::Running(_) => {}
                FlightStep::Complete(pos) => {
                    assert_eq!(pos, p.flight_end);
                    break;
                }
            }
        }
        // total duration ~ (0.2 + 0.55 + 0.4) / step
        let expected = (1.15 / p.flight_step) as i32;
        assert!((steps - expected).abs() <= 2);
    }

    #[test]
    fn test_flight_first_segment_drops_to_plane() {
        let p = profile();
        let mut flight = CameraFlight::new(Vec3::new(0.0, 20.0, 30.0), &p);
        let mut pos = Vec3::ZERO;
        // run just shy of the end of segment one
        let frames = (FLIGHT_SEG_1 / p.flight_step) as usize - 1;
        for _ in 0..frames {
            if let FlightStep::Running(np) = flight.advance() {
                pos = np;
            }
        }
        // x and z hold, y sinks toward the plane
        assert!((pos.x - 0.0).abs() < 1e-4);
        assert!((pos.z - 30.0).abs() < 1e-4);
        assert!(pos.y < 20.0 && pos.y > 0.0);
    }

    #[test]
    fn test_orbit_sync_adopts_pose() {
        let p = profile();
        let mut camera = Camera::new(&p, 1.5);
        camera.position = p.flight_end;
        let mut controls = OrbitControls::new(&p);
        controls.sync_from(&camera);
        controls.enabled = true;
        controls.update(&mut camera, 0.0);
        // distance preserved through the handover
        assert!((camera.position.length() - p.flight_end.length()).abs() < 1.0);
    }

    #[test]
    fn test_disabled_controls_do_nothing() {
        let p = profile();
        let mut camera = Camera::new(&p, 1.5);
        let before = camera.position;
        let mut controls = OrbitControls::new(&p);
        controls.rotate(0.3, 0.3);
        controls.zoom(1.0);
        controls.update(&mut camera, 0.016);
        assert_eq!(camera.position, before);
    }
}
