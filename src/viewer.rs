//! Windowed viewer: event loop, input routing and the frame loop.
//!
//! `resumed` builds the window, GPU context and scene, then spawns one
//! decode thread per configured image; decoded frames come back over a
//! channel and are drained at the top of every redraw. Pointer input is
//! routed through the interaction gate until the intro triggers, and to
//! the orbit controls afterwards.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use crate::animation::Driver;
use crate::audio::{AudioSink, NullAudio};
use crate::camera::{Camera, OrbitControls};
use crate::config::SceneConfig;
use crate::device::{DeviceProfile, Tier};
use crate::error::{AssetError, SceneError};
use crate::gpu::{GpuContext, SceneRenderer};
use crate::interaction;
use crate::raster::Raster;
use crate::scene::Scene;
use crate::texture;
use crate::time::Time;

/// Open a window and run the scene until it is closed.
pub fn run(profile: DeviceProfile, config: SceneConfig) -> Result<(), SceneError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut viewer = Viewer::new(profile, config);
    event_loop.run_app(&mut viewer)?;
    Ok(())
}

fn decode_image(path: &str, frame_size: u32) -> Result<Raster, AssetError> {
    let image = image::open(path)?.to_rgba8();
    let (width, height) = image.dimensions();
    let raster = Raster::from_rgba(image.into_raw(), width, height);
    Ok(texture::neon_frame(&raster, frame_size))
}

/// Kick off one decode thread per image. Failures are logged and the
/// cluster simply keeps waiting with no texture.
fn spawn_decoders(
    images: &[String],
    frame_size: u32,
    tx: Sender<(usize, Raster)>,
) {
    for (group, path) in images.iter().enumerate() {
        let path = path.clone();
        let tx = tx.clone();
        thread::spawn(move || match decode_image(&path, frame_size) {
            Ok(framed) => {
                // the receiver may be gone if the window closed early
                let _ = tx.send((group, framed));
            }
            Err(err) => log::warn!("skipping image {path}: {err}"),
        });
    }
}

struct Viewer {
    profile: DeviceProfile,
    config: SceneConfig,

    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<SceneRenderer>,
    scene: Option<Scene>,

    camera: Camera,
    controls: OrbitControls,
    driver: Driver,
    audio: Box<dyn AudioSink>,
    time: Time,

    decoded: Option<Receiver<(usize, Raster)>>,
    mouse_pressed: bool,
    cursor: (f64, f64),
    last_drag_pos: Option<(f64, f64)>,
}

impl Viewer {
    fn new(profile: DeviceProfile, config: SceneConfig) -> Self {
        let camera = Camera::new(&profile, 16.0 / 9.0);
        let controls = OrbitControls::new(&profile);
        let driver = Driver::new(&profile);
        Self {
            profile,
            config,
            window: None,
            gpu: None,
            renderer: None,
            scene: None,
            camera,
            controls,
            driver,
            audio: Box::new(NullAudio),
            time: Time::new(),
            decoded: None,
            mouse_pressed: false,
            cursor: (0.0, 0.0),
            last_drag_pos: None,
        }
    }

    /// Pick the field of view for the current window shape. Constrained
    /// devices widen the view in portrait orientation.
    fn update_fov(&mut self, width: u32, height: u32) {
        if self.profile.tier == Tier::Constrained {
            self.camera.fov_deg = if height > width {
                self.profile.fov_portrait
            } else {
                self.profile.fov_landscape
            };
        }
        self.camera.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    fn press(&mut self, x: f64, y: f64) {
        let (Some(gpu), Some(scene)) = (&self.gpu, &mut self.scene) else {
            return;
        };
        let viewport = (gpu.config.width as f32, gpu.config.height as f32);
        let outcome = interaction::press(
            x as f32,
            y as f32,
            viewport,
            &self.profile,
            &self.camera,
            &mut self.driver,
            scene,
            &mut self.controls,
            self.audio.as_mut(),
        );
        if outcome.request_fullscreen {
            if let Some(window) = &self.window {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (elapsed, delta) = self.time.update();

        let (Some(gpu), Some(renderer), Some(scene)) =
            (&mut self.gpu, &mut self.renderer, &mut self.scene)
        else {
            return;
        };

        if let Some(rx) = &self.decoded {
            while let Ok((group, raster)) = rx.try_recv() {
                renderer.attach_heart(gpu, group, &raster);
                scene.attach_texture(group, raster);
            }
        }

        self.driver
            .update(scene, &mut self.camera, &mut self.controls, elapsed);
        self.controls.update(&mut self.camera, delta);

        match renderer.render(gpu, scene, &self.camera, elapsed) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                let (w, h) = (gpu.config.width, gpu.config.height);
                gpu.resize(w, h);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
            Err(e) => eprintln!("Render error: {:?}", e),
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Stardrift")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("window creation failed: {err}");
                event_loop.exit();
                return;
            }
        };

        let gpu = match pollster::block_on(GpuContext::new(window.clone())) {
            Ok(gpu) => gpu,
            Err(err) => {
                log::error!("GPU initialization failed: {err}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.update_fov(size.width, size.height);

        let mut rng = SmallRng::from_entropy();
        let scene = Scene::build(&self.profile, &self.config, &mut rng);
        let renderer = SceneRenderer::new(&gpu, &self.profile, &scene);
        log::info!(
            "scene ready: {} galaxy points, {} stars, {} clusters, {} rings",
            scene.galaxy.len(),
            scene.star_total,
            scene.clusters.len(),
            scene.rings.len()
        );

        let (tx, rx) = mpsc::channel();
        spawn_decoders(
            &self.config.heart_images,
            self.profile.neon_texture_size,
            tx,
        );
        self.decoded = Some(rx);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.scene = Some(scene);
        self.renderer = Some(renderer);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.update_fov(size.width, size.height);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    let pressed = state == ElementState::Pressed;
                    if pressed {
                        let (x, y) = self.cursor;
                        self.press(x, y);
                    }
                    self.mouse_pressed = pressed;
                    if !pressed {
                        self.last_drag_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_drag_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        self.controls.rotate(dx, dy);
                    }
                    self.last_drag_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::Touch(touch) => match touch.phase {
                TouchPhase::Started => {
                    self.cursor = (touch.location.x, touch.location.y);
                    self.press(touch.location.x, touch.location.y);
                    self.last_drag_pos = Some((touch.location.x, touch.location.y));
                }
                TouchPhase::Moved => {
                    if let Some((last_x, last_y)) = self.last_drag_pos {
                        let dx = (touch.location.x - last_x) as f32;
                        let dy = (touch.location.y - last_y) as f32;
                        self.controls.rotate(dx, dy);
                    }
                    self.last_drag_pos = Some((touch.location.x, touch.location.y));
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.last_drag_pos = None;
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.controls.zoom(scroll);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}
