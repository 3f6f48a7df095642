//! # Stardrift
//!
//! A procedural 3D intro scene: a glowing planet inside a spiral
//! galaxy, orbited by rings of text, with image clusters, shooting
//! stars and a one-shot click-to-start transition.
//!
//! Everything on screen is generated at startup from a device-tier
//! profile; there are no asset files beyond the optional cluster
//! images, which decode on background threads and attach when ready.
//!
//! ## Quick Start
//!
//! ```ignore
//! use stardrift::config::SceneConfig;
//! use stardrift::device::DeviceProfile;
//! use stardrift::viewer;
//!
//! fn main() {
//!     env_logger::init();
//!     let profile = DeviceProfile::detect();
//!     let config = SceneConfig::default()
//!         .with_ring_texts(["Hello", "World"]);
//!     viewer::run(profile, config).unwrap();
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Device tiers
//!
//! Every knob in the scene (particle counts, texture sizes, camera
//! framing) comes from a [`device::DeviceProfile`], resolved once at
//! startup from environment signals. A constrained tier halves most
//! budgets; the full tier matches the original desktop experience.
//!
//! ### The intro gate
//!
//! The scene idles dimmed until a pointer press lands on the planet.
//! That single press fires the whole transition: fade-in, camera
//! flythrough, full starfield, soundtrack. Everything before the press
//! is driven by [`animation::Driver`] in its idle state.
//!
//! ### Procedural assets
//!
//! | asset            | module      | generated from                 |
//! |------------------|-------------|--------------------------------|
//! | galaxy / hearts  | [`field`]   | spiral sampling with rejection |
//! | planet surface   | [`texture`] | gradient + spots + swirls      |
//! | ring text bands  | [`texture`] | embedded 8x8 bitmap font       |
//! | sprites / glows  | [`texture`] | radial gradients               |
//!
//! ## Feature Overview
//!
//! | Category     | Types |
//! |--------------|-------|
//! | Profiles     | [`device::DeviceProfile`], [`device::Tier`] |
//! | Generation   | [`field::spiral_galaxy`], [`field::heart_cluster`], [`texture::planet_surface`] |
//! | Scene        | [`scene::Scene`], [`scene::SceneGraph`], [`rings::TextRing`] |
//! | Animation    | [`animation::Driver`], [`camera::CameraFlight`], [`meteor::MeteorSpawner`] |
//! | Interaction  | [`interaction::press`], [`camera::OrbitControls`] |
//! | Hosting      | [`viewer::run`], [`gpu::GpuContext`] |

pub mod animation;
pub mod audio;
pub mod camera;
pub mod config;
pub mod device;
pub mod error;
pub mod field;
pub mod font;
pub mod gpu;
pub mod interaction;
pub mod mesh;
pub mod meteor;
pub mod raster;
pub mod rings;
pub mod scene;
pub mod texture;
pub mod time;
pub mod viewer;

pub use glam::{Vec2, Vec3, Vec4};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use stardrift::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::Driver;
    pub use crate::audio::{AudioSink, NullAudio};
    pub use crate::camera::{Camera, CameraFlight, OrbitControls};
    pub use crate::config::SceneConfig;
    pub use crate::device::{DeviceProfile, EnvSignals, Tier};
    pub use crate::error::{AssetError, AudioError, GpuError, SceneError};
    pub use crate::field::{GalaxyParams, HeartField, ParticleField};
    pub use crate::interaction::{self, GateOutcome};
    pub use crate::meteor::MeteorSpawner;
    pub use crate::raster::Raster;
    pub use crate::rings::TextRing;
    pub use crate::scene::{LodMode, Role, Scene, SceneNode};
    pub use crate::time::Time;
    pub use crate::viewer;
    pub use crate::{Vec2, Vec3, Vec4};
}
