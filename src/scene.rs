//! Role-tagged scene registry and the full scene builder.
//!
//! Entities register with an explicit [`Role`] so the per-frame driver
//! iterates by role instead of matching on names. Heart-cluster
//! textures arrive asynchronously as `(group, raster)` attach messages
//! drained at frame start; a cluster with no texture bound yet is
//! simply not drawn.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::SceneConfig;
use crate::device::DeviceProfile;
use crate::field::{self, GalaxyParams, HeartField, ParticleField};
use crate::meteor::MeteorSpawner;
use crate::raster::Raster;
use crate::rings::{self, TextRing};
use crate::texture;

/// What an entity is, for the state driver's opacity/color passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The planet. Always fully opaque.
    Focal,
    /// The central glow sprite. Treated like the planet.
    Glow,
    /// A text ring. Forced opaque and white.
    Ring,
    /// Hint icon/ring/label. Visible only while idle.
    Hint,
    /// The starfield. Always fully opaque, draw range varies.
    Starfield,
    /// Everything that fades in on trigger (galaxy, nebulae, meteors).
    Ambient,
    /// An image point cluster. Fades like ambient, swaps LOD colors.
    Heart,
}

/// Handle into the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

/// Per-entity render state mutated by the driver each frame.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub role: Role,
    pub position: Vec3,
    /// Euler angles (x, y, z).
    pub rotation: Vec3,
    pub scale: Vec3,
    pub opacity: f32,
    pub transparent: bool,
    /// Material base color multiplier.
    pub color: Vec3,
    pub visible: bool,
}

impl SceneNode {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            opacity: 1.0,
            transparent: false,
            color: Vec3::ONE,
            visible: true,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }
}

/// Flat registry of scene nodes.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut SceneNode)> {
        self.nodes
            .iter_mut()
            .enumerate()
            .map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Which color set a heart cluster currently binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LodMode {
    /// Within the near threshold: uniform white, opaque material.
    Near,
    /// Distant: gradient colors, additive material.
    Far,
}

/// One image cluster and its per-frame LOD state.
#[derive(Debug)]
pub struct HeartCluster {
    pub node: NodeId,
    pub field: HeartField,
    /// World position of the cluster (the pre-recenter centroid).
    pub pivot: Vec3,
    pub mode: LodMode,
    /// Framed image texture; `None` until the async decode delivers.
    pub texture: Option<Raster>,
}

impl HeartCluster {
    /// True when ANY point of the cluster lies within `threshold` of
    /// `eye`. Short-circuits on the first hit.
    pub fn any_point_within(&self, eye: Vec3, threshold: f32) -> bool {
        let t2 = threshold * threshold;
        (0..self.field.len())
            .any(|i| (self.field.positions.point(i) + self.pivot).distance_squared(eye) < t2)
    }
}

/// A text ring and its graph node.
#[derive(Debug)]
pub struct RingEntity {
    pub ring: TextRing,
    pub node: NodeId,
}

/// The complete built scene: registry, generated fields and textures,
/// and the live per-frame state.
pub struct Scene {
    pub graph: SceneGraph,

    pub planet: NodeId,
    pub glow: NodeId,
    pub nebulae: Vec<NodeId>,
    pub galaxy_node: NodeId,
    pub starfield_node: NodeId,
    pub hint_icon: NodeId,
    pub hint_ring: NodeId,
    pub hint_text: NodeId,

    pub rings: Vec<RingEntity>,
    pub clusters: Vec<HeartCluster>,
    pub meteors: MeteorSpawner,

    pub galaxy: ParticleField,
    pub starfield: ParticleField,
    /// Total starfield points; the full draw range after trigger.
    pub star_total: usize,
    /// Currently drawn starfield points (reduced while idle).
    pub star_draw: usize,

    pub planet_texture: Raster,
    pub glow_texture: Raster,
    pub nebula_textures: Vec<Raster>,
    pub hint_icon_texture: Raster,
    pub hint_ring_texture: Raster,
    pub hint_text_texture: Raster,
}

impl Scene {
    /// Generate every procedural asset and register all entities.
    pub fn build(profile: &DeviceProfile, config: &SceneConfig, rng: &mut SmallRng) -> Self {
        let mut graph = SceneGraph::default();
        let params = GalaxyParams::from_profile(profile);

        let planet = graph.insert(
            SceneNode::new(Role::Focal).scaled(profile.planet_radius),
        );
        let glow = graph.insert(SceneNode::new(Role::Glow).scaled(profile.glow_scale));

        let mut nebulae = Vec::with_capacity(profile.nebula_count as usize);
        let mut nebula_textures = Vec::with_capacity(profile.nebula_count as usize);
        for _ in 0..profile.nebula_count {
            let position = Vec3::new(
                (rng.gen::<f32>() - 0.5) * profile.nebula_spread,
                (rng.gen::<f32>() - 0.5) * profile.nebula_spread,
                (rng.gen::<f32>() - 0.5) * profile.nebula_spread,
            );
            nebulae.push(graph.insert(
                SceneNode::new(Role::Ambient)
                    .at(position)
                    .scaled(profile.nebula_scale),
            ));
            nebula_textures.push(texture::nebula_sprite(profile.nebula_texture_size, rng));
        }

        let galaxy = field::spiral_galaxy(&params, rng);
        let galaxy_node = graph.insert(SceneNode::new(Role::Ambient));

        let starfield = field::starfield(profile.star_count, profile.star_spread, rng);
        let star_total = starfield.len();
        let star_draw = (star_total as f32 * profile.star_idle_fraction) as usize;
        let starfield_node = graph.insert(SceneNode::new(Role::Starfield));

        let num_groups = config.heart_images.len() as u32;
        let per_group = field::points_per_group(num_groups, profile);
        let mut clusters = Vec::with_capacity(num_groups as usize);
        for group in 0..num_groups {
            let (heart, pivot) = field::heart_cluster(&params, group, per_group, rng);
            if heart.is_empty() {
                continue;
            }
            let node = graph.insert(SceneNode::new(Role::Heart).at(pivot));
            clusters.push(HeartCluster {
                node,
                field: heart,
                pivot,
                mode: LodMode::Far,
                texture: None,
            });
        }

        let rings = rings::build_rings(&config.ring_texts, profile)
            .into_iter()
            .map(|ring| {
                let node = graph.insert(
                    SceneNode::new(Role::Ring).at(Vec3::ZERO),
                );
                RingEntity { ring, node }
            })
            .collect();

        let hint_icon = graph.insert(
            SceneNode::new(Role::Hint)
                .at(Vec3::new(1.5, 1.5, profile.hint_icon_z))
                .scaled(profile.hint_icon_scale),
        );
        let hint_ring = graph.insert(
            SceneNode::new(Role::Hint)
                .at(Vec3::new(1.5, 1.5, profile.hint_icon_z))
                .scaled(profile.hint_icon_scale),
        );
        let hint_text = graph.insert(
            SceneNode::new(Role::Hint).at(Vec3::new(0.0, profile.hint_text_y, 0.0)),
        );

        Self {
            planet_texture: texture::planet_surface(profile, rng),
            glow_texture: texture::glow_sprite([255, 255, 255, 204], 156),
            nebula_textures,
            hint_icon_texture: texture::hint_cursor(128),
            hint_ring_texture: texture::hint_ring(128),
            hint_text_texture: texture::hint_label(profile),

            graph,
            planet,
            glow,
            nebulae,
            galaxy_node,
            starfield_node,
            hint_icon,
            hint_ring,
            hint_text,
            rings,
            clusters,
            meteors: MeteorSpawner::with_rng(profile, SmallRng::seed_from_u64(rng.gen())),
            galaxy,
            starfield,
            star_total,
            star_draw,
        }
    }

    /// Bind a decoded image to its cluster. Out-of-range groups are
    /// ignored (the image list may shrink between build and decode).
    pub fn attach_texture(&mut self, group: usize, raster: Raster) {
        if let Some(cluster) = self.clusters.get_mut(group) {
            cluster.texture = Some(raster);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Tier;
    use rand::SeedableRng;

    fn build() -> Scene {
        let profile = DeviceProfile::for_tier(Tier::Constrained, true);
        let config = SceneConfig::default().with_heart_images(["a.jpg", "b.jpg", "c.jpg"]);
        let mut rng = SmallRng::seed_from_u64(5);
        Scene::build(&profile, &config, &mut rng)
    }

    #[test]
    fn test_build_registers_all_roles() {
        let scene = build();
        for role in [
            Role::Focal,
            Role::Glow,
            Role::Ring,
            Role::Hint,
            Role::Starfield,
            Role::Ambient,
            Role::Heart,
        ] {
            assert!(
                scene.graph.iter().any(|(_, n)| n.role == role),
                "missing {role:?}"
            );
        }
        assert_eq!(scene.clusters.len(), 3);
        assert_eq!(scene.rings.len(), 4);
    }

    #[test]
    fn test_idle_star_draw_is_reduced() {
        let scene = build();
        let profile = DeviceProfile::for_tier(Tier::Constrained, true);
        assert_eq!(scene.star_total, profile.star_count as usize);
        assert_eq!(
            scene.star_draw,
            (scene.star_total as f32 * profile.star_idle_fraction) as usize
        );
        assert!(scene.star_draw < scene.star_total);
    }

    #[test]
    fn test_clusters_start_far_and_untextured() {
        let scene = build();
        for cluster in &scene.clusters {
            assert_eq!(cluster.mode, LodMode::Far);
            assert!(cluster.texture.is_none());
            assert!(!cluster.field.is_empty());
        }
    }

    #[test]
    fn test_attach_texture_binds_and_ignores_stray() {
        let mut scene = build();
        scene.attach_texture(1, Raster::new(4, 4));
        assert!(scene.clusters[1].texture.is_some());
        assert!(scene.clusters[0].texture.is_none());
        // out of range is a no-op
        scene.attach_texture(99, Raster::new(4, 4));
    }

    #[test]
    fn test_any_point_within() {
        let scene = build();
        let cluster = &scene.clusters[0];
        // standing on the pivot, the nearest point is well within reach
        assert!(cluster.any_point_within(cluster.pivot, 1_000.0));
        // from very far away nothing is close
        assert!(!cluster.any_point_within(Vec3::splat(10_000.0), 10.0));
    }

    #[test]
    fn test_meteor_population_starts_at_one() {
        let scene = build();
        assert_eq!(scene.meteors.len(), 1);
    }
}
