//! CPU-side mesh builders for the textured pipeline.
//!
//! Three shapes cover every textured entity: a unit quad (sprites and
//! the hint label), a unit UV sphere (the planet), and an open cylinder
//! band (the text rings, with the texture's u axis repeated around the
//! circumference).

use bytemuck::{Pod, Zeroable};
use std::f32::consts::TAU;

/// Vertex layout shared by all textured meshes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Unit quad in the xy plane, centered on the origin, facing +z.
pub fn quad() -> Mesh {
    let vertices = vec![
        MeshVertex {
            position: [-0.5, -0.5, 0.0],
            uv: [0.0, 1.0],
        },
        MeshVertex {
            position: [0.5, -0.5, 0.0],
            uv: [1.0, 1.0],
        },
        MeshVertex {
            position: [0.5, 0.5, 0.0],
            uv: [1.0, 0.0],
        },
        MeshVertex {
            position: [-0.5, 0.5, 0.0],
            uv: [0.0, 0.0],
        },
    ];
    Mesh {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Unit UV sphere with the given segment counts.
pub fn sphere(segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for r in 0..=rings {
        let v = r as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        for s in 0..=segments {
            let u = s as f32 / segments as f32;
            let theta = u * TAU;
            vertices.push(MeshVertex {
                position: [
                    phi.sin() * theta.cos(),
                    phi.cos(),
                    phi.sin() * theta.sin(),
                ],
                uv: [u, v],
            });
        }
    }

    let stride = segments + 1;
    for r in 0..rings {
        for s in 0..segments {
            let a = r * stride + s;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    Mesh { vertices, indices }
}

/// Open cylinder band of the given radius and height, axis along y.
/// The texture u coordinate spans `u_repeat` copies around the band, so
/// a ring's band texture wraps by its repeat factor.
pub fn cylinder_band(radius: f32, height: f32, segments: u32, u_repeat: f32) -> Mesh {
    let segments = segments.max(3);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for s in 0..=segments {
        let t = s as f32 / segments as f32;
        let theta = t * TAU;
        let (x, z) = (theta.cos() * radius, theta.sin() * radius);
        let u = t * u_repeat;
        vertices.push(MeshVertex {
            position: [x, height / 2.0, z],
            uv: [u, 0.0],
        });
        vertices.push(MeshVertex {
            position: [x, -height / 2.0, z],
            uv: [u, 1.0],
        });
    }

    for s in 0..segments {
        let a = s * 2;
        indices.extend_from_slice(&[a, a + 1, a + 2, a + 2, a + 1, a + 3]);
    }

    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_is_two_triangles() {
        let m = quad();
        assert_eq!(m.vertices.len(), 4);
        assert_eq!(m.index_count(), 6);
    }

    #[test]
    fn test_sphere_vertices_on_unit_shell() {
        let m = sphere(16, 12);
        for v in &m.vertices {
            let len = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2))
                .sqrt();
            assert!((len - 1.0).abs() < 1e-4);
        }
        assert!(m.indices.iter().all(|&i| (i as usize) < m.vertices.len()));
    }

    #[test]
    fn test_cylinder_band_radius_and_repeat() {
        let m = cylinder_band(11.0, 1.0, 64, 2.5);
        for v in &m.vertices {
            let planar = (v.position[0].powi(2) + v.position[2].powi(2)).sqrt();
            assert!((planar - 11.0).abs() < 1e-3);
            assert!(v.position[1].abs() <= 0.5 + 1e-6);
        }
        let max_u = m.vertices.iter().map(|v| v.uv[0]).fold(0.0f32, f32::max);
        assert!((max_u - 2.5).abs() < 1e-4);
    }
}
