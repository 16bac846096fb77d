//! Static meshes: the subdivided surface plane and the marker icosphere.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::grid::config::MAX_PLANE_SEGMENTS;

/// Mesh vertex (must match the surface and marker shader inputs)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle mesh.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Plane of `width x height` units in the XY plane, centered at the origin,
/// facing +Z.
///
/// UV `v = 0` is the top edge so texture row 0 lands on the top row.
/// `segments` is clamped to `1..=MAX_PLANE_SEGMENTS`.
pub fn plane(width: f32, height: f32, segments: u32) -> Mesh {
    let segments = segments.clamp(1, MAX_PLANE_SEGMENTS);
    let stride = segments + 1;
    let mut vertices = Vec::with_capacity(stride as usize * stride as usize);
    let mut indices = Vec::with_capacity(segments as usize * segments as usize * 6);

    for iy in 0..=segments {
        let v = iy as f32 / segments as f32;
        let y = height * 0.5 - v * height;
        for ix in 0..=segments {
            let u = ix as f32 / segments as f32;
            let x = -width * 0.5 + u * width;
            vertices.push(Vertex {
                position: [x, y, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [u, v],
            });
        }
    }

    for iy in 0..segments {
        for ix in 0..segments {
            let a = iy * stride + ix;
            let b = a + stride;
            let c = b + 1;
            let d = a + 1;
            // Counter-clockwise seen from +Z
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Mesh { vertices, indices }
}

/// Icosahedron refined `subdivisions` times and projected onto a sphere.
///
/// Each level splits every triangle in four, giving `20 * 4^n` triangles.
pub fn icosphere(radius: f32, subdivisions: u32) -> Mesh {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        [-1.0, t, 0.0], [1.0, t, 0.0], [-1.0, -t, 0.0], [1.0, -t, 0.0],
        [0.0, -1.0, t], [0.0, 1.0, t], [0.0, -1.0, -t], [0.0, 1.0, -t],
        [t, 0.0, -1.0], [t, 0.0, 1.0], [-t, 0.0, -1.0], [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|p| Vec3::from_array(*p).normalize())
    .collect();

    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let p = ((positions[a as usize] + positions[b as usize]) * 0.5).normalize();
                positions.push(p);
                (positions.len() - 1) as u32
            })
        };

        let mut refined = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            refined.push([a, ab, ca]);
            refined.push([b, bc, ab]);
            refined.push([c, ca, bc]);
            refined.push([ab, bc, ca]);
        }
        faces = refined;
    }

    let vertices = positions
        .iter()
        .map(|n| {
            let u = 0.5 + n.z.atan2(n.x) / (2.0 * std::f32::consts::PI);
            let v = 0.5 - n.y.asin() / std::f32::consts::PI;
            Vertex {
                position: (*n * radius).to_array(),
                normal: n.to_array(),
                uv: [u, v],
            }
        })
        .collect();

    Mesh {
        vertices,
        indices: faces.into_iter().flatten().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::layout().array_stride, 32);
    }

    #[test]
    fn test_plane_counts() {
        let mesh = plane(4.0, 2.0, 100);
        assert_eq!(mesh.vertices.len(), 101 * 101);
        assert_eq!(mesh.triangle_count(), 100 * 100 * 2);
    }

    #[test]
    fn test_plane_segments_clamped() {
        let mesh = plane(1.0, 1.0, 0);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_plane_extent_and_uv_orientation() {
        let mesh = plane(4.0, 2.0, 2);
        let first = mesh.vertices[0];
        let last = *mesh.vertices.last().unwrap();
        assert_eq!(first.position, [-2.0, 1.0, 0.0]);
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(last.position, [2.0, -1.0, 0.0]);
        assert_eq!(last.uv, [1.0, 1.0]);
    }

    #[test]
    fn test_plane_winding_faces_up() {
        let mesh = plane(1.0, 1.0, 1);
        for tri in mesh.indices.chunks(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from_array(mesh.vertices[i as usize].position))
                .collect();
            let n = (p[1] - p[0]).cross(p[2] - p[0]);
            assert!(n.z > 0.0);
        }
    }

    #[test]
    fn test_icosphere_counts() {
        for n in 0..3 {
            let mesh = icosphere(0.5, n);
            assert_eq!(mesh.triangle_count(), 20 * 4usize.pow(n));
            assert_eq!(mesh.vertices.len(), 10 * 4usize.pow(n) + 2);
        }
    }

    #[test]
    fn test_icosphere_radius() {
        let mesh = icosphere(0.5, 2);
        for v in &mesh.vertices {
            let len = Vec3::from_array(v.position).length();
            assert!((len - 0.5).abs() < 1e-5);
        }
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }
}
