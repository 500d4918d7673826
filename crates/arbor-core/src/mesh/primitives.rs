//! Leaf template primitives
//!
//! Both primitives are centred on the origin with a radius of 1 so a uniform
//! scale by the leaf size gives the leaf its size directly.

use super::Mesh;
use glam::Vec3;
use std::collections::HashMap;

/// Cube with half-extent 1 (8 vertices, 6 quads)
pub fn cube() -> Mesh {
    let mut mesh = Mesh::new();
    for &z in &[-1.0, 1.0] {
        for &y in &[-1.0, 1.0] {
            for &x in &[-1.0, 1.0] {
                mesh.add_vertex(Vec3::new(x, y, z));
            }
        }
    }

    // Vertex index bits: x = 1, y = 2, z = 4. Faces wind counter-clockwise
    // seen from outside.
    let faces: [[u32; 4]; 6] = [
        [0, 2, 3, 1], // -Z
        [4, 5, 7, 6], // +Z
        [0, 1, 5, 4], // -Y
        [2, 6, 7, 3], // +Y
        [0, 4, 6, 2], // -X
        [1, 3, 7, 5], // +X
    ];
    for face in faces {
        mesh.add_face(face.to_vec(), 0);
    }
    mesh
}

/// Unit icosphere
///
/// Level 0 is the plain icosahedron (12 vertices, 20 triangles); every level
/// splits each triangle into four.
pub fn icosphere(subdivisions: u32) -> Mesh {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut vertices: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();

    let mut triangles: Vec<[u32; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Vec3>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let p = (vertices[a as usize] + vertices[b as usize]).normalize();
                vertices.push(p);
                (vertices.len() - 1) as u32
            })
        };

        let mut next = Vec::with_capacity(triangles.len() * 4);
        for [a, b, c] in triangles {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            next.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        triangles = next;
    }

    let mut mesh = Mesh::new();
    mesh.vertices = vertices;
    for tri in triangles {
        mesh.add_face(tri.to_vec(), 0);
    }
    mesh
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Every face normal should point away from the origin
    fn assert_outward(mesh: &Mesh) {
        for face in &mesh.faces {
            let centroid = face
                .indices
                .iter()
                .map(|&i| mesh.vertices[i as usize])
                .sum::<Vec3>()
                / face.len() as f32;
            assert!(mesh.face_normal(face).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_cube() {
        let mesh = cube();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.indices_in_bounds());
        assert_outward(&mesh);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::splat(-1.0));
        assert_eq!(max, Vec3::splat(1.0));
    }

    #[test]
    fn test_icosphere_counts() {
        for (level, verts, faces) in [(0, 12, 20), (1, 42, 80), (2, 162, 320)] {
            let mesh = icosphere(level);
            assert_eq!(mesh.vertex_count(), verts, "level {level}");
            assert_eq!(mesh.face_count(), faces, "level {level}");
            assert!(mesh.indices_in_bounds());
        }
    }

    #[test]
    fn test_icosphere_on_unit_sphere() {
        let mesh = icosphere(1);
        for v in &mesh.vertices {
            assert_relative_eq!(v.length(), 1.0, epsilon = 1e-5);
        }
        assert_outward(&mesh);
    }
}
