//! Tapered-cylinder stem geometry
//!
//! Every skeleton node gets one ring of vertices at its radius. Each
//! parent-to-child edge is a band of quads between the two rings, so the ring
//! of a node is shared by the segment ending there and every segment leaving
//! it. Forks meet in a non-manifold junction.
//!
//! Ring frames are parallel-transported from parent to child so that vertex
//! `i` of a ring lines up with vertex `i` of the next one.

use crate::config::DEFAULT_STEM_SIDES;
use crate::mesh::Mesh;
use crate::skeleton::Skeleton;
use glam::{Quat, Vec3};
use std::f32::consts::{PI, TAU};
use tracing::debug;

pub struct StemMeshBuilder {
    sides: u32,
    cap_ends: bool,
    material: u32,
}

impl Default for StemMeshBuilder {
    fn default() -> Self {
        Self {
            sides: DEFAULT_STEM_SIDES,
            cap_ends: true,
            material: 0,
        }
    }
}

impl StemMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sides(mut self, sides: u32) -> Self {
        self.sides = sides.max(3);
        self
    }

    pub fn with_caps(mut self, cap_ends: bool) -> Self {
        self.cap_ends = cap_ends;
        self
    }

    /// Material index assigned to every stem face
    pub fn with_material(mut self, material: u32) -> Self {
        self.material = material;
        self
    }

    pub fn build(&self, skeleton: &Skeleton) -> Mesh {
        let mut mesh = Mesh::new();
        let sides = self.sides;
        mesh.vertices.reserve(skeleton.len() * sides as usize);

        // Parents always precede their children in the arena
        let mut frames: Vec<Quat> = Vec::with_capacity(skeleton.len());
        let mut ring_starts: Vec<u32> = Vec::with_capacity(skeleton.len());

        for node in skeleton.nodes() {
            let frame = match node.parent {
                None => robust_rotation_arc(Vec3::Y, node.direction),
                Some(parent) => {
                    let parent_direction = skeleton.node(parent).direction;
                    robust_rotation_arc(parent_direction, node.direction) * frames[parent.index()]
                }
            };
            frames.push(frame);
            ring_starts.push(add_ring(&mut mesh, node.position, frame, node.radius, sides));
        }

        for (parent, child) in skeleton.segments() {
            connect_rings(
                &mut mesh,
                ring_starts[parent.index()],
                ring_starts[child.index()],
                sides,
                self.material,
            );
        }

        if self.cap_ends {
            // Ring order winds towards -direction, which is outward at the root
            let root = ring_starts[0];
            mesh.add_face((root..root + sides).collect(), self.material);

            for id in skeleton.terminals().filter(|id| id.index() != 0) {
                let start = ring_starts[id.index()];
                mesh.add_face((start..start + sides).rev().collect(), self.material);
            }
        }

        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            sides,
            "Built stem mesh"
        );

        mesh
    }
}

fn robust_rotation_arc(from: Vec3, to: Vec3) -> Quat {
    const DOT_THRESHOLD: f32 = 0.9999;
    let dot = from.dot(to);
    if dot < -DOT_THRESHOLD {
        return Quat::from_axis_angle(from.any_orthonormal_vector(), PI);
    } else if dot > DOT_THRESHOLD {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from, to)
}

fn add_ring(mesh: &mut Mesh, center: Vec3, rotation: Quat, radius: f32, sides: u32) -> u32 {
    let start_index = mesh.vertices.len() as u32;
    for i in 0..sides {
        let theta = (i as f32 / sides as f32) * TAU;
        let (sin, cos) = theta.sin_cos();
        let local_pos = Vec3::new(cos * radius, 0.0, sin * radius);
        mesh.vertices.push(center + rotation * local_pos);
    }
    start_index
}

fn connect_rings(mesh: &mut Mesh, bottom_start: u32, top_start: u32, sides: u32, material: u32) {
    for i in 0..sides {
        let next = (i + 1) % sides;
        mesh.add_face(
            vec![
                bottom_start + i,
                top_start + i,
                top_start + next,
                bottom_start + next,
            ],
            material,
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{AngleProfile, BranchParameters};
    use crate::rng::SeededRng;
    use approx::assert_relative_eq;

    fn skeleton(params: &BranchParameters) -> Skeleton {
        let mut rng = SeededRng::new("stem");
        Skeleton::grow(params, &AngleProfile::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_single_segment_is_tapered_cylinder() {
        let params = BranchParameters {
            depth: 1,
            ..Default::default()
        };
        let skeleton = skeleton(&params);
        let mesh = StemMeshBuilder::new().build(&skeleton);

        assert_eq!(mesh.vertex_count(), 12);
        // 6 side quads and 2 caps
        assert_eq!(mesh.face_count(), 8);
        assert!(mesh.indices_in_bounds());

        let root = skeleton.root();
        for v in &mesh.vertices[..6] {
            assert_relative_eq!(v.distance(root.position), params.radius_at(0), epsilon = 1e-5);
        }
        let tip = &skeleton.nodes()[1];
        for v in &mesh.vertices[6..] {
            assert_relative_eq!(v.distance(tip.position), params.radius_at(1), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_rings_are_shared() {
        let params = BranchParameters::default();
        let skeleton = skeleton(&params);
        let mesh = StemMeshBuilder::new()
            .with_sides(5)
            .with_caps(false)
            .build(&skeleton);

        assert_eq!(mesh.vertex_count(), skeleton.len() * 5);
        assert_eq!(mesh.face_count(), skeleton.segments().count() * 5);
        assert!(mesh.faces.iter().all(|f| f.len() == 4));
    }

    #[test]
    fn test_caps_cover_root_and_tips() {
        let params = BranchParameters {
            depth: 6,
            ..Default::default()
        };
        let skeleton = skeleton(&params);
        let mesh = StemMeshBuilder::new().with_material(2).build(&skeleton);

        let caps = mesh.faces.iter().filter(|f| f.len() == 6).count();
        assert_eq!(caps, 1 + skeleton.terminals().count());
        assert!(mesh.faces.iter().all(|f| f.material == 2));

        // Root cap faces down, tip caps face along their branch
        let root_cap = mesh.faces.iter().find(|f| f.indices[0] == 0 && f.len() == 6).unwrap();
        assert!(mesh.face_normal(root_cap).y < -0.99);
    }

    #[test]
    fn test_side_faces_point_outward() {
        let params = BranchParameters {
            depth: 1,
            ..Default::default()
        };
        let skeleton = skeleton(&params);
        let mesh = StemMeshBuilder::new().with_caps(false).build(&skeleton);
        let axis_mid = skeleton.nodes()[1].position * 0.5;

        for face in &mesh.faces {
            let centroid = face
                .indices
                .iter()
                .map(|&i| mesh.vertices[i as usize])
                .sum::<Vec3>()
                / 4.0;
            let outward = centroid - axis_mid;
            assert!(mesh.face_normal(face).dot(outward) > 0.0);
        }
    }

    #[test]
    fn test_rotation_arc_handles_opposites() {
        let q = robust_rotation_arc(Vec3::Y, -Vec3::Y);
        assert_relative_eq!((q * Vec3::Y).y, -1.0, epsilon = 1e-5);
        assert_eq!(robust_rotation_arc(Vec3::X, Vec3::X), Quat::IDENTITY);
    }
}
