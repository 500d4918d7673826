//! Polygon meshes with per-face materials
//!
//! A [`Mesh`] is an indexed polygon soup: faces are vertex-index lists of any
//! length (stem quads, cap n-gons, icosphere triangles) and every face carries
//! an index into the mesh's material table.

mod assemble;
pub mod primitives;

use glam::Vec3;

pub use assemble::MeshAssembler;

/// A polygon referencing mesh vertices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
    /// Index into [`Mesh::materials`]
    pub material: u32,
}

impl Face {
    pub fn new(indices: Vec<u32>, material: u32) -> Self {
        Self { indices, material }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A polygon mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
    /// Material names referenced by [`Face::material`]
    pub materials: Vec<String>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of triangles after fan triangulation
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|f| f.len().saturating_sub(2)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Append a vertex and return its index
    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        self.vertices.push(position);
        (self.vertices.len() - 1) as u32
    }

    pub fn add_face(&mut self, indices: Vec<u32>, material: u32) {
        self.faces.push(Face::new(indices, material));
    }

    /// Name of the material used by `face`
    pub fn material_name(&self, face: &Face) -> Option<&str> {
        self.materials.get(face.material as usize).map(String::as_str)
    }

    /// Check that every face index points at an existing vertex
    pub fn indices_in_bounds(&self) -> bool {
        let count = self.vertices.len() as u32;
        self.faces
            .iter()
            .all(|f| f.indices.iter().all(|&i| i < count))
    }

    /// Face normal using Newell's method, robust for non-planar polygons
    pub fn face_normal(&self, face: &Face) -> Vec3 {
        let mut normal = Vec3::ZERO;
        for (i, &a) in face.indices.iter().enumerate() {
            let b = face.indices[(i + 1) % face.indices.len()];
            let p = self.vertices[a as usize];
            let q = self.vertices[b as usize];
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
        }
        normal.normalize_or_zero()
    }

    /// Smooth vertex normals from area-weighted face normals
    ///
    /// Vertices without any non-degenerate triangle get +Y.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.triangles() {
            let p0 = self.vertices[tri[0] as usize];
            let p1 = self.vertices[tri[1] as usize];
            let p2 = self.vertices[tri[2] as usize];
            let face_normal = (p1 - p0).cross(p2 - p0);
            for i in tri {
                normals[i as usize] += face_normal;
            }
        }

        normals
            .iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect()
    }

    /// Fan-triangulate every face
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let mut tris = Vec::with_capacity(self.triangle_count());
        for face in &self.faces {
            tris.extend(fan(&face.indices));
        }
        tris
    }

    /// Triangles of the faces that use `material`
    pub fn triangles_with_material(&self, material: u32) -> Vec<[u32; 3]> {
        self.faces
            .iter()
            .filter(|f| f.material == material)
            .flat_map(|f| fan(&f.indices))
            .collect()
    }

    /// Axis-aligned bounds, `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
        )
    }
}

fn fan(indices: &[u32]) -> impl Iterator<Item = [u32; 3]> + '_ {
    (1..indices.len().saturating_sub(1)).map(move |i| [indices[0], indices[i], indices[i + 1]])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0));
        mesh.add_face(vec![a, b, c, d], 0);
        mesh.materials.push("bark".to_string());
        mesh
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles(), vec![[0, 1, 2], [0, 2, 3]]);
        assert!(mesh.indices_in_bounds());
    }

    #[test]
    fn test_face_normal() {
        let mesh = quad();
        let n = mesh.face_normal(&mesh.faces[0]);
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
        for vn in mesh.vertex_normals() {
            assert_relative_eq!(vn.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_degenerate_vertex_normals_are_unit() {
        let mut mesh = Mesh::new();
        for _ in 0..3 {
            mesh.add_vertex(Vec3::ONE);
        }
        mesh.add_vertex(Vec3::ZERO);
        mesh.add_face(vec![0, 1, 2], 0);
        for n in mesh.vertex_normals() {
            assert_relative_eq!(n.length(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_bounds() {
        let mut mesh = quad();
        mesh.add_vertex(Vec3::new(-1.0, 0.5, 2.0));
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 1.0, 2.0));
        assert!(Mesh::new().bounds().is_none());
    }

    #[test]
    fn test_material_lookup() {
        let mut mesh = quad();
        assert_eq!(mesh.material_name(&mesh.faces[0]), Some("bark"));
        mesh.faces[0].material = 3;
        assert_eq!(mesh.material_name(&mesh.faces[0]), None);
        assert!(mesh.triangles_with_material(0).is_empty());
        assert_eq!(mesh.triangles_with_material(3).len(), 2);
    }
}
