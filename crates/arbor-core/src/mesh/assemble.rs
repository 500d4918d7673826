//! Merging of mesh parts into one output mesh

use super::{Face, Mesh};
use glam::Affine3A;

/// Concatenates mesh parts that share one material table
///
/// Face indices of each appended part are shifted by the number of vertices
/// already in the buffer.
#[derive(Debug, Default)]
pub struct MeshAssembler {
    mesh: Mesh,
}

impl MeshAssembler {
    pub fn new(materials: Vec<String>) -> Self {
        Self {
            mesh: Mesh {
                materials,
                ..Mesh::default()
            },
        }
    }

    /// Reserve space for `vertices` more vertices and `faces` more faces
    pub fn reserve(&mut self, vertices: usize, faces: usize) {
        self.mesh.vertices.reserve(vertices);
        self.mesh.faces.reserve(faces);
    }

    /// Append a part whose face materials already index the shared table
    pub fn append(&mut self, part: &Mesh) {
        let base = self.mesh.vertices.len() as u32;
        self.mesh.vertices.extend_from_slice(&part.vertices);
        self.mesh.faces.extend(part.faces.iter().map(|face| Face {
            indices: face.indices.iter().map(|&i| i + base).collect(),
            material: face.material,
        }));
    }

    /// Append a transformed copy of `template` with every face set to `material`
    pub fn append_instance(&mut self, template: &Mesh, transform: &Affine3A, material: u32) {
        let base = self.mesh.vertices.len() as u32;
        self.mesh.vertices.extend(
            template
                .vertices
                .iter()
                .map(|&p| transform.transform_point3(p)),
        );
        self.mesh.faces.extend(template.faces.iter().map(|face| Face {
            indices: face.indices.iter().map(|&i| i + base).collect(),
            material,
        }));
    }

    pub fn finish(self) -> Mesh {
        self.mesh
    }
}
