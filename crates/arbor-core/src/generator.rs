//! Tree generation entry point
//!
//! Generation is all-or-nothing: parameters, materials and the leaf template
//! are resolved before the random source is even seeded, so a failing call
//! never produces partial geometry.

use crate::Result;
use crate::config::TreeConfig;
use crate::leaf::{LeafInstance, LeafPlacer, leaf_template};
use crate::material::MaterialAssigner;
use crate::mesh::{Mesh, MeshAssembler};
use crate::rng::SeededRng;
use crate::skeleton::Skeleton;
use crate::stem::StemMeshBuilder;
use tracing::info;

/// Result of one generation call
#[derive(Debug, Clone)]
pub struct GeneratedTree {
    pub mesh: Mesh,
    /// Leaves in placement order
    pub leaves: Vec<LeafInstance>,
    /// Number of skeleton nodes the stem was built from
    pub node_count: usize,
    /// Number of skeleton nodes that forked a side branch
    pub fork_count: usize,
}

/// Generate a tree mesh from a configuration
///
/// Use [`TreeGenerator`] when the leaf geometry is a custom object.
pub fn generate(config: &TreeConfig) -> Result<Mesh> {
    TreeGenerator::new(config).run().map(|tree| tree.mesh)
}

pub struct TreeGenerator<'a> {
    config: &'a TreeConfig,
    leaf_object: Option<&'a Mesh>,
}

impl<'a> TreeGenerator<'a> {
    pub fn new(config: &'a TreeConfig) -> Self {
        Self {
            config,
            leaf_object: None,
        }
    }

    /// Mesh used for leaves when the leaf geometry is `Custom`
    pub fn with_leaf_object(mut self, mesh: &'a Mesh) -> Self {
        self.leaf_object = Some(mesh);
        self
    }

    pub fn run(self) -> Result<GeneratedTree> {
        let config = self.config;
        config.validate()?;

        let materials = MaterialAssigner::resolve(
            &config.stem.material,
            &config.materials,
            &config.leaf.material_prefix,
            config.leaf.enabled,
        )?;
        let template = if config.leaf.enabled {
            Some(leaf_template(&config.leaf, self.leaf_object)?)
        } else {
            None
        };

        let mut rng = SeededRng::new(&config.seed);
        let skeleton = Skeleton::grow(&config.branch, &config.angles, &mut rng)?;

        let stem = StemMeshBuilder::new()
            .with_sides(config.stem.sides)
            .with_caps(config.stem.cap_ends)
            .with_material(materials.stem())
            .build(&skeleton);

        let leaves = LeafPlacer::new(&config.leaf).place(&skeleton, &materials, &mut rng)?;

        let mut assembler = MeshAssembler::new(materials.into_table().into_names());
        if let Some(template) = &template {
            assembler.reserve(
                stem.vertex_count() + leaves.len() * template.vertex_count(),
                stem.face_count() + leaves.len() * template.face_count(),
            );
        }
        assembler.append(&stem);
        if let Some(template) = &template {
            for leaf in &leaves {
                assembler.append_instance(template, &leaf.transform(), leaf.material);
            }
        }
        let mesh = assembler.finish();

        info!(
            seed = %config.seed,
            nodes = skeleton.len(),
            leaves = leaves.len(),
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Generated tree"
        );

        Ok(GeneratedTree {
            mesh,
            leaves,
            node_count: skeleton.len(),
            fork_count: skeleton.fork_count(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::config::LeafGeometry;
    use crate::mesh::primitives;

    #[test]
    fn test_default_config_generates() {
        let tree = TreeGenerator::new(&TreeConfig::default()).run().unwrap();
        assert!(tree.mesh.vertex_count() > 0);
        assert!(tree.mesh.indices_in_bounds());
        assert_eq!(tree.mesh.materials[0], "bark");
        assert!(!tree.leaves.is_empty());
    }

    #[test]
    fn test_leaf_faces_use_leaf_materials() {
        let config = TreeConfig::default();
        let mesh = generate(&config).unwrap();
        let leaf_faces = mesh
            .faces
            .iter()
            .filter(|f| f.material != 0)
            .collect::<Vec<_>>();
        assert!(!leaf_faces.is_empty());
        for face in leaf_faces {
            assert!(mesh.material_name(face).unwrap().starts_with("leaf_"));
        }
    }

    #[test]
    fn test_custom_leaf_object() {
        let mut config = TreeConfig::default();
        config.branch.depth = 3;
        config.leaf.geometry = LeafGeometry::Custom;
        config.leaf.object = Some("cube".to_string());

        assert!(matches!(generate(&config), Err(Error::InvalidParameter(_))));

        let object = primitives::cube();
        let tree = TreeGenerator::new(&config)
            .with_leaf_object(&object)
            .run()
            .unwrap();
        let leaf_faces = tree.mesh.faces.iter().filter(|f| f.material != 0).count();
        assert_eq!(leaf_faces, tree.leaves.len() * 6);
    }

    #[test]
    fn test_leaves_disabled() {
        let mut config = TreeConfig::default();
        config.leaf.enabled = false;
        config.materials.clear();
        let tree = TreeGenerator::new(&config).run().unwrap();
        assert!(tree.leaves.is_empty());
        assert_eq!(tree.mesh.materials, vec!["bark".to_string()]);
        assert!(tree.mesh.faces.iter().all(|f| f.material == 0));
    }
}
