//! Leaf placement
//!
//! Leaves are decided first and materialised later: [`LeafPlacer::place`]
//! walks the skeleton and records one [`LeafInstance`] per qualifying node,
//! and the generator stamps the leaf template at each instance's transform.

use crate::config::{LeafGeometry, LeafSpec};
use crate::material::MaterialAssigner;
use crate::mesh::{Mesh, primitives};
use crate::rng::SeededRng;
use crate::skeleton::{BranchNode, NodeId, Skeleton};
use crate::{Error, Result};
use glam::{Affine3A, Quat, Vec3};
use std::f64::consts::TAU;
use tracing::{debug, warn};

/// One placed leaf
#[derive(Debug, Clone, PartialEq)]
pub struct LeafInstance {
    pub node: NodeId,
    pub position: Vec3,
    /// Uniform scale applied to the unit template
    pub size: f32,
    /// Rotation about +Y in radians
    pub rotation: f32,
    /// Index into the shared material table
    pub material: u32,
}

impl LeafInstance {
    pub fn transform(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(
            Vec3::splat(self.size),
            Quat::from_rotation_y(self.rotation),
            self.position,
        )
    }
}

/// Resolve the mesh stamped for every leaf
///
/// `custom` is the referenced object for [`LeafGeometry::Custom`].
pub fn leaf_template(spec: &LeafSpec, custom: Option<&Mesh>) -> Result<Mesh> {
    let template = match spec.geometry {
        LeafGeometry::Cube => primitives::cube(),
        LeafGeometry::Icosphere => primitives::icosphere(spec.subdivisions),
        LeafGeometry::Custom => {
            let name = spec.object.as_deref().unwrap_or("<unnamed>");
            custom.cloned().ok_or_else(|| {
                Error::invalid(format!("custom leaf object '{name}' was not provided"))
            })?
        }
    };
    if template.is_empty() || !template.indices_in_bounds() {
        return Err(Error::invalid(format!(
            "{} leaf geometry has no usable faces",
            spec.geometry.name()
        )));
    }
    Ok(template)
}

pub struct LeafPlacer<'a> {
    spec: &'a LeafSpec,
}

impl<'a> LeafPlacer<'a> {
    pub fn new(spec: &'a LeafSpec) -> Self {
        Self { spec }
    }

    /// Whether a leaf grows at `node`
    pub fn qualifies(&self, node: &BranchNode) -> bool {
        node.is_terminal() || self.spec.min_depth.is_some_and(|d| node.depth >= d)
    }

    /// Place leaves on every qualifying node in growth order
    pub fn place(
        &self,
        skeleton: &Skeleton,
        materials: &MaterialAssigner,
        rng: &mut SeededRng,
    ) -> Result<Vec<LeafInstance>> {
        if !self.spec.enabled {
            return Ok(Vec::new());
        }
        if materials.leaf_candidates().is_empty() {
            return Err(Error::NoMatchingLeafMaterial {
                prefix: self.spec.material_prefix.clone(),
            });
        }
        if self.spec.size <= 0.0 {
            warn!("Leaf size is zero, leaves will be degenerate");
        }

        let deviation = f64::from(self.spec.deviation_fraction());
        let jitter = f64::from(self.spec.jitter);
        let mut leaves = Vec::new();

        for id in skeleton.ids() {
            let node = skeleton.node(id);
            if !self.qualifies(node) {
                continue;
            }

            let scale = 1.0 + rng.uniform(-deviation, deviation);
            let size = (f64::from(self.spec.size) * scale) as f32;
            let rotation = rng.uniform(0.0, TAU) as f32;

            let mut position = node.position;
            if jitter > 0.0 {
                position += Vec3::new(
                    rng.uniform(-jitter, jitter) as f32,
                    rng.uniform(-jitter, jitter) as f32,
                    rng.uniform(-jitter, jitter) as f32,
                );
            }

            let material =
                materials
                    .pick_leaf(rng)
                    .ok_or_else(|| Error::NoMatchingLeafMaterial {
                        prefix: self.spec.material_prefix.clone(),
                    })?;

            leaves.push(LeafInstance {
                node: id,
                position,
                size,
                rotation,
                material,
            });
        }

        debug!(leaves = leaves.len(), "Placed leaves");
        Ok(leaves)
    }
}
