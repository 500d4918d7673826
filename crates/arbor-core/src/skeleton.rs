//! Branch skeleton growth
//!
//! The skeleton is an arena of [`BranchNode`]s addressed by [`NodeId`]. Nodes
//! own their children through the `children` index list and refer back to
//! their parent by index only, so the whole tree is dropped with the arena.
//!
//! Growth is depth-first from a root at the origin pointing up (+Y). Every
//! node below the depth limit continues the stem with one child; nodes past
//! the root may additionally fork one side branch, with a probability that
//! rises with depth.

use crate::Result;
use crate::config::{AngleProfile, BranchParameters};
use crate::rng::SeededRng;
use glam::{Quat, Vec3};
use std::f64::consts::{PI, TAU};
use tracing::debug;

/// Index of a node inside a [`Skeleton`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// One point of the skeleton
#[derive(Debug, Clone)]
pub struct BranchNode {
    pub position: Vec3,
    /// Unit direction of the segment that ends at this node
    pub direction: Vec3,
    pub radius: f32,
    pub depth: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Angle to the parent's direction in degrees (0 for the root)
    pub deflection: f32,
}

impl BranchNode {
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }
}

/// A grown branch tree
#[derive(Debug, Clone)]
pub struct Skeleton {
    nodes: Vec<BranchNode>,
}

impl Skeleton {
    /// Grow a skeleton from validated parameters
    ///
    /// Fails before drawing from `rng` if any parameter is out of range.
    pub fn grow(
        params: &BranchParameters,
        profile: &AngleProfile,
        rng: &mut SeededRng,
    ) -> Result<Self> {
        params.validate()?;
        profile.validate()?;

        let mut skeleton = Self {
            nodes: vec![BranchNode {
                position: Vec3::ZERO,
                direction: Vec3::Y,
                radius: params.radius_at(0),
                depth: 0,
                parent: None,
                children: Vec::new(),
                deflection: 0.0,
            }],
        };

        let draws_before = rng.draws();
        skeleton.grow_from(NodeId::ROOT, params, profile, rng);

        debug!(
            nodes = skeleton.len(),
            terminals = skeleton.terminals().count(),
            draws = rng.draws() - draws_before,
            "Grew branch skeleton"
        );

        Ok(skeleton)
    }

    fn grow_from(
        &mut self,
        id: NodeId,
        params: &BranchParameters,
        profile: &AngleProfile,
        rng: &mut SeededRng,
    ) {
        let (position, direction, depth) = {
            let node = &self.nodes[id.0];
            (node.position, node.direction, node.depth)
        };
        if depth >= params.depth {
            return;
        }

        // The trunk base never forks
        let fork = depth > 0 && rng.chance(params.branch_probability_at(depth));

        let range = profile.range_for(depth, params.depth);
        let length = params.section_length_at(depth);

        let angle = rng.uniform(f64::from(range.min), f64::from(range.max));
        let azimuth = rng.uniform(0.0, TAU);
        let mut children = vec![(angle, azimuth)];

        if fork {
            let side_angle = rng.uniform(f64::from(range.min), f64::from(range.max));
            children.push((side_angle, azimuth + PI));
        }

        for (angle, azimuth) in children {
            let child_direction = deflect(direction, angle as f32, azimuth as f32);
            let child = NodeId(self.nodes.len());
            self.nodes.push(BranchNode {
                position: position + child_direction * length,
                direction: child_direction,
                radius: params.radius_at(depth + 1),
                depth: depth + 1,
                parent: Some(id),
                children: Vec::new(),
                deflection: angle as f32,
            });
            self.nodes[id.0].children.push(child);
            self.grow_from(child, params, profile, rng);
        }
    }

    pub fn root(&self) -> &BranchNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &BranchNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[BranchNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of all nodes in growth order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Ids of nodes without children
    pub fn terminals(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|&id| self.nodes[id.0].is_terminal())
    }

    /// Parent-to-child edges in growth order
    pub fn segments(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.ids()
            .filter_map(|id| self.nodes[id.0].parent.map(|parent| (parent, id)))
    }

    /// Number of nodes with more than one child
    pub fn fork_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.len() > 1).count()
    }
}

/// Tilt `direction` by `angle_deg` towards the side selected by `azimuth`
fn deflect(direction: Vec3, angle_deg: f32, azimuth: f32) -> Vec3 {
    let reference = direction.any_orthonormal_vector();
    let axis = Quat::from_axis_angle(direction, azimuth) * reference;
    (Quat::from_axis_angle(axis, angle_deg.to_radians()) * direction).normalize()
}
