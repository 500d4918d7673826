//! # Arbor Core
//!
//! Seeded procedural generation of low-poly trees.
//!
//! A tree is grown as a branching skeleton from a seed string, wrapped in a
//! faceted stem mesh, and decorated with leaf objects at the branch tips. The
//! same seed and parameters always produce the same mesh.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use arbor_core::prelude::*;
//!
//! let mut config = TreeConfig::default();
//! config.seed = "hYukTFphuI".to_string();
//! config.branch.depth = 8;
//!
//! let mesh = generate(&config)?;
//! mesh.export("tree.glb")?;
//! ```
//!
//! ## Units and Conventions
//!
//! - **Distances**: Arbitrary units. The trunk starts at the origin.
//! - **Angles**: Configuration angles are in **degrees**
//! - **Coordinate system**: Right-handed, Y-up

pub mod config;
pub mod export;
pub mod generator;
pub mod leaf;
pub mod material;
pub mod mesh;
pub mod rng;
pub mod skeleton;
pub mod stem;

mod error;

pub use config::TreeConfig;
pub use error::{Error, Result};
pub use generator::{GeneratedTree, TreeGenerator, generate};

/// Prelude module for convenient imports
pub mod prelude {
    // Configuration
    pub use crate::config::{
        AngleProfile, AngleRange, BranchParameters, LeafGeometry, LeafSpec, StemOptions,
        TreeConfig,
    };

    // Generation
    pub use crate::generator::{GeneratedTree, TreeGenerator, generate};
    pub use crate::rng::SeededRng;
    pub use crate::skeleton::{BranchNode, NodeId, Skeleton};

    // Mesh
    pub use crate::mesh::{Face, Mesh};

    // Export
    pub use crate::export::{ExportFormat, MeshExport};

    // Math (re-export glam)
    pub use glam::{Quat, Vec3};

    // Error handling
    pub use crate::{Error, Result};
}
