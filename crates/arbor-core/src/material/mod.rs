//! Material resolution for stem and leaf faces
//!
//! The output mesh carries a single table of material names. The stem
//! material always sits at index 0; leaf materials are every entry of the
//! caller's ordered material list whose name starts with the leaf prefix.

use crate::rng::SeededRng;
use crate::{Error, Result};

/// Ordered, de-duplicated list of material names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialTable {
    names: Vec<String>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, adding it if it is not in the table yet
    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(index) = self.names.iter().position(|n| n == name) {
            return index as u32;
        }
        self.names.push(name.to_string());
        (self.names.len() - 1) as u32
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Resolved material indices for one generation call
#[derive(Debug, Clone)]
pub struct MaterialAssigner {
    table: MaterialTable,
    stem: u32,
    leaves: Vec<u32>,
}

impl MaterialAssigner {
    /// Build the material table
    ///
    /// Fails with [`Error::NoMatchingLeafMaterial`] when leaves are enabled
    /// and no entry of `available` starts with `leaf_prefix`.
    pub fn resolve(
        stem_material: &str,
        available: &[String],
        leaf_prefix: &str,
        leaves_enabled: bool,
    ) -> Result<Self> {
        let mut table = MaterialTable::new();
        let stem = table.intern(stem_material);

        let mut leaves: Vec<u32> = Vec::new();
        if leaves_enabled {
            for name in available.iter().filter(|n| n.starts_with(leaf_prefix)) {
                let index = table.intern(name);
                if !leaves.contains(&index) {
                    leaves.push(index);
                }
            }
            if leaves.is_empty() {
                return Err(Error::NoMatchingLeafMaterial {
                    prefix: leaf_prefix.to_string(),
                });
            }
        }

        Ok(Self {
            table,
            stem,
            leaves,
        })
    }

    pub fn stem(&self) -> u32 {
        self.stem
    }

    /// Indices of the candidate leaf materials, in list order
    pub fn leaf_candidates(&self) -> &[u32] {
        &self.leaves
    }

    /// Draw one leaf material uniformly from the candidates
    pub fn pick_leaf(&self, rng: &mut SeededRng) -> Option<u32> {
        if self.leaves.is_empty() {
            return None;
        }
        Some(self.leaves[rng.pick(self.leaves.len())])
    }

    pub fn into_table(self) -> MaterialTable {
        self.table
    }
}
