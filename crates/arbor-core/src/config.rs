//! Generation parameters
//!
//! Every knob of a tree lives in [`TreeConfig`]. The configuration is plain
//! data: it derives serde so front ends can keep it in a JSON file, and
//! [`TreeConfig::validate`] enforces the documented ranges before any growth
//! starts. Values that are not finite are always rejected.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Hard upper limit for the branch depth
pub const MAX_BRANCH_DEPTH: u32 = 20;

/// Default number of sides of a stem ring
pub const DEFAULT_STEM_SIDES: u32 = 6;

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(Error::invalid(format!(
            "{name} must be in [{min}, {max}], got {value}"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value > max {
        return Err(Error::invalid(format!(
            "{name} must be in (0, {max}], got {value}"
        )));
    }
    Ok(())
}

/// Parameters controlling how the branch skeleton grows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchParameters {
    /// Maximum recursion level (1-20)
    pub depth: u32,
    /// Stem radius at the root
    pub initial_radius: f32,
    /// Factor by which the radius shrinks per level
    pub radius_factor: f32,
    /// Length of the first stem section
    pub section_length: f32,
    /// Factor by which the section length shrinks per level
    pub length_factor: f32,
    /// Branch probability at the root
    pub start_probability: f32,
    /// Cap of the branch probability
    pub max_probability: f32,
    /// Per-level growth rate of the branch probability
    pub probability_coeff: f32,
}

impl Default for BranchParameters {
    fn default() -> Self {
        Self {
            depth: 10,
            initial_radius: 1.0,
            radius_factor: 0.8,
            section_length: 2.0,
            length_factor: 0.9,
            start_probability: 0.2,
            max_probability: 0.9,
            probability_coeff: 0.8,
        }
    }
}

impl BranchParameters {
    pub fn validate(&self) -> Result<()> {
        if self.depth < 1 || self.depth > MAX_BRANCH_DEPTH {
            return Err(Error::invalid(format!(
                "branch depth must be in [1, {MAX_BRANCH_DEPTH}], got {}",
                self.depth
            )));
        }
        check_positive("initial radius", self.initial_radius, 10.0)?;
        check_range("radius factor", self.radius_factor, 0.05, 1.0)?;
        check_range("stem section length", self.section_length, 0.05, 10.0)?;
        check_range("stem length factor", self.length_factor, 0.05, 1.0)?;
        check_range("start branch probability", self.start_probability, 0.01, 1.0)?;
        check_range("max branch probability", self.max_probability, 0.01, 1.0)?;
        check_range("branch probability coefficient", self.probability_coeff, 0.01, 1.0)?;
        if self.start_probability > self.max_probability {
            return Err(Error::invalid(format!(
                "start branch probability ({}) exceeds max branch probability ({})",
                self.start_probability, self.max_probability
            )));
        }
        Ok(())
    }

    /// Radius of a node at `depth`
    pub fn radius_at(&self, depth: u32) -> f32 {
        self.initial_radius * self.radius_factor.powi(depth as i32)
    }

    /// Length of the sections grown out of a node at `depth`
    pub fn section_length_at(&self, depth: u32) -> f32 {
        self.section_length * self.length_factor.powi(depth as i32)
    }

    /// Effective side-branch probability at `depth`
    ///
    /// Starts at `start_probability` on the root and closes the gap to
    /// `max_probability` by `probability_coeff` of the remainder per level.
    pub fn branch_probability_at(&self, depth: u32) -> f64 {
        let start = f64::from(self.start_probability);
        let max = f64::from(self.max_probability);
        let rate = f64::from(self.probability_coeff);
        let grown = 1.0 - (1.0 - rate).powi(depth as i32);
        (start + (max - start) * grown).clamp(start, max)
    }
}

/// Deflection range in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, degrees: f32) -> bool {
        degrees >= self.min && degrees <= self.max
    }
}

/// Deflection ranges for the first, second and final third of the depth range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleProfile {
    pub ranges: [AngleRange; 3],
}

impl Default for AngleProfile {
    fn default() -> Self {
        Self::uniform(AngleRange::new(7.0, 35.0))
    }
}

impl AngleProfile {
    /// Same range for all three growth stages
    pub const fn uniform(range: AngleRange) -> Self {
        Self {
            ranges: [range, range, range],
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (i, range) in self.ranges.iter().enumerate() {
            let stage = i + 1;
            check_range(&format!("angle range {stage} minimum"), range.min, 0.0, 90.0)?;
            check_range(&format!("angle range {stage} maximum"), range.max, 0.0, 90.0)?;
            if range.min > range.max {
                return Err(Error::invalid(format!(
                    "angle range {stage} is inverted: {} > {}",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }

    /// Index of the stage that governs branches grown out of `depth`
    pub fn stage_for(depth: u32, branch_depth: u32) -> usize {
        let branch_depth = branch_depth.max(1);
        ((3 * depth / branch_depth) as usize).min(2)
    }

    pub fn range_for(&self, depth: u32, branch_depth: u32) -> AngleRange {
        self.ranges[Self::stage_for(depth, branch_depth)]
    }
}

/// Stem geometry options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StemOptions {
    /// Material name of every stem face
    pub material: String,
    /// Number of sides of each stem ring
    pub sides: u32,
    /// Close the root ring and terminal rings with a polygon
    pub cap_ends: bool,
}

impl Default for StemOptions {
    fn default() -> Self {
        Self {
            material: "bark".to_string(),
            sides: DEFAULT_STEM_SIDES,
            cap_ends: true,
        }
    }
}

impl StemOptions {
    pub fn validate(&self) -> Result<()> {
        if !(3..=32).contains(&self.sides) {
            return Err(Error::invalid(format!(
                "stem sides must be in [3, 32], got {}",
                self.sides
            )));
        }
        Ok(())
    }
}

/// Geometry used for one leaf instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafGeometry {
    Cube,
    #[default]
    Icosphere,
    /// A caller-supplied mesh, referenced by [`LeafSpec::object`]
    Custom,
}

impl LeafGeometry {
    pub const ALL: &'static [LeafGeometry] = &[Self::Cube, Self::Icosphere, Self::Custom];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Icosphere => "icosphere",
            Self::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.name().eq_ignore_ascii_case(s))
    }
}

/// Leaf placement options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafSpec {
    pub enabled: bool,
    pub geometry: LeafGeometry,
    /// Reference to the custom leaf object (used with [`LeafGeometry::Custom`])
    pub object: Option<String>,
    /// Base size of a leaf
    pub size: f32,
    /// Allowed random size deviation in percent (0-99)
    pub size_deviation: f32,
    /// Every material whose name starts with this prefix is a leaf material
    pub material_prefix: String,
    /// Non-terminal nodes at or past this depth carry leaves too
    pub min_depth: Option<u32>,
    /// Maximum random offset of a leaf from its node, per axis
    pub jitter: f32,
    /// Subdivision level of the icosphere primitive
    pub subdivisions: u32,
}

impl Default for LeafSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            geometry: LeafGeometry::Icosphere,
            object: None,
            size: 0.5,
            size_deviation: 10.0,
            material_prefix: "leaf_".to_string(),
            min_depth: None,
            jitter: 0.0,
            subdivisions: 1,
        }
    }
}

impl LeafSpec {
    pub fn validate(&self) -> Result<()> {
        check_range("leaf size", self.size, 0.0, 10.0)?;
        check_range("leaf size deviation", self.size_deviation, 0.0, 99.0)?;
        check_range("leaf jitter", self.jitter, 0.0, 10.0)?;
        if self.subdivisions > 4 {
            return Err(Error::invalid(format!(
                "icosphere subdivisions must be in [0, 4], got {}",
                self.subdivisions
            )));
        }
        Ok(())
    }

    /// Size deviation as a fraction
    pub fn deviation_fraction(&self) -> f32 {
        self.size_deviation / 100.0
    }

    /// Smallest and largest size a leaf instance can take
    pub fn size_bounds(&self) -> (f32, f32) {
        let d = self.deviation_fraction();
        (self.size * (1.0 - d), self.size * (1.0 + d))
    }
}

/// Complete description of one tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub seed: String,
    pub branch: BranchParameters,
    pub angles: AngleProfile,
    pub stem: StemOptions,
    pub leaf: LeafSpec,
    /// Ordered list of available material names
    pub materials: Vec<String>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: "hYukTFphuI".to_string(),
            branch: BranchParameters::default(),
            angles: AngleProfile::default(),
            stem: StemOptions::default(),
            leaf: LeafSpec::default(),
            materials: vec![
                "bark".to_string(),
                "leaf_dark".to_string(),
                "leaf_light".to_string(),
            ],
        }
    }
}

impl TreeConfig {
    /// Check every parameter against its range
    pub fn validate(&self) -> Result<()> {
        self.branch.validate()?;
        self.angles.validate()?;
        self.stem.validate()?;
        self.leaf.validate()
    }

    /// Load a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
