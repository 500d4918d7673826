//! Export functionality for generated meshes

mod gltf_export;
mod obj;
mod stl;

use crate::mesh::Mesh;
use crate::{Error, Result};
use std::path::Path;

pub use gltf_export::{GltfExportOptions, export_gltf, export_gltf_with_options};
pub use obj::{export_obj, import_obj, read_obj, write_mtl, write_obj};
pub use stl::export_stl;

/// Display colour of a material slot, shared by the OBJ and glTF writers
///
/// The stem slot is bark brown. Leaf materials get a green shade derived
/// from the name.
pub(crate) fn material_color(index: u32, name: &str) -> [f32; 4] {
    if index == 0 {
        return [0.36, 0.25, 0.16, 1.0];
    }
    let shade = crate::rng::hash_seed(name) % 1000;
    let t = shade as f32 / 999.0;
    [0.12 + 0.18 * t, 0.35 + 0.3 * t, 0.1 + 0.08 * t, 1.0]
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Obj,
    Gltf,
    Glb,
    Stl,
}

impl ExportFormat {
    pub const ALL: [Self; 4] = [Self::Obj, Self::Gltf, Self::Glb, Self::Stl];

    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Gltf => "gltf",
            Self::Glb => "glb",
            Self::Stl => "stl",
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::Obj => "OBJ",
            Self::Gltf => "GLTF (JSON)",
            Self::Glb => "GLB (Binary)",
            Self::Stl => "STL (Binary)",
        }
    }
}

/// Extension trait for exporting meshes
pub trait MeshExport {
    /// Export mesh to file, auto-detecting format from extension
    fn export<P: AsRef<Path>>(&self, path: P) -> Result<ExportFormat>;

    fn export_obj<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Export mesh to GLTF, or GLB when the extension is `.glb`
    fn export_gltf<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    fn export_stl<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl MeshExport for Mesh {
    fn export<P: AsRef<Path>>(&self, path: P) -> Result<ExportFormat> {
        let path = path.as_ref();
        let format = ExportFormat::from_extension(path).ok_or_else(|| {
            Error::Export(format!("Unknown file extension: {}", path.display()))
        })?;
        match format {
            ExportFormat::Obj => self.export_obj(path)?,
            ExportFormat::Gltf | ExportFormat::Glb => self.export_gltf(path)?,
            ExportFormat::Stl => self.export_stl(path)?,
        }
        Ok(format)
    }

    fn export_obj<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        export_obj(self, path.as_ref())
    }

    fn export_gltf<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        export_gltf(self, path.as_ref())
    }

    fn export_stl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        export_stl(self, path.as_ref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ExportFormat::from_extension(Path::new("tree.OBJ")),
            Some(ExportFormat::Obj)
        );
        assert_eq!(
            ExportFormat::from_extension(Path::new("a/b.glb")),
            Some(ExportFormat::Glb)
        );
        assert_eq!(
            ExportFormat::from_extension(Path::new("t.stl")),
            Some(ExportFormat::Stl)
        );
        assert_eq!(ExportFormat::from_extension(Path::new("tree.fbx")), None);
        assert_eq!(ExportFormat::from_extension(Path::new("tree")), None);
    }

    #[test]
    fn test_export_dispatch() {
        let mesh = primitives::cube();
        let path = std::env::temp_dir().join("arbor_test_dispatch.stl");
        assert_eq!(mesh.export(&path).unwrap(), ExportFormat::Stl);
        assert!(path.exists());
        std::fs::remove_file(&path).ok();

        let bad = std::env::temp_dir().join("arbor_test_dispatch.xyz");
        assert!(matches!(mesh.export(&bad), Err(Error::Export(_))));
        assert!(!bad.exists());
    }
}
