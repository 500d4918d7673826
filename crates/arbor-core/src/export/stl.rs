//! STL file export (Binary format)
//!
//! Polygons are fan-triangulated. STL has no notion of materials, so the
//! material table is dropped.

use crate::Result;
use crate::mesh::Mesh;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Export a mesh to binary STL format
///
/// Binary STL format:
/// - 80 bytes: Header (arbitrary text)
/// - 4 bytes: Number of triangles (u32 little-endian)
/// - For each triangle (50 bytes):
///   - 12 bytes: Normal vector (3 x f32 little-endian)
///   - 36 bytes: 3 vertices (9 x f32 little-endian)
///   - 2 bytes: Attribute byte count (0)
pub fn export_stl(mesh: &Mesh, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let triangles = mesh.triangles();

    let header = format!(
        "Arbor STL Export - {} vertices, {} triangles",
        mesh.vertex_count(),
        triangles.len()
    );
    let mut header_bytes = [b' '; 80];
    let header_len = header.len().min(80);
    header_bytes[..header_len].copy_from_slice(&header.as_bytes()[..header_len]);
    writer.write_all(&header_bytes)?;

    writer.write_all(&(triangles.len() as u32).to_le_bytes())?;

    for tri in &triangles {
        let [p0, p1, p2] = tri.map(|i| mesh.vertices[i as usize]);

        // Degenerate triangles fall back to +Z
        let normal = (p1 - p0).cross(p2 - p0).try_normalize().unwrap_or(glam::Vec3::Z);

        for v in [normal, p0, p1, p2] {
            for component in v.to_array() {
                writer.write_all(&component.to_le_bytes())?;
            }
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }

    writer.flush()?;
    Ok(())
}
