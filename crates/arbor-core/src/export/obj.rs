//! OBJ file export and import
//!
//! Faces are written as polygons, grouped by material with `usemtl`. A
//! material library with one diffuse colour per material is written next to
//! the OBJ and referenced with `mtllib`. The reader understands the subset
//! needed for custom leaf objects: `v` lines and `f` lines (with optional
//! `/vt/vn` parts and negative indices). Everything else is ignored.

#![allow(clippy::uninlined_format_args)]

use crate::mesh::Mesh;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Export a mesh to OBJ format with a sibling `.mtl` material library
pub fn export_obj(mesh: &Mesh, path: &Path) -> Result<()> {
    let mtl_path = path.with_extension("mtl");
    let mtllib = if mesh.materials.is_empty() {
        None
    } else {
        let mut mtl = BufWriter::new(File::create(&mtl_path)?);
        write_mtl(mesh, &mut mtl)?;
        mtl.flush()?;
        mtl_path.file_name().and_then(|name| name.to_str())
    };

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, mtllib, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as OBJ text, referencing the material library `mtllib`
pub fn write_obj<W: Write>(mesh: &Mesh, mtllib: Option<&str>, writer: &mut W) -> Result<()> {
    // Header
    writeln!(writer, "# Arbor OBJ Export")?;
    writeln!(writer, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(writer, "# Faces: {}", mesh.face_count())?;
    writeln!(writer)?;
    if let Some(lib) = mtllib {
        writeln!(writer, "mtllib {}", lib)?;
    }
    writeln!(writer, "o tree")?;

    for v in &mesh.vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    writeln!(writer)?;

    // Faces grouped per material (OBJ uses 1-based indexing)
    let groups = mesh.faces.iter().map(|f| f.material + 1).max().unwrap_or(0);
    for material in 0..groups {
        let mut faces = mesh.faces.iter().filter(|f| f.material == material).peekable();
        if faces.peek().is_none() {
            continue;
        }
        if let Some(name) = mesh.materials.get(material as usize) {
            writeln!(writer, "usemtl {}", name)?;
        }
        for face in faces {
            write!(writer, "f")?;
            for i in &face.indices {
                write!(writer, " {}", i + 1)?;
            }
            writeln!(writer)?;
        }
    }

    Ok(())
}

/// Write one `newmtl` entry per material of `mesh`
pub fn write_mtl<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Arbor MTL Export")?;
    for (index, name) in mesh.materials.iter().enumerate() {
        let [r, g, b, _] = super::material_color(index as u32, name);
        writeln!(writer)?;
        writeln!(writer, "newmtl {}", name)?;
        writeln!(writer, "Kd {} {} {}", r, g, b)?;
        writeln!(writer, "Ka 0 0 0")?;
        writeln!(writer, "Ks 0 0 0")?;
        writeln!(writer, "illum 1")?;
    }
    Ok(())
}

/// Import a mesh from an OBJ file
pub fn import_obj(path: &Path) -> Result<Mesh> {
    let file = File::open(path)?;
    read_obj(BufReader::new(file))
}

/// Parse OBJ text into a mesh with every face on material 0
pub fn read_obj<R: BufRead>(reader: R) -> Result<Mesh> {
    let mut mesh = Mesh::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords = parts
                    .take(3)
                    .map(|s| s.parse::<f32>())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| Error::Import(format!("line {}: {}", line_no + 1, e)))?;
                if coords.len() != 3 {
                    return Err(Error::Import(format!(
                        "line {}: vertex needs 3 coordinates",
                        line_no + 1
                    )));
                }
                mesh.add_vertex(glam::Vec3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let count = mesh.vertex_count() as i64;
                let mut indices = Vec::new();
                for token in parts {
                    let raw = token.split('/').next().unwrap_or_default();
                    let index: i64 = raw
                        .parse()
                        .map_err(|e| Error::Import(format!("line {}: {}", line_no + 1, e)))?;
                    // Negative indices count back from the last vertex
                    let resolved = if index < 0 { count + index } else { index - 1 };
                    if resolved < 0 || resolved >= count {
                        return Err(Error::Import(format!(
                            "line {}: face index {} out of range",
                            line_no + 1,
                            index
                        )));
                    }
                    indices.push(resolved as u32);
                }
                if indices.len() < 3 {
                    return Err(Error::Import(format!(
                        "line {}: face needs at least 3 vertices",
                        line_no + 1
                    )));
                }
                mesh.add_face(indices, 0);
            }
            _ => {}
        }
    }

    if mesh.is_empty() {
        return Err(Error::Import("OBJ contains no faces".to_string()));
    }
    Ok(mesh)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_write_groups_by_material() {
        let mut mesh = primitives::cube();
        mesh.materials = vec!["bark".to_string(), "leaf_a".to_string()];
        mesh.faces[2].material = 1;
        mesh.faces[4].material = 1;

        let mut out = Vec::new();
        write_obj(&mesh, None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 8);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 6);
        let bark = text.find("usemtl bark").unwrap();
        let leaf = text.find("usemtl leaf_a").unwrap();
        assert!(bark < leaf);
        assert_eq!(text[leaf..].lines().filter(|l| l.starts_with("f ")).count(), 2);
    }

    #[test]
    fn test_read_polygons_and_slashes() {
        let text = "\
# leaf
o leaf
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
f -4 -3 -2
";
        let mesh = read_obj(text.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces[0].indices, vec![0, 1, 2, 3]);
        assert_eq!(mesh.faces[1].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_read_rejects_bad_input() {
        assert!(read_obj("v 0 0 0\nf 1 2 3\n".as_bytes()).is_err());
        assert!(read_obj("v 0 0\n".as_bytes()).is_err());
        assert!(read_obj("# empty\n".as_bytes()).is_err());
    }

    #[test]
    fn test_file_round_trip_keeps_topology() {
        let path = std::env::temp_dir().join("arbor_test_ico.obj");
        let mesh = primitives::icosphere(1);
        export_obj(&mesh, &path).unwrap();
        let loaded = import_obj(&path).unwrap();
        assert_eq!(loaded.faces, mesh.faces);
        assert_eq!(loaded.vertex_count(), mesh.vertex_count());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_writes_material_library() {
        let dir = std::env::temp_dir();
        let path = dir.join("arbor_test_mtl.obj");
        let mut mesh = primitives::cube();
        mesh.materials = vec!["bark".to_string(), "leaf_a".to_string()];
        mesh.faces[5].material = 1;
        export_obj(&mesh, &path).unwrap();

        let obj = std::fs::read_to_string(&path).unwrap();
        assert!(obj.lines().any(|l| l == "mtllib arbor_test_mtl.mtl"));

        let mtl_path = dir.join("arbor_test_mtl.mtl");
        let mtl = std::fs::read_to_string(&mtl_path).unwrap();
        assert!(mtl.contains("newmtl bark"));
        assert!(mtl.contains("newmtl leaf_a"));
        assert_eq!(mtl.lines().filter(|l| l.starts_with("Kd ")).count(), 2);

        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&mtl_path).ok();
    }
}
