//! GLTF/GLB file export
//!
//! Every material of the mesh becomes one primitive with its own POSITION,
//! NORMAL and index accessors. Polygons are fan-triangulated. Materials are
//! written as plain PBR factors; no textures or UVs are emitted.

// String writing is infallible, so .expect() is safe here
#![allow(clippy::expect_used)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]

use crate::mesh::Mesh;
use crate::{Error, Result};
use glam::Vec3;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

/// Helper macro for writing to a String buffer.
/// String writing is infallible, so we use `expect()` with a clear message.
macro_rules! write_str {
    ($dst:expr, $($arg:tt)*) => {
        write!($dst, $($arg)*).expect("String write is infallible")
    };
}

/// Helper macro for writeln to a String buffer.
/// String writing is infallible, so we use `expect()` with a clear message.
macro_rules! writeln_str {
    ($dst:expr) => {
        writeln!($dst).expect("String write is infallible")
    };
    ($dst:expr, $($arg:tt)*) => {
        writeln!($dst, $($arg)*).expect("String write is infallible")
    };
}

/// Export options for GLTF
#[derive(Debug, Clone)]
pub struct GltfExportOptions {
    /// Duplicate vertices per triangle so every face is shaded flat
    pub flat_normals: bool,
}

impl Default for GltfExportOptions {
    fn default() -> Self {
        Self { flat_normals: true }
    }
}

/// Export a mesh to GLTF format, binary when the extension is `.glb`
pub fn export_gltf(mesh: &Mesh, path: &Path) -> Result<()> {
    export_gltf_with_options(mesh, path, &GltfExportOptions::default())
}

pub fn export_gltf_with_options(
    mesh: &Mesh,
    path: &Path,
    options: &GltfExportOptions,
) -> Result<()> {
    let is_glb = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("glb"));
    let bin_uri = path
        .with_extension("bin")
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("mesh.bin")
        .to_string();

    let data = build_gltf_data(mesh, options, (!is_glb).then_some(bin_uri.as_str()))?;

    if is_glb {
        write_glb(path, &data)
    } else {
        std::fs::write(path, &data.json)?;
        std::fs::write(path.with_extension("bin"), &data.buffer)?;
        Ok(())
    }
}

/// One material's slice of the binary buffer
struct Primitive {
    material: u32,
    vertex_count: usize,
    index_count: usize,
    positions_offset: usize,
    normals_offset: usize,
    indices_offset: usize,
    min: Vec3,
    max: Vec3,
}

struct GltfData {
    json: String,
    buffer: Vec<u8>,
}

fn build_gltf_data(
    mesh: &Mesh,
    options: &GltfExportOptions,
    bin_uri: Option<&str>,
) -> Result<GltfData> {
    if mesh.is_empty() {
        return Err(Error::Export("mesh has no faces".to_string()));
    }
    if !mesh.indices_in_bounds() {
        return Err(Error::Export("face index out of range".to_string()));
    }

    let smooth = if options.flat_normals {
        Vec::new()
    } else {
        mesh.vertex_normals()
    };
    let material_count = mesh.materials.len().max(1) as u32;
    if mesh.faces.iter().any(|f| f.material >= material_count) {
        return Err(Error::Export("face material out of range".to_string()));
    }

    let mut buffer = Vec::new();
    let mut primitives = Vec::new();

    for material in 0..material_count {
        let triangles = mesh.triangles_with_material(material);
        if triangles.is_empty() {
            continue;
        }

        let mut positions: Vec<Vec3> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut indices: Vec<u32> = Vec::with_capacity(triangles.len() * 3);

        if options.flat_normals {
            for tri in &triangles {
                let [p0, p1, p2] = tri.map(|i| mesh.vertices[i as usize]);
                // Degenerate triangles still need a unit normal
                let normal = (p1 - p0).cross(p2 - p0).try_normalize().unwrap_or(Vec3::Y);
                for p in [p0, p1, p2] {
                    indices.push(positions.len() as u32);
                    positions.push(p);
                    normals.push(normal);
                }
            }
        } else {
            let mut remap: HashMap<u32, u32> = HashMap::new();
            for &i in triangles.iter().flatten() {
                let local = *remap.entry(i).or_insert_with(|| {
                    positions.push(mesh.vertices[i as usize]);
                    normals.push(smooth[i as usize]);
                    (positions.len() - 1) as u32
                });
                indices.push(local);
            }
        }

        let (min, max) = positions
            .iter()
            .fold((Vec3::MAX, Vec3::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));

        let positions_offset = buffer.len();
        for p in &positions {
            buffer.extend_from_slice(bytemuck::cast_slice(&p.to_array()));
        }
        let normals_offset = buffer.len();
        for n in &normals {
            buffer.extend_from_slice(bytemuck::cast_slice(&n.to_array()));
        }
        let indices_offset = buffer.len();
        buffer.extend_from_slice(bytemuck::cast_slice(&indices));

        primitives.push(Primitive {
            material,
            vertex_count: positions.len(),
            index_count: indices.len(),
            positions_offset,
            normals_offset,
            indices_offset,
            min,
            max,
        });
    }

    let json = build_gltf_json(mesh, &primitives, buffer.len(), bin_uri)?;
    Ok(GltfData { json, buffer })
}

#[allow(clippy::needless_raw_string_hashes)] // Raw strings are more readable for JSON templates
fn build_gltf_json(
    mesh: &Mesh,
    primitives: &[Primitive],
    buffer_size: usize,
    bin_uri: Option<&str>,
) -> Result<String> {
    let mut json = String::new();

    writeln_str!(json, "{{");
    writeln_str!(
        json,
        r#"  "asset": {{ "version": "2.0", "generator": "Arbor" }},"#
    );
    writeln_str!(json, r#"  "scene": 0,"#);
    writeln_str!(json, r#"  "scenes": [{{ "nodes": [0] }}],"#);
    writeln_str!(json, r#"  "nodes": [{{ "mesh": 0, "name": "tree" }}],"#);

    // Meshes
    writeln_str!(json, r#"  "meshes": [{{"#);
    writeln_str!(json, r#"    "name": "tree","#);
    writeln_str!(json, r#"    "primitives": ["#);
    for (k, prim) in primitives.iter().enumerate() {
        let base = k * 3;
        write_str!(
            json,
            r#"      {{ "attributes": {{ "POSITION": {}, "NORMAL": {} }}, "indices": {}, "material": {} }}"#,
            base,
            base + 1,
            base + 2,
            prim.material
        );
        writeln_str!(json, "{}", if k + 1 < primitives.len() { "," } else { "" });
    }
    writeln_str!(json, r#"    ]"#);
    writeln_str!(json, r#"  }}],"#);

    // Materials, one per table entry so primitive material indices line up
    writeln_str!(json, r#"  "materials": ["#);
    let names: Vec<&str> = if mesh.materials.is_empty() {
        vec!["default"]
    } else {
        mesh.materials.iter().map(String::as_str).collect()
    };
    for (i, name) in names.iter().enumerate() {
        let color = super::material_color(i as u32, name);
        write_str!(
            json,
            r#"    {{ "name": {}, "pbrMetallicRoughness": {{ "baseColorFactor": [{}, {}, {}, {}], "metallicFactor": 0.0, "roughnessFactor": 0.9 }} }}"#,
            json_string(name)?,
            color[0],
            color[1],
            color[2],
            color[3]
        );
        writeln_str!(json, "{}", if i + 1 < names.len() { "," } else { "" });
    }
    writeln_str!(json, r#"  ],"#);

    // Accessors
    writeln_str!(json, r#"  "accessors": ["#);
    for (k, prim) in primitives.iter().enumerate() {
        let base = k * 3;
        writeln_str!(
            json,
            r#"    {{ "bufferView": {}, "componentType": 5126, "count": {}, "type": "VEC3", "min": [{}, {}, {}], "max": [{}, {}, {}] }},"#,
            base,
            prim.vertex_count,
            prim.min.x,
            prim.min.y,
            prim.min.z,
            prim.max.x,
            prim.max.y,
            prim.max.z
        );
        writeln_str!(
            json,
            r#"    {{ "bufferView": {}, "componentType": 5126, "count": {}, "type": "VEC3" }},"#,
            base + 1,
            prim.vertex_count
        );
        write_str!(
            json,
            r#"    {{ "bufferView": {}, "componentType": 5125, "count": {}, "type": "SCALAR" }}"#,
            base + 2,
            prim.index_count
        );
        writeln_str!(json, "{}", if k + 1 < primitives.len() { "," } else { "" });
    }
    writeln_str!(json, r#"  ],"#);

    // Buffer views
    writeln_str!(json, r#"  "bufferViews": ["#);
    for (k, prim) in primitives.iter().enumerate() {
        let vec3_size = prim.vertex_count * 12;
        writeln_str!(
            json,
            r#"    {{ "buffer": 0, "byteOffset": {}, "byteLength": {}, "target": 34962 }},"#,
            prim.positions_offset,
            vec3_size
        );
        writeln_str!(
            json,
            r#"    {{ "buffer": 0, "byteOffset": {}, "byteLength": {}, "target": 34962 }},"#,
            prim.normals_offset,
            vec3_size
        );
        write_str!(
            json,
            r#"    {{ "buffer": 0, "byteOffset": {}, "byteLength": {}, "target": 34963 }}"#,
            prim.indices_offset,
            prim.index_count * 4
        );
        writeln_str!(json, "{}", if k + 1 < primitives.len() { "," } else { "" });
    }
    writeln_str!(json, r#"  ],"#);

    // Buffer
    match bin_uri {
        Some(uri) => writeln_str!(
            json,
            r#"  "buffers": [{{ "uri": {}, "byteLength": {} }}]"#,
            json_string(uri)?,
            buffer_size
        ),
        None => writeln_str!(
            json,
            r#"  "buffers": [{{ "byteLength": {} }}]"#,
            buffer_size
        ),
    }

    writeln_str!(json, "}}");

    Ok(json)
}

/// Quoted, escaped JSON string literal
fn json_string(s: &str) -> Result<String> {
    serde_json::to_string(s).map_err(|e| Error::Export(e.to_string()))
}

fn write_glb(path: &Path, data: &GltfData) -> Result<()> {
    use std::fs::File;
    use std::io::{BufWriter, Write};

    let json_bytes = data.json.as_bytes();
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let bin_padding = (4 - (data.buffer.len() % 4)) % 4;

    let total_size = 12  // GLB header
        + 8 + json_bytes.len() + json_padding  // JSON chunk
        + 8 + data.buffer.len() + bin_padding; // BIN chunk

    let mut file = BufWriter::new(File::create(path)?);

    // GLB header
    file.write_all(b"glTF")?;
    file.write_all(&2u32.to_le_bytes())?;
    file.write_all(&(total_size as u32).to_le_bytes())?;

    // JSON chunk
    file.write_all(&((json_bytes.len() + json_padding) as u32).to_le_bytes())?;
    file.write_all(&0x4E4F_534A_u32.to_le_bytes())?; // "JSON"
    file.write_all(json_bytes)?;
    file.write_all(&vec![0x20u8; json_padding])?;

    // BIN chunk
    file.write_all(&((data.buffer.len() + bin_padding) as u32).to_le_bytes())?;
    file.write_all(&0x004E_4942_u32.to_le_bytes())?; // "BIN\0"
    file.write_all(&data.buffer)?;
    file.write_all(&vec![0u8; bin_padding])?;

    file.flush()?;
    Ok(())
}
