use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};

/// Floats per interleaved vertex: `position.xyz`, `normal.xyz`, `uv`.
pub const VERTEX_STRIDE: usize = 8;

/// Triangles sharing one material, ready for upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjMesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub material: Option<String>,
}

/// Parsed OBJ file: one mesh per `usemtl` group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjModel {
    /// File named by `mtllib`, relative to the OBJ file.
    pub material_library: Option<String>,
    pub meshes: Vec<ObjMesh>,
}

/// Surface description from an MTL file.
#[derive(Debug, Clone, PartialEq)]
pub struct MtlMaterial {
    pub diffuse_color: Vec3,
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
}

impl Default for MtlMaterial {
    fn default() -> Self {
        Self {
            diffuse_color: Vec3::ONE,
            diffuse_map: None,
            specular_map: None,
        }
    }
}

/// Parses an OBJ file from memory into interleaved vertex/index arrays.
///
/// Polygons are fan-triangulated, negative indices count from the end, and
/// texture V is flipped so that `v = 1` addresses the top row of the image.
pub fn load_obj_from_str(data: &str) -> Result<ObjModel> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();
    let mut groups: Vec<FaceGroup> = vec![FaceGroup::default()];
    let mut current = 0;
    let mut material_library = None;

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "vt" => texcoords.push(
                parse_vec2(parts).with_context(|| {
                    format!("invalid texture coordinate on line {}", line_no + 1)
                })?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate_face(&polygon, &mut groups[current].faces);
            }
            "usemtl" => {
                let name = rest_of_line(trimmed, tag);
                current = match groups
                    .iter()
                    .position(|group| group.material.as_deref() == Some(name))
                {
                    Some(index) => index,
                    None => {
                        groups.push(FaceGroup {
                            material: Some(name.to_string()),
                            faces: Vec::new(),
                        });
                        groups.len() - 1
                    }
                };
            }
            "mtllib" => {
                if material_library.is_none() {
                    material_library = Some(rest_of_line(trimmed, tag).to_string());
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut meshes = Vec::new();
    for group in groups.into_iter().filter(|group| !group.faces.is_empty()) {
        let mut mesh = build_mesh(&positions, &normals, &texcoords, &group.faces)?;
        mesh.material = group.material;
        if needs_normals(&mesh.vertices) {
            compute_normals(&mut mesh);
        }
        meshes.push(mesh);
    }

    Ok(ObjModel {
        material_library,
        meshes,
    })
}

/// Parses an MTL file, keyed by material name. Only the colour and texture
/// statements the lighting program uses are read.
pub fn parse_mtl(data: &str) -> Result<HashMap<String, MtlMaterial>> {
    let mut materials = HashMap::new();
    let mut current: Option<(String, MtlMaterial)> = None;

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        if tag == "newmtl" {
            if let Some((name, material)) = current.take() {
                materials.insert(name, material);
            }
            current = Some((rest_of_line(trimmed, tag).to_string(), MtlMaterial::default()));
            continue;
        }
        let Some((_, material)) = current.as_mut() else {
            continue;
        };
        match tag {
            "Kd" => {
                material.diffuse_color = parse_vec3(parts)
                    .with_context(|| format!("invalid Kd on line {}", line_no + 1))?;
            }
            // options such as `-s 1 1 1` may precede the file name
            "map_Kd" => material.diffuse_map = parts.last().map(str::to_string),
            "map_Ks" => material.specular_map = parts.last().map(str::to_string),
            _ => {}
        }
    }
    if let Some((name, material)) = current {
        materials.insert(name, material);
    }
    Ok(materials)
}

fn rest_of_line<'a>(line: &'a str, tag: &str) -> &'a str {
    line[tag.len()..].trim()
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let x = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    let y = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    let z = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2> {
    let u = parts
        .next()
        .ok_or_else(|| anyhow!("missing texture component"))?
        .parse::<f32>()?;
    let v = match parts.next() {
        Some(v) => v.parse::<f32>()?,
        None => 0.0,
    };
    Ok(Vec2::new(u, v))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let vt = parse_optional_index(segments.next())?;
        let vn = parse_optional_index(segments.next())?;
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn parse_optional_index(segment: Option<&str>) -> Result<i32> {
    match segment {
        None | Some("") => Ok(0),
        Some(s) => s
            .parse::<i32>()
            .map_err(|err| anyhow!("invalid index {s:?}: {err}")),
    }
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    if polygon.len() < 3 {
        return;
    }
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Default)]
struct FaceGroup {
    material: Option<String>,
    faces: Vec<[FaceIndex; 3]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

fn build_mesh(
    positions: &[Vec3],
    normals: &[Vec3],
    texcoords: &[Vec2],
    faces: &[[FaceIndex; 3]],
) -> Result<ObjMesh> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for face in faces {
        for idx in face {
            let pos_index =
                fix_index(idx.v, positions.len()).ok_or_else(|| anyhow!("invalid vertex index"))?;
            let key = Key {
                position: pos_index,
                texcoord: fix_index(idx.vt, texcoords.len()),
                normal: fix_index(idx.vn, normals.len()),
            };
            let next_index = (vertices.len() / VERTEX_STRIDE) as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                let position = positions[pos_index];
                let normal = key.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO);
                let uv = key.texcoord.map(|i| texcoords[i]).unwrap_or(Vec2::ZERO);
                vertices.extend_from_slice(&[
                    position.x,
                    position.y,
                    position.z,
                    normal.x,
                    normal.y,
                    normal.z,
                    uv.x,
                    1.0 - uv.y,
                ]);
                next_index
            });
            indices.push(*entry);
        }
    }

    Ok(ObjMesh {
        vertices,
        indices,
        material: None,
    })
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn needs_normals(vertices: &[f32]) -> bool {
    vertices
        .chunks_exact(VERTEX_STRIDE)
        .any(|chunk| chunk[3] == 0.0 && chunk[4] == 0.0 && chunk[5] == 0.0)
}

fn compute_normals(mesh: &mut ObjMesh) {
    let vertex_count = mesh.vertices.len() / VERTEX_STRIDE;
    let mut accum = vec![Vec3::ZERO; vertex_count];
    let position = |vertices: &[f32], i: usize| {
        Vec3::from_slice(&vertices[i * VERTEX_STRIDE..i * VERTEX_STRIDE + 3])
    };

    for triangle in mesh.indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;
        let p0 = position(&mesh.vertices, i0);
        let p1 = position(&mesh.vertices, i1);
        let p2 = position(&mesh.vertices, i2);
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON {
            let normal = normal.normalize();
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }
    }

    for (i, normal) in accum.into_iter().enumerate() {
        let normal = normal.normalize_or_zero();
        mesh.vertices[i * VERTEX_STRIDE + 3] = normal.x;
        mesh.vertices[i * VERTEX_STRIDE + 4] = normal.y;
        mesh.vertices[i * VERTEX_STRIDE + 5] = normal.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_triangle() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = load_obj_from_str(obj).unwrap();
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices.len(), 3 * VERTEX_STRIDE);
        assert_eq!(mesh.material, None);
    }

    #[test]
    fn computes_missing_normals() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = load_obj_from_str(obj).unwrap();
        for chunk in model.meshes[0].vertices.chunks_exact(VERTEX_STRIDE) {
            let normal = Vec3::new(chunk[3], chunk[4], chunk[5]);
            assert!((normal - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn texture_coordinates_are_flipped_vertically() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0.25\nvn 0 0 1\nf 1/1/1 2/2/1 3/1/1\n";
        let mesh = &load_obj_from_str(obj).unwrap().meshes[0];
        assert_eq!(&mesh.vertices[6..8], &[0.0, 1.0]);
        assert_eq!(&mesh.vertices[VERTEX_STRIDE + 6..VERTEX_STRIDE + 8], &[1.0, 0.75]);
        // vertex 3 reuses uv 1 but is a different position, so it is not merged
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn quads_are_fan_triangulated_with_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf -4 -3 -2 -1\n";
        let mesh = &load_obj_from_str(obj).unwrap().meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn usemtl_splits_meshes_and_mtllib_is_recorded() {
        let obj = "mtllib pieces.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n\
                   usemtl body\nf 1 2 3\nusemtl head\nf 2 4 3\nusemtl body\nf 1 3 4\n";
        let model = load_obj_from_str(obj).unwrap();
        assert_eq!(model.material_library.as_deref(), Some("pieces.mtl"));
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[0].material.as_deref(), Some("body"));
        assert_eq!(model.meshes[0].indices.len(), 6);
        assert_eq!(model.meshes[1].material.as_deref(), Some("head"));
    }

    #[test]
    fn rejects_files_without_vertices() {
        assert!(load_obj_from_str("# nothing here\n").is_err());
    }

    #[test]
    fn rejects_most_negative_face_index() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -2147483648 2 3\n";
        assert!(load_obj_from_str(obj).is_err());
        assert_eq!(fix_index(i32::MIN, 3), None);
        assert_eq!(fix_index(-3, 3), Some(0));
    }

    #[test]
    fn rejects_out_of_range_faces() {
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").is_err());
    }

    #[test]
    fn parses_materials() {
        let mtl = "newmtl body\nKd 0.5 0.25 1\nmap_Kd textures/body.png\n\
                   newmtl head\nmap_Kd -s 1 1 1 head.jpg\nmap_Ks head_spec.png\n";
        let materials = parse_mtl(mtl).unwrap();
        assert_eq!(materials.len(), 2);
        let body = &materials["body"];
        assert_eq!(body.diffuse_color, Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(body.diffuse_map.as_deref(), Some("textures/body.png"));
        assert_eq!(body.specular_map, None);
        let head = &materials["head"];
        assert_eq!(head.diffuse_color, Vec3::ONE);
        assert_eq!(head.diffuse_map.as_deref(), Some("head.jpg"));
        assert_eq!(head.specular_map.as_deref(), Some("head_spec.png"));
    }
}
