//! OBJ parser producing one shared vertex stream plus per-material index lists.
//!
//! Supported records: `v`, `vn`, `vt`, `usemtl`, `f`. Faces must be triangles.
//! Only the position index of each face reference is used; normals and
//! texcoords are looked up with that same index. This matches exporters that
//! write identical `v/vt/vn` indices per vertex and gives wrong shading for
//! files that do not.

use std::io::{self, BufRead};

use crate::error::{AssetError, AssetResult};
use crate::mesh::{Material, MaterialGroup, Mesh, VertexStream};
use crate::mtl::parse_mtl_str;

/// Group that receives faces appearing before any `usemtl`.
pub const DEFAULT_GROUP: &str = "default";

/// Parse OBJ text, resolving `usemtl` names against optional MTL text.
pub fn load_obj_from_str(obj: &str, mtl: Option<&str>) -> AssetResult<Mesh> {
    let materials = mtl.map(parse_mtl_str).transpose()?;
    parse_obj(io::Cursor::new(obj), materials.as_deref())
}

/// Parse OBJ from a [`BufRead`] implementation with already-parsed materials.
pub fn load_obj_from_reader<R: BufRead>(
    reader: R,
    materials: Option<&[Material]>,
) -> AssetResult<Mesh> {
    parse_obj(reader, materials)
}

fn parse_obj<R: BufRead>(reader: R, materials: Option<&[Material]>) -> AssetResult<Mesh> {
    let mut stream = VertexStream::default();
    let mut groups: Vec<MaterialGroup> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut active: Option<usize> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AssetError::parse(line_no, "", e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, trimmed, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, trimmed, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, trimmed, "z coordinate")?;
                stream.positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, trimmed, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, trimmed, "v coordinate")?;
                stream.texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, trimmed, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, trimmed, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, trimmed, "nz coordinate")?;
                stream.normals.push([nx, ny, nz]);
            }
            "usemtl" => {
                let name = trimmed[tag.len()..].trim();
                if name.is_empty() {
                    return Err(AssetError::parse(line_no, trimmed, "usemtl without a name"));
                }
                active = Some(activate_group(&mut groups, name, materials));
            }
            "f" => {
                let refs: Vec<&str> = parts.collect();
                if refs.len() != 3 {
                    return Err(AssetError::parse(
                        line_no,
                        trimmed,
                        format!("expected a triangle, found {} vertex references", refs.len()),
                    ));
                }

                let group = match active {
                    Some(idx) => idx,
                    None => {
                        let idx = activate_group(&mut groups, DEFAULT_GROUP, None);
                        active = Some(idx);
                        idx
                    }
                };

                for token in refs {
                    let index = parse_face_vertex(token, stream.positions.len(), line_no, trimmed)?;
                    indices.push(index);
                    groups[group].indices.push(index);
                }
            }
            _ => {
                // Ignore other directives (o/g/s/mtllib/etc.)
            }
        }
    }

    if indices.is_empty() {
        return Err(AssetError::Empty);
    }

    groups.retain(|g| {
        if g.indices.is_empty() {
            log::debug!("Dropping material group '{}' with no faces", g.name);
        }
        !g.indices.is_empty()
    });
    reconcile(&mut stream);

    log::debug!(
        "Parsed OBJ: {} vertices, {} triangles, {} material groups",
        stream.vertex_count(),
        indices.len() / 3,
        groups.len()
    );

    Ok(Mesh {
        stream,
        groups,
        indices,
    })
}

/// Find or create the group for `name`; returns its position.
fn activate_group(
    groups: &mut Vec<MaterialGroup>,
    name: &str,
    materials: Option<&[Material]>,
) -> usize {
    if let Some(idx) = groups.iter().position(|g| g.name == name) {
        return idx;
    }

    let material = materials.and_then(|all| all.iter().find(|m| m.name == name).cloned());
    if material.is_none() && name != DEFAULT_GROUP {
        let err = AssetError::MaterialNotFound {
            name: name.to_owned(),
        };
        if materials.is_some() {
            log::warn!("{err}; using fallback texture");
        } else {
            log::debug!("{err} (no MTL supplied); using fallback texture");
        }
    }

    groups.push(MaterialGroup::new(name, material));
    groups.len() - 1
}

/// Pad or truncate normals/texcoords so every stream matches the position count.
fn reconcile(stream: &mut VertexStream) {
    let n = stream.vertex_count();

    if stream.texcoords.len() != n {
        log::warn!(
            "OBJ has {} texcoords for {} positions; resizing",
            stream.texcoords.len(),
            n
        );
        stream.texcoords.resize(n, [0.0, 0.0]);
    }

    if stream.has_normals() && stream.normals.len() != n {
        log::warn!(
            "OBJ has {} normals for {} positions; resizing",
            stream.normals.len(),
            n
        );
        stream.normals.resize(n, [0.0, 0.0, 1.0]);
    }
}

fn parse_f32(value: Option<&str>, line_no: usize, line: &str, what: &str) -> AssetResult<f32> {
    let token = value.ok_or_else(|| AssetError::parse(line_no, line, format!("missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|e| AssetError::parse(line_no, line, format!("invalid {what} '{token}': {e}")))
}

/// Position index of a `v[/vt[/vn]]` reference, converted to 0-based.
fn parse_face_vertex(token: &str, pos_count: usize, line_no: usize, line: &str) -> AssetResult<u32> {
    let pos = token.split('/').next().unwrap_or(token);
    let idx = resolve_index(pos, pos_count, line_no, line)?;
    u32::try_from(idx).map_err(|_| {
        AssetError::parse(line_no, line, format!("too many vertices in OBJ (>{})", u32::MAX))
    })
}

fn resolve_index(token: &str, len: usize, line_no: usize, line: &str) -> AssetResult<usize> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| AssetError::parse(line_no, line, format!("invalid index '{token}'")))?;
    if raw == 0 {
        return Err(AssetError::parse(line_no, line, "OBJ indices are 1-based; found 0"));
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        return Err(AssetError::parse(
            line_no,
            line,
            format!("index {raw} resolved out of bounds (len={len})"),
        ));
    }

    Ok(idx as usize)
}
