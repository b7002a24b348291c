//! Minimal MTL parser: `newmtl` and `map_Kd`. Other statements are ignored.

use std::io::{self, BufRead};

use crate::error::{AssetError, AssetResult};
use crate::mesh::Material;

/// Parse MTL text into materials in declaration order.
///
/// A later `newmtl` with an existing name replaces the earlier record.
pub fn parse_mtl_str(contents: &str) -> AssetResult<Vec<Material>> {
    parse_mtl(io::Cursor::new(contents))
}

pub fn parse_mtl<R: BufRead>(reader: R) -> AssetResult<Vec<Material>> {
    let mut materials: Vec<Material> = Vec::new();
    let mut current: Option<Material> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AssetError::parse(line_no, "", e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (tag, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((tag, rest)) => (tag, rest.trim()),
            None => (trimmed, ""),
        };

        match tag {
            "newmtl" => {
                if rest.is_empty() {
                    return Err(AssetError::parse(line_no, trimmed, "newmtl without a name"));
                }
                if let Some(done) = current.take() {
                    push_material(&mut materials, done);
                }
                current = Some(Material::new(rest));
            }
            "map_Kd" => {
                let Some(material) = current.as_mut() else {
                    return Err(AssetError::parse(line_no, trimmed, "map_Kd before newmtl"));
                };
                // Options such as `-s 1 1 1` precede the file name; the file is the last token.
                let file = rest
                    .split_whitespace()
                    .last()
                    .ok_or_else(|| AssetError::parse(line_no, trimmed, "map_Kd without a file"))?;
                material.diffuse_map = Some(file.to_owned());
            }
            _ => {
                // Ka/Kd/Ks/Ns/d/illum/... are not used by flat textured shading.
            }
        }
    }

    if let Some(done) = current.take() {
        push_material(&mut materials, done);
    }

    log::debug!("Parsed {} MTL materials", materials.len());
    Ok(materials)
}

fn push_material(materials: &mut Vec<Material>, material: Material) {
    match materials.iter_mut().find(|m| m.name == material.name) {
        Some(existing) => {
            log::warn!("MTL redefines material '{}'", material.name);
            *existing = material;
        }
        None => materials.push(material),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_diffuse_maps() {
        let src = r#"
            # Blender MTL File
            newmtl body
            Ns 225.0
            Kd 0.8 0.8 0.8
            map_Kd body.jpg

            newmtl face
            map_Kd -s 1 1 1 face.jpg

            newmtl plain
            Kd 1.0 0.0 0.0
        "#;
        let materials = parse_mtl_str(src).expect("parse mtl");
        assert_eq!(materials.len(), 3);
        assert_eq!(materials[0].name, "body");
        assert_eq!(materials[0].diffuse_map.as_deref(), Some("body.jpg"));
        assert_eq!(materials[1].diffuse_map.as_deref(), Some("face.jpg"));
        assert_eq!(materials[2].diffuse_map, None);
    }

    #[test]
    fn map_before_newmtl_is_a_parse_error() {
        let err = parse_mtl_str("map_Kd stray.png\n").unwrap_err();
        match err {
            AssetError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_has_no_materials() {
        assert!(parse_mtl_str("").expect("empty").is_empty());
    }

    #[test]
    fn redefinition_replaces() {
        let materials =
            parse_mtl_str("newmtl a\nmap_Kd one.png\nnewmtl a\nmap_Kd two.png\n").expect("mtl");
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].diffuse_map.as_deref(), Some("two.png"));
    }
}
