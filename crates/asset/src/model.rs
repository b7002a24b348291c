//! OBJ + MTL + texture files loaded together.

use std::path::{Path, PathBuf};

use crate::error::{AssetError, AssetResult};
use crate::mesh::{MaterialGroup, Mesh};
use crate::obj::{DEFAULT_GROUP, load_obj_from_str};
use crate::texture::TextureData;

/// Decoded texture keyed by its `map_Kd` file name.
#[derive(Clone, Debug)]
pub struct NamedTexture {
    pub name: String,
    pub data: TextureData,
}

/// Parsed mesh plus every diffuse texture it references that could be decoded.
///
/// Groups whose texture is missing here are drawn with the fallback texture.
#[derive(Debug)]
pub struct ModelAsset {
    pub mesh: Mesh,
    pub textures: Vec<NamedTexture>,
    /// Recovered problems (unknown materials, undecodable textures).
    pub issues: Vec<AssetError>,
}

impl ModelAsset {
    /// Load an OBJ file. Without `mtl_path`, an `mtllib` line in the OBJ is
    /// followed relative to the OBJ's directory.
    ///
    /// An explicit `mtl_path` must be readable. An unreadable `mtllib` file is
    /// recorded as an issue and every group falls back to the default texture.
    pub fn load(obj_path: impl AsRef<Path>, mtl_path: Option<&Path>) -> AssetResult<Self> {
        let obj_path = obj_path.as_ref();
        log::info!("Loading model {:?}", obj_path);
        let obj_text = read_text(obj_path)?;

        let mut issues = Vec::new();
        let (mtl_path, mtl_text) = match mtl_path {
            Some(p) => (Some(p.to_path_buf()), Some(read_text(p)?)),
            None => match mtllib_of(&obj_text).map(|name| sibling(obj_path, name)) {
                Some(p) => match read_text(&p) {
                    Ok(text) => (Some(p), Some(text)),
                    Err(err) => {
                        log::warn!("{err}; materials fall back to the default texture");
                        issues.push(err);
                        (None, None)
                    }
                },
                None => (None, None),
            },
        };
        let texture_dir = mtl_path
            .as_deref()
            .unwrap_or(obj_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut model = Self::from_sources(&obj_text, mtl_text.as_deref(), |file| {
            TextureData::load(texture_dir.join(file))
        })?;
        issues.append(&mut model.issues);
        model.issues = issues;
        Ok(model)
    }

    /// Build from in-memory OBJ/MTL text; `resolve` produces each referenced texture.
    pub fn from_sources<F>(obj: &str, mtl: Option<&str>, mut resolve: F) -> AssetResult<Self>
    where
        F: FnMut(&str) -> AssetResult<TextureData>,
    {
        let mesh = load_obj_from_str(obj, mtl)?;
        let mut issues = Vec::new();

        if mtl.is_some() {
            issues.extend(
                mesh.groups
                    .iter()
                    .filter(|g| g.material.is_none() && g.name != DEFAULT_GROUP)
                    .map(|g| AssetError::MaterialNotFound {
                        name: g.name.clone(),
                    }),
            );
        }

        let mut textures = Vec::new();
        for file in mesh.texture_files() {
            match resolve(file) {
                Ok(data) => textures.push(NamedTexture {
                    name: file.to_owned(),
                    data,
                }),
                Err(err) => {
                    let err = match err {
                        AssetError::Io { path, source } => AssetError::TextureDecode {
                            name: file.to_owned(),
                            message: format!("{}: {source}", path.display()),
                        },
                        other => other,
                    };
                    log::warn!("{err}; using fallback texture");
                    issues.push(err);
                }
            }
        }

        log::info!(
            "Model ready: {} vertices, {} groups, {} textures, {} issues",
            mesh.vertex_count(),
            mesh.groups.len(),
            textures.len(),
            issues.len()
        );

        Ok(Self {
            mesh,
            textures,
            issues,
        })
    }

    /// Decoded texture for a group, or `None` when the fallback should be used.
    pub fn texture_for(&self, group: &MaterialGroup) -> Option<&TextureData> {
        let file = group.diffuse_map()?;
        self.textures
            .iter()
            .find(|t| t.name == file)
            .map(|t| &t.data)
    }

    /// Textured cube with two materials, used when no model path is given.
    pub fn demo_cube() -> AssetResult<Self> {
        let mut obj = String::new();
        for [x, y, z] in CUBE_CORNERS {
            obj.push_str(&format!("v {x} {y} {z}\n"));
        }
        for [u, v] in CUBE_UVS {
            obj.push_str(&format!("vt {u} {v}\n"));
        }
        obj.push_str("usemtl sides\n");
        for [a, b, c] in &CUBE_FACES[..8] {
            obj.push_str(&format!("f {a} {b} {c}\n"));
        }
        obj.push_str("usemtl caps\n");
        for [a, b, c] in &CUBE_FACES[8..] {
            obj.push_str(&format!("f {a} {b} {c}\n"));
        }
        let mtl = "newmtl sides\nmap_Kd stripes\nnewmtl caps\n";

        Self::from_sources(&obj, Some(mtl), |_| Ok(stripes()))
    }
}

const CUBE_CORNERS: [[f32; 3]; 8] = [
    [-5.0, -5.0, -5.0],
    [5.0, -5.0, -5.0],
    [5.0, 5.0, -5.0],
    [-5.0, 5.0, -5.0],
    [-5.0, -5.0, 5.0],
    [5.0, -5.0, 5.0],
    [5.0, 5.0, 5.0],
    [-5.0, 5.0, 5.0],
];

const CUBE_UVS: [[f32; 2]; 8] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [0.0, 0.0],
    [0.0, 1.0],
    [1.0, 1.0],
];

/// CCW, 1-based. Sides first (front, back, left, right), then top and bottom.
const CUBE_FACES: [[u32; 3]; 12] = [
    [5, 6, 7],
    [5, 7, 8],
    [2, 1, 4],
    [2, 4, 3],
    [1, 5, 8],
    [1, 8, 4],
    [6, 2, 3],
    [6, 3, 7],
    [4, 8, 7],
    [4, 7, 3],
    [1, 2, 6],
    [1, 6, 5],
];

fn stripes() -> TextureData {
    let size = 32u32;
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for _x in 0..size {
            if (y / 4) % 2 == 0 {
                data.extend_from_slice(&[40, 120, 220, 255]);
            } else {
                data.extend_from_slice(&[250, 200, 60, 255]);
            }
        }
    }
    TextureData {
        data,
        width: size,
        height: size,
        format: crate::texture::TextureFormat::Rgba8,
    }
}

fn read_text(path: &Path) -> AssetResult<String> {
    std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn mtllib_of(obj: &str) -> Option<&str> {
    obj.lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("mtllib "))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    path.parent()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJ: &str = "mtllib fox.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n\
                       usemtl body\nf 1 2 3\nusemtl face\nf 2 4 3\nusemtl ghost\nf 1 3 4\n";
    const MTL: &str = "newmtl body\nmap_Kd body.jpg\nnewmtl face\nmap_Kd face.jpg\n";

    #[test]
    fn decode_failure_falls_back() {
        let model = ModelAsset::from_sources(OBJ, Some(MTL), |file| {
            if file == "body.jpg" {
                Ok(TextureData::fallback())
            } else {
                TextureData::decode(file, b"broken")
            }
        })
        .expect("load succeeds despite bad texture");

        assert_eq!(model.textures.len(), 1);
        assert!(model.texture_for(model.mesh.group("body").unwrap()).is_some());
        assert!(model.texture_for(model.mesh.group("face").unwrap()).is_none());
        assert!(model.texture_for(model.mesh.group("ghost").unwrap()).is_none());
        assert!(model.issues.iter().all(AssetError::is_recoverable));
        assert!(model.issues.iter().any(|e| matches!(e, AssetError::MaterialNotFound { name } if name == "ghost")));
        assert!(model.issues.iter().any(|e| matches!(e, AssetError::TextureDecode { name, .. } if name == "face.jpg")));
    }

    #[test]
    fn parse_errors_are_fatal() {
        let res = ModelAsset::from_sources("v 0 0 nope\n", None, |_| Ok(TextureData::fallback()));
        assert!(matches!(res, Err(AssetError::Parse { line: 1, .. })));
    }

    #[test]
    fn finds_mtllib() {
        assert_eq!(mtllib_of(OBJ), Some("fox.mtl"));
        assert_eq!(mtllib_of("v 0 0 0\n"), None);
    }

    #[test]
    fn demo_cube_is_valid() {
        let demo = ModelAsset::demo_cube().expect("demo cube");
        assert!(demo.mesh.is_valid());
        assert_eq!(demo.mesh.group_names().collect::<Vec<_>>(), vec!["sides", "caps"]);
        assert_eq!(demo.mesh.total_group_indices(), 36);
        assert!(demo.texture_for(demo.mesh.group("caps").unwrap()).is_none());
        assert!(demo.issues.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ModelAsset::load("/definitely/not/here.obj", None).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("asset-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn missing_mtllib_still_loads() {
        let dir = scratch_dir("mtllib");
        let obj = dir.join("fox.obj");
        std::fs::write(&obj, "mtllib gone.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl body\nf 1 2 3\n")
            .expect("write obj");

        let model = ModelAsset::load(&obj, None).expect("mtllib failure is recovered");
        let body = model.mesh.group("body").expect("body group");
        assert!(body.material.is_none());
        assert!(model.texture_for(body).is_none());
        assert!(matches!(&model.issues[..], [AssetError::Io { path, .. }] if path.ends_with("gone.mtl")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_explicit_mtl_is_fatal() {
        let dir = scratch_dir("explicit-mtl");
        let obj = dir.join("fox.obj");
        std::fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").expect("write obj");

        let err = ModelAsset::load(&obj, Some(&dir.join("gone.mtl"))).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
