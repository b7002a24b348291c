//! CPU-side mesh representation used by loaders.
//!
//! One vertex stream is shared by every material group; each group owns its
//! own triangle index list. Group order is the order materials were first
//! used in the OBJ file, which is also the draw order.

/// Vertex attribute streams indexed by a single vertex index space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexStream {
    pub positions: Vec<[f32; 3]>,
    /// Empty when the source had no `vn` records.
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
}

impl VertexStream {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// `true` when every present stream has one entry per position.
    pub fn is_reconciled(&self) -> bool {
        let n = self.vertex_count();
        self.texcoords.len() == n && (self.normals.is_empty() || self.normals.len() == n)
    }

    /// Positions flattened to `x, y, z` triples.
    pub fn flat_positions(&self) -> Vec<f32> {
        self.positions.iter().flatten().copied().collect()
    }

    /// Texcoords flattened to `u, v` pairs.
    pub fn flat_texcoords(&self) -> Vec<f32> {
        self.texcoords.iter().flatten().copied().collect()
    }
}

/// MTL record: a name plus its diffuse texture file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Material {
    pub name: String,
    /// `map_Kd` file name as written in the MTL, if any.
    pub diffuse_map: Option<String>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_map: None,
        }
    }
}

/// Triangle list drawn with one material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialGroup {
    pub name: String,
    pub indices: Vec<u32>,
    /// `None` when `usemtl` named a material the MTL does not define.
    pub material: Option<Material>,
}

impl MaterialGroup {
    pub fn new(name: impl Into<String>, material: Option<Material>) -> Self {
        Self {
            name: name.into(),
            indices: Vec::new(),
            material,
        }
    }

    /// Diffuse texture file for this group; `None` means the fallback texture.
    pub fn diffuse_map(&self) -> Option<&str> {
        self.material.as_ref()?.diffuse_map.as_deref()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub stream: VertexStream,
    /// Insertion-ordered; names are unique.
    pub groups: Vec<MaterialGroup>,
    /// Every face index in file order, across all groups.
    pub indices: Vec<u32>,
}

impl Mesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.stream.vertex_count()
    }

    pub fn group(&self, name: &str) -> Option<&MaterialGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    /// Sum of index counts over all groups.
    pub fn total_group_indices(&self) -> usize {
        self.groups.iter().map(|g| g.indices.len()).sum()
    }

    /// Distinct diffuse texture files in first-use order.
    pub fn texture_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for file in self.groups.iter().filter_map(MaterialGroup::diffuse_map) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    /// Returns `true` if there is geometry to draw and every index is in range.
    pub fn is_valid(&self) -> bool {
        let n = self.vertex_count() as u64;
        n > 0
            && !self.indices.is_empty()
            && self.groups.iter().all(|g| {
                g.indices.len() % 3 == 0 && g.indices.iter().all(|&i| u64::from(i) < n)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_group_mesh() -> Mesh {
        let mut a = MaterialGroup::new(
            "a",
            Some(Material {
                name: "a".into(),
                diffuse_map: Some("skin.jpg".into()),
            }),
        );
        a.indices = vec![0, 1, 2];
        let mut b = MaterialGroup::new(
            "b",
            Some(Material {
                name: "b".into(),
                diffuse_map: Some("skin.jpg".into()),
            }),
        );
        b.indices = vec![2, 1, 3];
        Mesh {
            stream: VertexStream {
                positions: vec![[0.0; 3]; 4],
                normals: Vec::new(),
                texcoords: vec![[0.0; 2]; 4],
            },
            groups: vec![a, b],
            indices: vec![0, 1, 2, 2, 1, 3],
        }
    }

    #[test]
    fn mesh_validity() {
        let mut mesh = two_group_mesh();
        assert!(mesh.is_valid());
        mesh.groups[1].indices[2] = 4;
        assert!(!mesh.is_valid());
    }

    #[test]
    fn texture_files_are_deduplicated_in_order() {
        let mesh = two_group_mesh();
        assert_eq!(mesh.texture_files(), vec!["skin.jpg"]);
        assert_eq!(mesh.group_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn unknown_material_has_no_diffuse_map() {
        let group = MaterialGroup::new("missing", None);
        assert_eq!(group.diffuse_map(), None);
    }

    #[test]
    fn stream_flattening() {
        let stream = VertexStream {
            positions: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            normals: Vec::new(),
            texcoords: vec![[0.5, 0.25], [1.0, 0.0]],
        };
        assert!(stream.is_reconciled());
        assert_eq!(stream.flat_positions().len(), 3 * stream.vertex_count());
        assert_eq!(stream.flat_texcoords(), vec![0.5, 0.25, 1.0, 0.0]);
    }
}
