//! Splitting and welding of per-corner normals and texture coordinates
//!
//! Authoring tools keep one normal/UV per mesh vertex but let faces
//! override them (hard edges, UV seams). A GPU index buffer needs exactly
//! one attribute tuple per index, so corners that disagree with their
//! vertex's first use are materialized as clones while agreeing corners
//! keep sharing one index.
//!
//! Vertices live in three append-only pools, concatenated in this order
//! to form the global index space:
//!
//! | Pool | Filled by |
//! |------|-----------|
//! | [`Pool::Base`] | first corner to touch each mesh vertex |
//! | [`Pool::HardNormal`] | every later corner of a flat-shaded face |
//! | [`Pool::UvClone`] | later smooth corners whose texcoord differs from the base |

use std::collections::HashMap;

use assembly3d_core::{Error, Result};
use assembly3d_scene::{MeshData, MeshFace};

use super::IndexType;

/// Vertex pool a slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pool {
    Base,
    HardNormal,
    UvClone,
}

/// A local index into one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub pool: Pool,
    pub index: u32,
}

impl Slot {
    pub fn new(pool: Pool, index: u32) -> Self {
        Self { pool, index }
    }
}

/// One entry of the flat output arrays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
}

impl VertexRecord {
    /// Bit pattern of all eight components, for exact matching
    fn key(&self) -> [u32; 8] {
        let [px, py, pz] = self.position;
        let [nx, ny, nz] = self.normal;
        let [u, v] = self.texcoord;
        [px, py, pz, nx, ny, nz, u, v].map(f32::to_bits)
    }
}

fn same_texcoord(a: [f32; 2], b: [f32; 2]) -> bool {
    a[0].to_bits() == b[0].to_bits() && a[1].to_bits() == b[1].to_bits()
}

/// A fan-triangulated triangle referencing three pool slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle(pub [Slot; 3]);

/// Triangles sharing one material slot
#[derive(Debug, Clone)]
pub struct FaceGroup {
    /// Material name, or `"default"` when the mesh has no materials
    pub name: String,
    pub triangles: Vec<Triangle>,
}

/// Consolidated vertex pools and face groups of one mesh
#[derive(Debug, Clone)]
pub struct ConsolidatedMesh {
    base: Vec<VertexRecord>,
    hard_normal_clones: Vec<VertexRecord>,
    uv_clones: Vec<VertexRecord>,
    groups: Vec<FaceGroup>,
    has_uv: bool,
    skipped_faces: usize,
}

impl ConsolidatedMesh {
    /// Total size of the global index space
    pub fn vertex_count(&self) -> usize {
        self.base.len() + self.hard_normal_clones.len() + self.uv_clones.len()
    }

    pub fn pool(&self, pool: Pool) -> &[VertexRecord] {
        match pool {
            Pool::Base => &self.base,
            Pool::HardNormal => &self.hard_normal_clones,
            Pool::UvClone => &self.uv_clones,
        }
    }

    /// First global index of a pool
    pub fn pool_offset(&self, pool: Pool) -> usize {
        match pool {
            Pool::Base => 0,
            Pool::HardNormal => self.base.len(),
            Pool::UvClone => self.base.len() + self.hard_normal_clones.len(),
        }
    }

    /// Resolve a slot to its global vertex index
    ///
    /// # Panics
    ///
    /// If the slot lies outside its pool. Slots are only produced by
    /// [`GeometryConsolidator`], so this indicates a consolidation bug.
    pub fn global_index(&self, slot: Slot) -> u32 {
        let len = self.pool(slot.pool).len();
        assert!(
            (slot.index as usize) < len,
            "slot {:?} outside pool of {} vertices",
            slot,
            len
        );
        (self.pool_offset(slot.pool) + slot.index as usize) as u32
    }

    /// All vertex records in global index order
    pub fn vertices(&self) -> impl Iterator<Item = &VertexRecord> {
        self.base
            .iter()
            .chain(self.hard_normal_clones.iter())
            .chain(self.uv_clones.iter())
    }

    pub fn groups(&self) -> &[FaceGroup] {
        &self.groups
    }

    pub fn has_uv(&self) -> bool {
        self.has_uv
    }

    /// Faces dropped for having fewer than three corners
    pub fn skipped_faces(&self) -> usize {
        self.skipped_faces
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.triangles.len()).sum()
    }

    /// Narrowest index width for this mesh
    pub fn index_type(&self) -> IndexType {
        IndexType::for_vertex_count(self.vertex_count())
    }

    /// Global indices of one group, three per triangle
    pub fn group_indices(&self, group: &FaceGroup) -> Vec<u32> {
        let count = self.vertex_count();
        let mut indices = Vec::with_capacity(group.triangles.len() * 3);
        for triangle in &group.triangles {
            for &slot in &triangle.0 {
                let index = self.global_index(slot);
                assert!((index as usize) < count, "index {} out of range {}", index, count);
                indices.push(index);
            }
        }
        indices
    }

    /// Global indices of all groups, concatenated in group order
    pub fn indices(&self) -> Vec<u32> {
        self.groups
            .iter()
            .flat_map(|group| self.group_indices(group))
            .collect()
    }
}

/// Builds a [`ConsolidatedMesh`] from a face-indexed mesh
pub struct GeometryConsolidator<'a> {
    mesh: &'a MeshData,
    base: Vec<Option<VertexRecord>>,
    hard_normal_clones: Vec<VertexRecord>,
    uv_clones: Vec<VertexRecord>,
    // first insertion wins; clones are only appended when no match exists
    uv_lookup: HashMap<[u32; 8], u32>,
    groups: Vec<FaceGroup>,
    skipped_faces: usize,
}

impl<'a> GeometryConsolidator<'a> {
    pub fn new(mesh: &'a MeshData) -> Self {
        let groups = if mesh.has_materials() {
            mesh.materials
                .iter()
                .map(|name| FaceGroup {
                    name: name.clone(),
                    triangles: Vec::new(),
                })
                .collect()
        } else {
            vec![FaceGroup {
                name: "default".to_string(),
                triangles: Vec::new(),
            }]
        };

        Self {
            mesh,
            base: vec![None; mesh.vertices.len()],
            hard_normal_clones: Vec::new(),
            uv_clones: Vec::new(),
            uv_lookup: HashMap::new(),
            groups,
            skipped_faces: 0,
        }
    }

    /// Consolidate a mesh in one call
    pub fn consolidate(mesh: &'a MeshData) -> Result<ConsolidatedMesh> {
        let mut consolidator = Self::new(mesh);
        for (face_index, face) in mesh.faces.iter().enumerate() {
            consolidator.add_face(face_index, face)?;
        }
        Ok(consolidator.finish())
    }

    /// Split one face into slots and fan-triangulate it into its group
    pub fn add_face(&mut self, face_index: usize, face: &MeshFace) -> Result<()> {
        let corners = face.corner_count();
        if corners < 3 {
            tracing::warn!(face = face_index, corners, "Face has less than 3 vertices, skipping");
            self.skipped_faces += 1;
            return Ok(());
        }

        if face.material_index >= self.groups.len() {
            return Err(Error::invalid_data(format!(
                "face {} uses material slot {} but the mesh has {} group(s)",
                face_index,
                face.material_index,
                self.groups.len()
            )));
        }
        if self.mesh.has_uv && face.uvs.len() < corners {
            return Err(Error::invalid_data(format!(
                "face {} has {} corners but {} texcoords",
                face_index,
                corners,
                face.uvs.len()
            )));
        }

        let flat_normal = if face.smooth {
            None
        } else {
            let normal = face.flat_normal(&self.mesh.vertices).ok_or_else(|| {
                Error::invalid_data(format!("face {} references a missing vertex", face_index))
            })?;
            Some(normal)
        };

        let mut slots = Vec::with_capacity(corners);
        for (corner, &vertex_index) in face.vertices.iter().enumerate() {
            let vertex = self.mesh.vertices.get(vertex_index as usize).ok_or_else(|| {
                Error::invalid_data(format!(
                    "face {} corner {} references vertex {} of {}",
                    face_index,
                    corner,
                    vertex_index,
                    self.mesh.vertices.len()
                ))
            })?;

            let record = VertexRecord {
                position: vertex.position,
                normal: flat_normal.unwrap_or(vertex.normal),
                texcoord: if self.mesh.has_uv { face.uvs[corner] } else { [0.0, 0.0] },
            };
            slots.push(self.place_corner(vertex_index, record, face.smooth));
        }

        let group = &mut self.groups[face.material_index];
        for i in 1..corners - 1 {
            group.triangles.push(Triangle([slots[0], slots[i], slots[i + 1]]));
        }

        Ok(())
    }

    fn place_corner(&mut self, vertex_index: u32, record: VertexRecord, smooth: bool) -> Slot {
        let base = &mut self.base[vertex_index as usize];
        let Some(existing) = *base else {
            *base = Some(record);
            return Slot::new(Pool::Base, vertex_index);
        };

        if !smooth {
            // flat corners are never shared
            let index = self.hard_normal_clones.len() as u32;
            self.hard_normal_clones.push(record);
            return Slot::new(Pool::HardNormal, index);
        }

        if same_texcoord(record.texcoord, existing.texcoord) {
            return Slot::new(Pool::Base, vertex_index);
        }

        let next = self.uv_clones.len() as u32;
        let index = *self.uv_lookup.entry(record.key()).or_insert(next);
        if index == next {
            self.uv_clones.push(record);
        }
        Slot::new(Pool::UvClone, index)
    }

    pub fn finish(self) -> ConsolidatedMesh {
        let mut unreferenced = 0usize;
        let base = self
            .base
            .into_iter()
            .zip(&self.mesh.vertices)
            .map(|(record, vertex)| {
                record.unwrap_or_else(|| {
                    unreferenced += 1;
                    VertexRecord {
                        position: vertex.position,
                        normal: vertex.normal,
                        texcoord: [0.0, 0.0],
                    }
                })
            })
            .collect::<Vec<_>>();

        if unreferenced > 0 {
            tracing::debug!(unreferenced, "Vertices not referenced by any face");
        }
        tracing::debug!(
            base = base.len(),
            hard_normals = self.hard_normal_clones.len(),
            uv_clones = self.uv_clones.len(),
            groups = self.groups.len(),
            "Consolidated mesh"
        );

        ConsolidatedMesh {
            base,
            hard_normal_clones: self.hard_normal_clones,
            uv_clones: self.uv_clones,
            groups: self.groups,
            has_uv: self.mesh.has_uv,
            skipped_faces: self.skipped_faces,
        }
    }
}
