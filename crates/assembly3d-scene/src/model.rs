// assembly3d-scene/src/model.rs
//! Scene data model: objects, meshes, armatures and animation sources

use assembly3d_core::{Error, Result, Transform};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A single object in the host scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    /// Object name, used for output file names
    pub name: String,
    /// Whether the object is part of the user's selection
    #[serde(default = "default_true")]
    pub selected: bool,
    /// Object payload
    pub data: ObjectData,
    /// Local transform used when the object has no keyframes
    #[serde(default)]
    pub transform: LocalTransform,
    /// Parent linkage (read for the armature survey only)
    #[serde(default)]
    pub parent: Option<ParentLink>,
    /// Animation attached to the object
    #[serde(default)]
    pub animation: Option<AnimationSource>,
}

impl SceneObject {
    /// The mesh payload, if this is a mesh object
    pub fn mesh(&self) -> Option<&MeshData> {
        match &self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Mesh objects with at least one vertex are exportable
    pub fn is_exportable_mesh(&self) -> bool {
        self.mesh().is_some_and(|mesh| !mesh.vertices.is_empty())
    }

    /// Whether the object carries an action or uses NLA
    pub fn has_animation(&self) -> bool {
        self.animation.as_ref().is_some_and(AnimationSource::is_active)
    }
}

/// Object payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectData {
    Mesh(MeshData),
    Armature(ArmatureData),
    Empty,
}

impl ObjectData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ObjectData::Mesh(_) => "mesh",
            ObjectData::Armature(_) => "armature",
            ObjectData::Empty => "empty",
        }
    }
}

/// Face-indexed polygon mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    /// Mesh vertices
    pub vertices: Vec<MeshVertex>,
    /// Polygonal faces
    pub faces: Vec<MeshFace>,
    /// Whether the mesh has an active UV layer
    #[serde(default)]
    pub has_uv: bool,
    /// Material slot names, in slot order
    #[serde(default)]
    pub materials: Vec<String>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn has_materials(&self) -> bool {
        !self.materials.is_empty()
    }

    /// One face group per material slot, or a single group without materials
    pub fn group_count(&self) -> usize {
        self.materials.len().max(1)
    }
}

/// A mesh vertex with its smoothed normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: [f32; 3],
    #[serde(default = "default_normal")]
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// A polygonal face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshFace {
    /// Corner-to-vertex indices, in winding order
    pub vertices: Vec<u32>,
    /// Smooth-shaded faces use the vertex normals, flat faces the face normal.
    /// Faces are smooth unless marked otherwise, in JSON and in [`MeshFace::new`].
    #[serde(default = "default_true")]
    pub smooth: bool,
    /// Material slot index
    #[serde(default)]
    pub material_index: usize,
    /// Flat face normal; computed from the corners when absent
    #[serde(default)]
    pub normal: Option<[f32; 3]>,
    /// Per-corner texture coordinates (empty when the mesh has no UVs)
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
}

impl MeshFace {
    pub fn new(vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            smooth: true,
            material_index: 0,
            normal: None,
            uvs: Vec::new(),
        }
    }

    pub fn flat(mut self) -> Self {
        self.smooth = false;
        self
    }

    pub fn with_material(mut self, material_index: usize) -> Self {
        self.material_index = material_index;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn with_normal(mut self, normal: [f32; 3]) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn corner_count(&self) -> usize {
        self.vertices.len()
    }

    /// The flat normal of this face
    ///
    /// Returns the stored normal, or computes one from the first three
    /// corners. `None` if fewer than three corners resolve to vertices.
    pub fn flat_normal(&self, vertices: &[MeshVertex]) -> Option<[f32; 3]> {
        if let Some(normal) = self.normal {
            return Some(normal);
        }

        let corner = |i: usize| {
            self.vertices
                .get(i)
                .and_then(|&v| vertices.get(v as usize))
                .map(|v| Vec3::from_array(v.position))
        };
        let (v0, v1, v2) = (corner(0)?, corner(1)?, corner(2)?);

        let normal = (v1 - v0).cross(v2 - v0);
        if normal.length_squared() > 0.0 {
            Some(normal.normalize().to_array())
        } else {
            Some([0.0, 1.0, 0.0])
        }
    }
}

/// Armature payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmatureData {
    pub bones: Vec<Bone>,
}

/// A single bone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// How an object is attached to its parent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentLink {
    /// Parent object name
    pub object: String,
    #[serde(default)]
    pub kind: ParentKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKind {
    #[default]
    Object,
    Armature,
    Bone(String),
}

/// Animation data attached to an object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationSource {
    /// Active action name
    #[serde(default)]
    pub action: Option<String>,
    /// Whether NLA tracks drive the object
    #[serde(default)]
    pub use_nla: bool,
    /// Local-space keyframes, strictly increasing by frame
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl AnimationSource {
    pub fn is_active(&self) -> bool {
        self.action.is_some() || self.use_nla
    }

    /// Reject keyframe tracks that are out of order or key a frame twice
    pub fn validate(&self) -> Result<()> {
        if let Some(pair) = self.keyframes.windows(2).find(|w| w[1].frame <= w[0].frame) {
            return Err(Error::invalid_data(format!(
                "keyframe at frame {} follows frame {}; frames must be strictly increasing",
                pair[1].frame, pair[0].frame
            )));
        }
        Ok(())
    }

    /// Local transform at `frame`, interpolating between keyframes
    ///
    /// Translation and scale are interpolated linearly, rotation with
    /// slerp. Frames outside the keyed range clamp to the nearest key.
    pub fn evaluate(&self, frame: i32) -> Option<Transform> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;

        let frame = frame as f32;
        if frame <= first.frame as f32 {
            return Some(first.transform.to_transform());
        }
        if frame >= last.frame as f32 {
            return Some(last.transform.to_transform());
        }

        let window = self
            .keyframes
            .windows(2)
            .find(|w| (w[0].frame as f32) <= frame && frame < (w[1].frame as f32))?;
        let (a, b) = (&window[0], &window[1]);
        let t = (frame - a.frame as f32) / (b.frame - a.frame) as f32;

        let ta = a.transform.to_transform();
        let tb = b.transform.to_transform();
        Some(Transform::new(
            ta.translation.lerp(tb.translation, t),
            ta.rotation.slerp(tb.rotation, t),
            ta.scale.lerp(tb.scale, t),
        ))
    }
}

/// A keyed local transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: i32,
    #[serde(flatten)]
    pub transform: LocalTransform,
}

/// Serializable local transform; rotation is stored as `[x, y, z, w]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTransform {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl LocalTransform {
    pub fn to_transform(&self) -> Transform {
        Transform::new(
            Vec3::from_array(self.translation),
            Quat::from_array(self.rotation).normalize(),
            Vec3::from_array(self.scale),
        )
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

impl From<Transform> for LocalTransform {
    fn from(t: Transform) -> Self {
        Self {
            translation: t.translation.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_normal() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}
