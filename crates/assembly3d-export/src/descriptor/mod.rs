//! XML descriptors for the binary blobs and the scene layout
//!
//! Each `.dat` blob is paired with a descriptor that declares element
//! counts, attribute sizes and the index width. Nothing else in the blob
//! tells a reader how to slice it, so these types are built from the same
//! data the blob is written from.

mod reader;
mod writer;

pub use reader::{read_animation, read_mesh, read_scene, DescriptorKind};
pub use writer::{
    animation_to_string, mesh_to_string, scene_to_string, write_animation, write_animation_file,
    write_mesh, write_mesh_file, write_scene, write_scene_file,
};

use serde::Serialize;

use assembly3d_core::{Error, Result, Transform};

use crate::animation::SampledAnimation;
use crate::mesh::{ConsolidatedMesh, IndexType};

pub const SCENE_NAMESPACE: &str = "http://assembly.interaction3d.org/scene";
pub const MESH_NAMESPACE: &str = "http://assembly.interaction3d.org/mesh";
pub const ANIMATION_NAMESPACE: &str = "http://assembly.interaction3d.org/anim";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Element type of every vertex and animation attribute
pub const FLOAT_TYPE: &str = "FLOAT";

/// `xsi:schemaLocation` value for a namespace
pub fn schema_location(namespace: &str) -> String {
    format!("{namespace} {namespace}.xsd")
}

/// One named float attribute array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDesc {
    pub name: String,
    /// Components per element
    pub size: usize,
}

impl AttributeDesc {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// A face group; `count` is the number of triangles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDesc {
    pub name: String,
    pub count: usize,
}

/// Shape of a `.mesh.dat` blob
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshDescriptor {
    pub vertex_count: usize,
    pub attributes: Vec<AttributeDesc>,
    pub index_type: IndexType,
    pub groups: Vec<GroupDesc>,
}

impl MeshDescriptor {
    pub fn from_mesh(mesh: &ConsolidatedMesh) -> Self {
        let mut attributes = vec![AttributeDesc::new("POSITION", 3), AttributeDesc::new("NORMAL", 3)];
        if mesh.has_uv() {
            attributes.push(AttributeDesc::new("TEXCOORD", 2));
        }

        Self {
            vertex_count: mesh.vertex_count(),
            attributes,
            index_type: mesh.index_type(),
            groups: mesh
                .groups()
                .iter()
                .map(|group| GroupDesc {
                    name: group.name.clone(),
                    count: group.triangles.len(),
                })
                .collect(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDesc> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_texcoords(&self) -> bool {
        self.attribute("TEXCOORD").is_some()
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.count).fold(0, usize::saturating_add)
    }

    /// Blob size in bytes implied by this descriptor
    ///
    /// Counts come straight from the XML, so a size that does not fit in
    /// `usize` is `InvalidData` rather than an overflow.
    pub fn expected_blob_len(&self) -> Result<usize> {
        let floats = checked_sum(self.attributes.iter().map(|a| a.size))?;
        let vertex_bytes = checked_product(&[self.vertex_count, floats, 4])?;

        let triangles = checked_sum(self.groups.iter().map(|g| g.count))?;
        let index_bytes = checked_product(&[triangles, 3, self.index_type.bytes()])?;

        vertex_bytes.checked_add(index_bytes).ok_or_else(blob_too_large)
    }
}

fn blob_too_large() -> Error {
    Error::invalid_data("descriptor declares a blob larger than addressable memory")
}

fn checked_sum(values: impl IntoIterator<Item = usize>) -> Result<usize> {
    values
        .into_iter()
        .try_fold(0usize, usize::checked_add)
        .ok_or_else(blob_too_large)
}

fn checked_product(factors: &[usize]) -> Result<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .ok_or_else(blob_too_large)
}

/// One animated object inside a sampler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDesc {
    pub name: String,
    pub keyframes: usize,
    /// Normalized start of the channel within the sampler
    pub from: f32,
    /// Normalized end of the channel within the sampler
    pub to: f32,
    pub attributes: Vec<AttributeDesc>,
}

impl ChannelDesc {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDesc> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn blob_len(&self) -> Result<usize> {
        let floats = checked_sum(self.attributes.iter().map(|a| a.size))?;
        checked_product(&[self.keyframes, floats, 4])
    }
}

/// Shape of an `.anim.dat` blob
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationDescriptor {
    /// Seconds
    pub duration: f32,
    pub channels: Vec<ChannelDesc>,
}

impl AnimationDescriptor {
    pub fn from_animation(animation: &SampledAnimation) -> Self {
        let attributes = animation
            .present_attributes()
            .into_iter()
            .map(|(attribute, _)| AttributeDesc::new(attribute.name(), 3))
            .collect();

        Self {
            duration: animation.duration,
            channels: vec![ChannelDesc {
                name: animation.channel_name.clone(),
                keyframes: animation.frame_count(),
                from: 0.0,
                to: 1.0,
                attributes,
            }],
        }
    }

    /// Blob size in bytes implied by this descriptor
    pub fn expected_blob_len(&self) -> Result<usize> {
        self.channels.iter().try_fold(0usize, |total, channel| {
            total.checked_add(channel.blob_len()?).ok_or_else(blob_too_large)
        })
    }
}

/// Placement of one mesh object in the world document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDesc {
    pub name: String,
    /// Present only for uniform, non-unit scale
    pub scale: Option<f32>,
    pub position: [f32; 3],
    /// Vector part of the world rotation
    pub orientation: [f32; 3],
}

impl ObjectDesc {
    pub fn from_transform(name: impl Into<String>, transform: &Transform) -> Self {
        Self {
            name: name.into(),
            scale: transform.uniform_scale(),
            position: transform.translation.to_array(),
            orientation: transform.orientation(),
        }
    }
}

/// Contents of `<dir>.world.xml`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneDescriptor {
    pub objects: Vec<ObjectDesc>,
}

impl SceneDescriptor {
    pub fn new(objects: Vec<ObjectDesc>) -> Self {
        Self { objects }
    }
}
