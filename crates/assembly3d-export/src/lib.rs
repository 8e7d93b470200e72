//! Assembly3D Export Pipeline
//!
//! Converts a [`SceneSource`](assembly3d_scene::SceneSource) into the
//! Assembly3D interchange format:
//! - `<name>.mesh.xml` + `<name>.mesh.dat` per mesh object
//! - `<anim>.anim.xml` + `<anim>.anim.dat` per animated object
//! - `<dir>.world.xml` describing object placement
//!
//! The binary blobs carry no length prefixes; the XML descriptor next to
//! each blob is the only source of shape information.

pub mod animation;
pub mod armature;
pub mod buffer;
pub mod descriptor;
pub mod exporter;
pub mod load;
pub mod mesh;

pub use animation::{
    AnimationAttribute, AnimationSampler, ChannelFlags, FrameCursor, SampledAnimation,
    SamplingOutcome,
};
pub use buffer::BinaryBufferWriter;
pub use descriptor::{AnimationDescriptor, DescriptorKind, MeshDescriptor, SceneDescriptor};
pub use exporter::{AnimationSummary, ExportReport, Exporter, MeshSummary, world_descriptor_path};
pub use load::{AnimationAsset, ChannelSamples, GroupIndices, MeshAsset};
pub use mesh::{ConsolidatedMesh, GeometryConsolidator, IndexType, Pool, Slot, VertexRecord};
