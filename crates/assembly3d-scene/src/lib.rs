//! assembly3d-scene
//!
//! The read-only view of an authoring-tool scene that the exporter works
//! from. The host application plugs in by implementing [`SceneSource`];
//! [`MemoryScene`] is a self-contained implementation that can be loaded
//! from JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use assembly3d_scene::{MemoryScene, SceneSource};
//!
//! let scene = MemoryScene::from_json_file("scene.json")?;
//! for object in scene.objects() {
//!     println!("{} ({})", object.name, object.data.kind_name());
//! }
//! ```

pub mod memory;
pub mod model;
pub mod source;

pub use memory::MemoryScene;
pub use model::{
    AnimationSource, ArmatureData, Bone, Keyframe, LocalTransform, MeshData, MeshFace,
    MeshVertex, ObjectData, ParentKind, ParentLink, SceneObject,
};
pub use source::{ObjectId, SceneSource};
