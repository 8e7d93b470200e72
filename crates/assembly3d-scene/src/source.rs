// assembly3d-scene/src/source.rs
//! The query surface the exporter reads a host scene through.

use assembly3d_core::{FrameRange, Result};
use glam::Mat4;

use crate::model::SceneObject;

/// Index of an object within [`SceneSource::objects`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only view of a host scene plus its time cursor
///
/// The exporter never touches host-specific types; everything it needs
/// goes through this trait. The only mutable state is the current frame,
/// which world transforms are evaluated at.
pub trait SceneSource {
    /// All objects in scene order
    fn objects(&self) -> &[SceneObject];

    /// Inclusive animation frame range
    fn frame_range(&self) -> FrameRange;

    /// Frames per second
    fn fps(&self) -> f32;

    /// The frame transforms are currently evaluated at
    fn current_frame(&self) -> i32;

    /// Move the time cursor; subsequent transforms reflect `frame`
    fn set_frame(&mut self, frame: i32);

    /// World matrix of an object at the current frame
    fn world_transform(&self, id: ObjectId) -> Result<Mat4>;

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects().get(id.0)
    }

    /// Look up an object by name
    fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects()
            .iter()
            .position(|o| o.name == name)
            .map(ObjectId)
    }

    /// Ids of all objects, optionally restricted to the selection
    fn object_ids(&self, selected_only: bool) -> Vec<ObjectId> {
        self.objects()
            .iter()
            .enumerate()
            .filter(|(_, o)| !selected_only || o.selected)
            .map(|(i, _)| ObjectId(i))
            .collect()
    }
}
