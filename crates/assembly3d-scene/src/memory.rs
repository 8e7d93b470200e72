// assembly3d-scene/src/memory.rs
//! In-memory scene, loadable from JSON

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use assembly3d_core::{Error, FrameRange, Result, ResultExt, Transform};
use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::model::SceneObject;
use crate::source::{ObjectId, SceneSource};

/// Parent chains deeper than this are treated as cycles
const MAX_PARENT_DEPTH: usize = 256;

/// A self-contained scene with keyframe-driven transforms
///
/// ```json
/// {
///   "frame_range": { "start": 1, "end": 24 },
///   "fps": 24.0,
///   "objects": [ { "name": "Cube", "data": { "type": "mesh", ... } } ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryScene {
    #[serde(default)]
    pub frame_range: FrameRange,
    #[serde(default = "default_fps")]
    pub fps: f32,
    /// Time cursor; starts at the frame the scene was saved at
    #[serde(default = "default_frame")]
    pub current_frame: i32,
    pub objects: Vec<SceneObject>,
}

impl MemoryScene {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self {
            frame_range: FrameRange::default(),
            fps: default_fps(),
            current_frame: default_frame(),
            objects,
        }
    }

    pub fn with_frame_range(mut self, start: i32, end: i32) -> Self {
        self.frame_range = FrameRange::new(start, end);
        self
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_current_frame(mut self, frame: i32) -> Self {
        self.current_frame = frame;
        self
    }

    /// Load a scene from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let file = File::open(path).with_context(|| format!("opening scene {}", path.display()))?;
        let scene: MemoryScene = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing scene {}", path.display()))?;
        scene.validate()?;
        tracing::debug!(path = %path.display(), objects = scene.objects.len(), "Loaded scene");
        Ok(scene)
    }

    /// Parse a scene from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let scene: MemoryScene = serde_json::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fps > 0.0) {
            return Err(Error::invalid_data(format!("fps must be positive, got {}", self.fps)));
        }
        for object in &self.objects {
            if let Some(animation) = &object.animation {
                animation
                    .validate()
                    .with_context(|| format!("animation of object '{}'", object.name))?;
            }
            if let Some(parent) = &object.parent {
                if self.find(&parent.object).is_none() {
                    return Err(Error::invalid_data(format!(
                        "object '{}' has unknown parent '{}'",
                        object.name, parent.object
                    )));
                }
            }
        }
        Ok(())
    }

    /// Local transform of an object at the current frame
    fn local_transform(&self, object: &SceneObject) -> Transform {
        object
            .animation
            .as_ref()
            .and_then(|anim| anim.evaluate(self.current_frame))
            .unwrap_or_else(|| object.transform.to_transform())
    }
}

impl SceneSource for MemoryScene {
    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    fn frame_range(&self) -> FrameRange {
        self.frame_range
    }

    fn fps(&self) -> f32 {
        self.fps
    }

    fn current_frame(&self) -> i32 {
        self.current_frame
    }

    fn set_frame(&mut self, frame: i32) {
        self.current_frame = frame;
    }

    fn world_transform(&self, id: ObjectId) -> Result<Mat4> {
        let mut object = self
            .object(id)
            .ok_or_else(|| Error::invalid_data(format!("no object with id {id}")))?;
        let mut world = self.local_transform(object).to_matrix();

        let mut depth = 0;
        while let Some(parent) = &object.parent {
            depth += 1;
            if depth > MAX_PARENT_DEPTH {
                return Err(Error::invalid_data(format!(
                    "parent chain of '{}' does not terminate",
                    self.objects[id.0].name
                )));
            }
            let parent_id = self.find(&parent.object).ok_or_else(|| {
                Error::invalid_data(format!("unknown parent '{}'", parent.object))
            })?;
            object = &self.objects[parent_id.0];
            world = self.local_transform(object).to_matrix() * world;
        }

        Ok(world)
    }
}

fn default_fps() -> f32 {
    24.0
}

fn default_frame() -> i32 {
    1
}
