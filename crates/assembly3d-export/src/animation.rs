//! Per-frame transform sampling and channel detection

use std::ops::{Deref, DerefMut};

use assembly3d_core::{CHANNEL_EPSILON, Error, FrameRange, Result, Transform};
use assembly3d_scene::{ObjectId, SceneSource};

/// Which transform channels carry non-trivial data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelFlags {
    pub translation: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl ChannelFlags {
    pub fn any(&self) -> bool {
        self.translation || self.rotation || self.scale
    }

    pub fn count(&self) -> usize {
        [self.translation, self.rotation, self.scale]
            .iter()
            .filter(|used| **used)
            .count()
    }

    /// Fold one sampled transform into the flags
    pub fn observe(&mut self, transform: &Transform, eps: f32) {
        self.translation |= transform.has_translation(eps);
        self.rotation |= transform.has_rotation(eps);
        self.scale |= transform.has_scale(eps);
    }
}

/// Named per-channel attribute of an animation blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationAttribute {
    Position,
    Orientation,
    Scaling,
}

impl AnimationAttribute {
    pub const ALL: [AnimationAttribute; 3] = [
        AnimationAttribute::Position,
        AnimationAttribute::Orientation,
        AnimationAttribute::Scaling,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnimationAttribute::Position => "POSITION",
            AnimationAttribute::Orientation => "ORIENTATION",
            AnimationAttribute::Scaling => "SCALING",
        }
    }
}

/// Sampled world transforms of one object over the scene frame range
#[derive(Debug, Clone)]
pub struct SampledAnimation {
    /// Output file stem: the action name, or the object name without one
    pub name: String,
    /// Object the channel belongs to
    pub channel_name: String,
    /// Seconds covered by the samples
    pub duration: f32,
    pub translations: Vec<[f32; 3]>,
    /// Vector part of the rotation per frame
    pub rotations: Vec<[f32; 3]>,
    pub scales: Vec<[f32; 3]>,
    pub flags: ChannelFlags,
}

impl SampledAnimation {
    pub fn frame_count(&self) -> usize {
        self.translations.len()
    }

    /// Used channels and their samples, in blob order
    pub fn present_attributes(&self) -> Vec<(AnimationAttribute, &[[f32; 3]])> {
        let mut attributes = Vec::with_capacity(3);
        if self.flags.translation {
            attributes.push((AnimationAttribute::Position, self.translations.as_slice()));
        }
        if self.flags.rotation {
            attributes.push((AnimationAttribute::Orientation, self.rotations.as_slice()));
        }
        if self.flags.scale {
            attributes.push((AnimationAttribute::Scaling, self.scales.as_slice()));
        }
        attributes
    }
}

/// Scoped hold on a scene's time cursor
///
/// Remembers the current frame on creation and puts it back when dropped,
/// whichever way the holder exits.
pub struct FrameCursor<'a, S: SceneSource + ?Sized> {
    source: &'a mut S,
    saved: i32,
}

impl<'a, S: SceneSource + ?Sized> FrameCursor<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        let saved = source.current_frame();
        Self { source, saved }
    }

    /// The frame that will be restored
    pub fn saved_frame(&self) -> i32 {
        self.saved
    }
}

impl<S: SceneSource + ?Sized> Deref for FrameCursor<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.source
    }
}

impl<S: SceneSource + ?Sized> DerefMut for FrameCursor<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.source
    }
}

impl<S: SceneSource + ?Sized> Drop for FrameCursor<'_, S> {
    fn drop(&mut self) {
        self.source.set_frame(self.saved);
        tracing::trace!(frame = self.saved, "Restored scene frame");
    }
}

/// Result of a sampling pass
#[derive(Debug, Clone, Default)]
pub struct SamplingOutcome {
    /// Animations handed to the callback
    pub sampled: usize,
    /// Objects whose animation had no used channel
    pub skipped: Vec<String>,
}

/// Samples object world transforms frame by frame
#[derive(Debug, Clone, Copy)]
pub struct AnimationSampler {
    epsilon: f32,
}

impl Default for AnimationSampler {
    fn default() -> Self {
        Self {
            epsilon: CHANNEL_EPSILON,
        }
    }
}

impl AnimationSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(epsilon: f32) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Move the scene to `frame` and decompose the object's world matrix
    pub fn sample_frame<S: SceneSource + ?Sized>(
        &self,
        source: &mut S,
        id: ObjectId,
        frame: i32,
    ) -> Result<Transform> {
        source.set_frame(frame);
        let matrix = source.world_transform(id)?;
        Ok(Transform::from_matrix(&matrix))
    }

    /// Sample one object over `range`
    ///
    /// Returns `None` when no channel deviates from identity on any frame.
    /// The scene frame is left at the last sampled frame; wrap the source
    /// in a [`FrameCursor`] to restore it.
    pub fn sample_object<S: SceneSource + ?Sized>(
        &self,
        source: &mut S,
        id: ObjectId,
        range: FrameRange,
    ) -> Result<Option<SampledAnimation>> {
        let object = source
            .object(id)
            .ok_or_else(|| Error::invalid_data(format!("no object with id {id}")))?;
        let channel_name = object.name.clone();
        let name = object
            .animation
            .as_ref()
            .and_then(|anim| anim.action.clone())
            .unwrap_or_else(|| channel_name.clone());

        let count = range.count();
        let mut translations = Vec::with_capacity(count);
        let mut rotations = Vec::with_capacity(count);
        let mut scales = Vec::with_capacity(count);
        let mut flags = ChannelFlags::default();

        for frame in range.frames() {
            let transform = self.sample_frame(source, id, frame)?;
            tracing::trace!(
                object = %channel_name,
                frame,
                t = ?transform.translation,
                r = ?transform.rotation,
                s = ?transform.scale,
                "Sampled frame"
            );
            flags.observe(&transform, self.epsilon);
            translations.push(transform.translation.to_array());
            rotations.push(transform.orientation());
            scales.push(transform.scale.to_array());
        }

        tracing::debug!(
            object = %channel_name,
            translation = flags.translation,
            rotation = flags.rotation,
            scale = flags.scale,
            "Channel usage"
        );

        if !flags.any() {
            return Ok(None);
        }

        Ok(Some(SampledAnimation {
            name,
            channel_name,
            duration: range.duration(source.fps()),
            translations,
            rotations,
            scales,
            flags,
        }))
    }

    /// Sample every animated object in `ids`, handing each result to `f`
    ///
    /// Objects without an action or NLA use are ignored. The scene frame is
    /// restored before returning, including when `f` or sampling fails.
    pub fn for_each_animation<S, F>(
        &self,
        source: &mut S,
        ids: &[ObjectId],
        mut f: F,
    ) -> Result<SamplingOutcome>
    where
        S: SceneSource + ?Sized,
        F: FnMut(SampledAnimation) -> Result<()>,
    {
        let mut cursor = FrameCursor::new(source);
        let range = cursor.frame_range();
        let mut outcome = SamplingOutcome::default();

        for &id in ids {
            let Some(object) = cursor.object(id) else {
                return Err(Error::invalid_data(format!("no object with id {id}")));
            };
            if !object.has_animation() {
                tracing::debug!(object = %object.name, "No action or NLA, skipping");
                continue;
            }
            let object_name = object.name.clone();

            match self.sample_object(&mut *cursor, id, range)? {
                Some(animation) => {
                    outcome.sampled += 1;
                    f(animation)?;
                }
                None => {
                    tracing::warn!(object = %object_name, "Animation has no used channel, skipping");
                    outcome.skipped.push(object_name);
                }
            }
        }

        Ok(outcome)
    }

    /// Sample every animated object in `ids` into memory
    pub fn sample_all<S: SceneSource + ?Sized>(
        &self,
        source: &mut S,
        ids: &[ObjectId],
    ) -> Result<Vec<SampledAnimation>> {
        let mut animations = Vec::new();
        self.for_each_animation(source, ids, |animation| {
            animations.push(animation);
            Ok(())
        })?;
        Ok(animations)
    }
}
