//! Common types used across Assembly3D
//!
//! This module provides the transform decomposition and frame-range types
//! shared by the scene and export crates.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

pub use glam;

/// Tolerance used when deciding whether a sampled transform component is trivial
pub const CHANNEL_EPSILON: f32 = 1e-4;

/// `|a| < eps`
pub fn is_zero(a: f32, eps: f32) -> bool {
    a.abs() < eps
}

/// `|a - 1| < eps`
pub fn is_one(a: f32, eps: f32) -> bool {
    (a - 1.0).abs() < eps
}

/// A translation/rotation/scale decomposition of an affine matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Decompose an affine matrix
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Compose back into an affine matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// The vector part of the rotation (x, y, z), dropping the scalar
    pub fn orientation(&self) -> [f32; 3] {
        [self.rotation.x, self.rotation.y, self.rotation.z]
    }

    /// The uniform scale factor, if the scale is uniform and not exactly one
    pub fn uniform_scale(&self) -> Option<f32> {
        let s = self.scale;
        if s.x != 1.0 && s.x == s.y && s.y == s.z {
            Some(s.x)
        } else {
            None
        }
    }

    /// Whether the translation deviates from zero on any axis
    pub fn has_translation(&self, eps: f32) -> bool {
        let t = self.translation;
        !(is_zero(t.x, eps) && is_zero(t.y, eps) && is_zero(t.z, eps))
    }

    /// Whether the rotation deviates from identity (scalar one, vector zero)
    pub fn has_rotation(&self, eps: f32) -> bool {
        let r = self.rotation;
        !(is_one(r.w, eps) && is_zero(r.x, eps) && is_zero(r.y, eps) && is_zero(r.z, eps))
    }

    /// Whether the scale deviates from one on any axis
    pub fn has_scale(&self, eps: f32) -> bool {
        let s = self.scale;
        !(is_one(s.x, eps) && is_one(s.y, eps) && is_one(s.z, eps))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Inclusive scene frame range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: i32,
    pub end: i32,
}

impl FrameRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Number of frames in the range (zero if `end < start`)
    pub fn count(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Frames in ascending order
    pub fn frames(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// Duration in seconds at the given frame rate
    pub fn duration(&self, fps: f32) -> f32 {
        if fps > 0.0 {
            self.count() as f32 / fps
        } else {
            0.0
        }
    }
}

impl Default for FrameRange {
    fn default() -> Self {
        Self { start: 1, end: 250 }
    }
}
