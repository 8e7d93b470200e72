//! Little-endian serialization of the `.mesh.dat` and `.anim.dat` blobs
//!
//! Blobs are plain concatenations of typed arrays with no headers or
//! length prefixes:
//!
//! - mesh: positions, normals, texcoords (only with UVs), then the index
//!   buffer of every face group in group order
//! - animation: translation, rotation, scale samples, each only if present

use crate::animation::SampledAnimation;
use crate::mesh::{ConsolidatedMesh, IndexType};

/// Accumulates typed arrays into one contiguous byte stream
#[derive(Debug, Default)]
pub struct BinaryBufferWriter {
    data: Vec<u8>,
}

impl BinaryBufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
        }
    }

    pub fn write_f32(&mut self, value: f32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_vec3s(&mut self, values: &[[f32; 3]]) {
        for v in values {
            for &c in v {
                self.write_f32(c);
            }
        }
    }

    pub fn write_vec2s(&mut self, values: &[[f32; 2]]) {
        for v in values {
            for &c in v {
                self.write_f32(c);
            }
        }
    }

    /// Write indices narrowed to `index_type`
    ///
    /// # Panics
    ///
    /// If an index does not fit the chosen width.
    pub fn write_indices(&mut self, index_type: IndexType, indices: &[u32]) {
        for &index in indices {
            assert!(
                u64::from(index) < index_type.capacity(),
                "index {} does not fit {}",
                index,
                index_type
            );
            match index_type {
                IndexType::UnsignedByte => self.data.push(index as u8),
                IndexType::UnsignedShort => self.data.extend_from_slice(&(index as u16).to_le_bytes()),
                IndexType::UnsignedInt => self.data.extend_from_slice(&index.to_le_bytes()),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// Serialize a consolidated mesh into its `.mesh.dat` layout
pub fn mesh_blob(mesh: &ConsolidatedMesh) -> Vec<u8> {
    let count = mesh.vertex_count();
    let index_type = mesh.index_type();
    let uv_floats = if mesh.has_uv() { 2 } else { 0 };
    let capacity = count * (6 + uv_floats) * 4 + mesh.triangle_count() * 3 * index_type.bytes();

    let mut writer = BinaryBufferWriter::with_capacity(capacity);
    for vertex in mesh.vertices() {
        writer.write_vec3s(&[vertex.position]);
    }
    for vertex in mesh.vertices() {
        writer.write_vec3s(&[vertex.normal]);
    }
    if mesh.has_uv() {
        for vertex in mesh.vertices() {
            writer.write_vec2s(&[vertex.texcoord]);
        }
    }
    writer.write_indices(index_type, &mesh.indices());

    debug_assert_eq!(writer.len(), capacity);
    writer.into_inner()
}

/// Serialize the present channels of a sampled animation into its `.anim.dat` layout
pub fn animation_blob(animation: &SampledAnimation) -> Vec<u8> {
    let attributes = animation.present_attributes();
    let mut writer = BinaryBufferWriter::with_capacity(attributes.len() * animation.frame_count() * 12);
    for (_, samples) in attributes {
        writer.write_vec3s(samples);
    }
    writer.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GeometryConsolidator;
    use assembly3d_scene::{MeshData, MeshFace, MeshVertex};

    #[test]
    fn test_little_endian_floats() {
        let mut writer = BinaryBufferWriter::new();
        writer.write_f32(1.0);
        assert_eq!(writer.as_bytes(), &[0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn test_index_widths() {
        let mut writer = BinaryBufferWriter::new();
        writer.write_indices(IndexType::UnsignedByte, &[1, 2, 255]);
        assert_eq!(writer.as_bytes(), &[1, 2, 255]);

        let mut writer = BinaryBufferWriter::new();
        writer.write_indices(IndexType::UnsignedShort, &[0x0102]);
        assert_eq!(writer.as_bytes(), &[0x02, 0x01]);

        let mut writer = BinaryBufferWriter::new();
        writer.write_indices(IndexType::UnsignedInt, &[0x01020304]);
        assert_eq!(writer.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    #[should_panic]
    fn test_index_overflow_panics() {
        let mut writer = BinaryBufferWriter::new();
        writer.write_indices(IndexType::UnsignedByte, &[256]);
    }

    fn triangle(has_uv: bool) -> MeshData {
        let face = MeshFace::new(vec![0, 1, 2]);
        MeshData {
            vertices: vec![
                MeshVertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                MeshVertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                MeshVertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ],
            faces: vec![if has_uv {
                face.with_uvs(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]])
            } else {
                face
            }],
            has_uv,
            materials: Vec::new(),
        }
    }

    #[test]
    fn test_mesh_blob_layout() {
        let mesh = GeometryConsolidator::consolidate(&triangle(false)).unwrap();
        let blob = mesh_blob(&mesh);

        // 3 positions + 3 normals, 3 byte indices
        assert_eq!(blob.len(), 3 * 12 + 3 * 12 + 3);
        assert_eq!(&blob[72..], &[0, 1, 2]);
        // second position starts at x = 1.0
        assert_eq!(&blob[12..16], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_mesh_blob_with_uvs() {
        let mesh = GeometryConsolidator::consolidate(&triangle(true)).unwrap();
        let blob = mesh_blob(&mesh);

        assert_eq!(blob.len(), 3 * 12 + 3 * 12 + 3 * 8 + 3);
        // texcoords follow normals; second uv is (1, 0)
        assert_eq!(&blob[80..84], &1.0f32.to_le_bytes());
    }
}
