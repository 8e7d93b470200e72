//! Loading exported assets back from their descriptor and blob pairs

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use assembly3d_core::{Error, Result, ResultExt};

use crate::animation::AnimationAttribute;
use crate::descriptor::{AnimationDescriptor, MeshDescriptor, read_animation, read_mesh};
use crate::mesh::IndexType;

/// Sibling blob of a descriptor: `name.mesh.xml` -> `name.mesh.dat`
pub fn blob_path(xml_path: &Path) -> PathBuf {
    xml_path.with_extension("dat")
}

fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_blob(path: &Path, expected: usize) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if data.len() != expected {
        return Err(Error::invalid_data(format!(
            "{} is {} bytes but its descriptor declares {}",
            path.display(),
            data.len(),
            expected
        )));
    }
    Ok(data)
}

fn read_vec3s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<[f32; 3]>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push([
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
        ]);
    }
    Ok(values)
}

fn read_vec2s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<[f32; 2]>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push([reader.read_f32::<LittleEndian>()?, reader.read_f32::<LittleEndian>()?]);
    }
    Ok(values)
}

fn read_indices<R: Read>(reader: &mut R, index_type: IndexType, count: usize) -> Result<Vec<u32>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let index = match index_type {
            IndexType::UnsignedByte => u32::from(reader.read_u8()?),
            IndexType::UnsignedShort => u32::from(reader.read_u16::<LittleEndian>()?),
            IndexType::UnsignedInt => reader.read_u32::<LittleEndian>()?,
        };
        values.push(index);
    }
    Ok(values)
}

/// Index buffer of one face group
#[derive(Debug, Clone)]
pub struct GroupIndices {
    pub name: String,
    /// Three indices per triangle
    pub indices: Vec<u32>,
}

/// A mesh reconstructed from `.mesh.xml` + `.mesh.dat`
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub descriptor: MeshDescriptor,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub groups: Vec<GroupIndices>,
}

impl MeshAsset {
    pub fn load(xml_path: impl AsRef<Path>) -> Result<Self> {
        let xml_path = xml_path.as_ref();
        let descriptor = read_mesh(&read_text(xml_path)?)
            .with_context(|| format!("parsing {}", xml_path.display()))?;
        let data = read_blob(&blob_path(xml_path), descriptor.expected_blob_len()?)?;
        Self::from_parts(descriptor, &data)
    }

    /// Slice a blob according to its descriptor
    pub fn from_parts(descriptor: MeshDescriptor, data: &[u8]) -> Result<Self> {
        let expected = descriptor.expected_blob_len()?;
        if data.len() != expected {
            return Err(Error::invalid_data(format!(
                "mesh blob is {} bytes, expected {}",
                data.len(),
                expected
            )));
        }

        let count = descriptor.vertex_count;
        let mut reader = Cursor::new(data);
        let mut positions = None;
        let mut normals = None;
        let mut texcoords = None;

        for attribute in &descriptor.attributes {
            match (attribute.name.as_str(), attribute.size) {
                ("POSITION", 3) => positions = Some(read_vec3s(&mut reader, count)?),
                ("NORMAL", 3) => normals = Some(read_vec3s(&mut reader, count)?),
                ("TEXCOORD", 2) => texcoords = Some(read_vec2s(&mut reader, count)?),
                (name, size) => {
                    return Err(Error::invalid_data(format!(
                        "unsupported mesh attribute {name} of size {size}"
                    )));
                }
            }
        }

        let mut groups = Vec::with_capacity(descriptor.groups.len());
        for group in &descriptor.groups {
            let indices = read_indices(&mut reader, descriptor.index_type, group.count * 3)?;
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
                return Err(Error::invalid_data(format!(
                    "group '{}' references vertex {} of {}",
                    group.name, bad, count
                )));
            }
            groups.push(GroupIndices {
                name: group.name.clone(),
                indices,
            });
        }

        Ok(Self {
            positions: positions.ok_or_else(|| Error::missing_field("POSITION"))?,
            normals: normals.ok_or_else(|| Error::missing_field("NORMAL"))?,
            texcoords,
            groups,
            descriptor,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.indices.len() / 3).sum()
    }
}

/// Samples of one animated object
#[derive(Debug, Clone)]
pub struct ChannelSamples {
    pub name: String,
    pub translations: Option<Vec<[f32; 3]>>,
    pub rotations: Option<Vec<[f32; 3]>>,
    pub scales: Option<Vec<[f32; 3]>>,
}

impl ChannelSamples {
    pub fn get(&self, attribute: AnimationAttribute) -> Option<&[[f32; 3]]> {
        match attribute {
            AnimationAttribute::Position => self.translations.as_deref(),
            AnimationAttribute::Orientation => self.rotations.as_deref(),
            AnimationAttribute::Scaling => self.scales.as_deref(),
        }
    }
}

/// An animation reconstructed from `.anim.xml` + `.anim.dat`
#[derive(Debug, Clone)]
pub struct AnimationAsset {
    pub descriptor: AnimationDescriptor,
    pub channels: Vec<ChannelSamples>,
}

impl AnimationAsset {
    pub fn load(xml_path: impl AsRef<Path>) -> Result<Self> {
        let xml_path = xml_path.as_ref();
        let descriptor = read_animation(&read_text(xml_path)?)
            .with_context(|| format!("parsing {}", xml_path.display()))?;
        let data = read_blob(&blob_path(xml_path), descriptor.expected_blob_len()?)?;
        Self::from_parts(descriptor, &data)
    }

    pub fn from_parts(descriptor: AnimationDescriptor, data: &[u8]) -> Result<Self> {
        let expected = descriptor.expected_blob_len()?;
        if data.len() != expected {
            return Err(Error::invalid_data(format!(
                "animation blob is {} bytes, expected {}",
                data.len(),
                expected
            )));
        }

        let mut reader = Cursor::new(data);
        let mut channels = Vec::with_capacity(descriptor.channels.len());
        for channel in &descriptor.channels {
            let mut samples = ChannelSamples {
                name: channel.name.clone(),
                translations: None,
                rotations: None,
                scales: None,
            };
            for attribute in &channel.attributes {
                if attribute.size != 3 {
                    return Err(Error::invalid_data(format!(
                        "animation attribute {} has size {}",
                        attribute.name, attribute.size
                    )));
                }
                let values = read_vec3s(&mut reader, channel.keyframes)?;
                let slot = match attribute.name.as_str() {
                    "POSITION" => &mut samples.translations,
                    "ORIENTATION" => &mut samples.rotations,
                    "SCALING" => &mut samples.scales,
                    other => {
                        return Err(Error::invalid_data(format!(
                            "unsupported animation attribute {other}"
                        )));
                    }
                };
                *slot = Some(values);
            }
            channels.push(samples);
        }

        Ok(Self {
            descriptor,
            channels,
        })
    }
}
