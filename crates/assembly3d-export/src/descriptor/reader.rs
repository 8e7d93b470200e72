//! Parsing descriptor documents back into typed descriptors

use std::fmt;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

use assembly3d_core::{Error, Result};

use super::{
    AnimationDescriptor, AttributeDesc, ChannelDesc, FLOAT_TYPE, GroupDesc, MeshDescriptor,
    ObjectDesc, SceneDescriptor,
};
use crate::mesh::IndexType;

#[derive(Debug, Deserialize)]
struct RawAttribute {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@size")]
    size: usize,
    #[serde(rename = "@type")]
    data_type: String,
}

#[derive(Debug, Deserialize)]
struct RawMesh {
    #[serde(rename = "Vertices")]
    vertices: RawVertices,
    #[serde(rename = "Triangles")]
    triangles: RawTriangles,
}

#[derive(Debug, Deserialize)]
struct RawVertices {
    #[serde(rename = "@count")]
    count: usize,
    #[serde(rename = "@attributes")]
    attributes: usize,
    #[serde(rename = "Attribute", default)]
    attribute: Vec<RawAttribute>,
}

#[derive(Debug, Deserialize)]
struct RawTriangles {
    #[serde(rename = "@type")]
    index_type: String,
    #[serde(rename = "@groups")]
    groups: usize,
    #[serde(rename = "Group", default)]
    group: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@count")]
    count: usize,
}

#[derive(Debug, Deserialize)]
struct RawAnimation {
    #[serde(rename = "Sampler")]
    sampler: RawSampler,
}

#[derive(Debug, Deserialize)]
struct RawSampler {
    #[serde(rename = "@duration")]
    duration: f32,
    #[serde(rename = "@channels")]
    channels: usize,
    #[serde(rename = "Channel", default)]
    channel: Vec<RawChannel>,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@keyframes")]
    keyframes: usize,
    #[serde(rename = "@attributes")]
    attributes: usize,
    #[serde(rename = "@from", default)]
    from: Option<f32>,
    #[serde(rename = "@to", default)]
    to: Option<f32>,
    #[serde(rename = "Attribute", default)]
    attribute: Vec<RawAttribute>,
}

#[derive(Debug, Deserialize)]
struct RawScene {
    #[serde(rename = "World")]
    world: RawWorld,
}

#[derive(Debug, Deserialize)]
struct RawWorld {
    #[serde(rename = "@objects")]
    objects: usize,
    #[serde(rename = "Object", default)]
    object: Vec<RawObject>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@scale", default)]
    scale: Option<f32>,
    #[serde(rename = "Position")]
    position: RawVec3,
    #[serde(rename = "Orientation")]
    orientation: RawVec3,
}

#[derive(Debug, Deserialize)]
struct RawVec3 {
    #[serde(rename = "@x")]
    x: f32,
    #[serde(rename = "@y")]
    y: f32,
    #[serde(rename = "@z")]
    z: f32,
}

impl RawVec3 {
    fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

fn deserialize<'de, T: Deserialize<'de>>(xml: &'de str) -> Result<T> {
    quick_xml::de::from_str(xml).map_err(|e| Error::xml(e.to_string()))
}

fn check_count(element: &str, declared: usize, found: usize) -> Result<()> {
    if declared != found {
        return Err(Error::xml(format!(
            "<{element}> declares {declared} entries but contains {found}"
        )));
    }
    Ok(())
}

fn convert_attributes(raw: Vec<RawAttribute>) -> Result<Vec<AttributeDesc>> {
    raw.into_iter()
        .map(|a| {
            if a.data_type != FLOAT_TYPE {
                return Err(Error::xml(format!(
                    "attribute {} has unsupported type '{}'",
                    a.name, a.data_type
                )));
            }
            Ok(AttributeDesc::new(a.name, a.size))
        })
        .collect()
}

/// Which descriptor document a string holds, by root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Mesh,
    Animation,
    Scene,
}

impl DescriptorKind {
    pub fn detect(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().map_err(|e| Error::xml(e.to_string()))? {
                Event::Start(e) | Event::Empty(e) => {
                    return match e.local_name().as_ref() {
                        b"Mesh" => Ok(DescriptorKind::Mesh),
                        b"Animation" => Ok(DescriptorKind::Animation),
                        b"Scene" => Ok(DescriptorKind::Scene),
                        other => Err(Error::xml(format!(
                            "unknown descriptor root <{}>",
                            String::from_utf8_lossy(other)
                        ))),
                    };
                }
                Event::Eof => return Err(Error::xml("document has no root element")),
                _ => {}
            }
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DescriptorKind::Mesh => "mesh",
            DescriptorKind::Animation => "animation",
            DescriptorKind::Scene => "scene",
        })
    }
}

/// Parse a `<Mesh>` document
pub fn read_mesh(xml: &str) -> Result<MeshDescriptor> {
    let raw: RawMesh = deserialize(xml)?;
    check_count("Vertices", raw.vertices.attributes, raw.vertices.attribute.len())?;
    check_count("Triangles", raw.triangles.groups, raw.triangles.group.len())?;

    Ok(MeshDescriptor {
        vertex_count: raw.vertices.count,
        attributes: convert_attributes(raw.vertices.attribute)?,
        index_type: raw.triangles.index_type.parse::<IndexType>()?,
        groups: raw
            .triangles
            .group
            .into_iter()
            .map(|g| GroupDesc {
                name: g.name,
                count: g.count,
            })
            .collect(),
    })
}

/// Parse an `<Animation>` document
///
/// Missing `from`/`to` channel attributes default to 0 and 1.
pub fn read_animation(xml: &str) -> Result<AnimationDescriptor> {
    let raw: RawAnimation = deserialize(xml)?;
    check_count("Sampler", raw.sampler.channels, raw.sampler.channel.len())?;

    let channels = raw
        .sampler
        .channel
        .into_iter()
        .map(|c| {
            check_count("Channel", c.attributes, c.attribute.len())?;
            Ok(ChannelDesc {
                name: c.name,
                keyframes: c.keyframes,
                from: c.from.unwrap_or(0.0),
                to: c.to.unwrap_or(1.0),
                attributes: convert_attributes(c.attribute)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnimationDescriptor {
        duration: raw.sampler.duration,
        channels,
    })
}

/// Parse a `<Scene>` document
pub fn read_scene(xml: &str) -> Result<SceneDescriptor> {
    let raw: RawScene = deserialize(xml)?;
    check_count("World", raw.world.objects, raw.world.object.len())?;

    Ok(SceneDescriptor::new(
        raw.world
            .object
            .into_iter()
            .map(|o| ObjectDesc {
                position: o.position.to_array(),
                orientation: o.orientation.to_array(),
                name: o.name,
                scale: o.scale,
            })
            .collect(),
    ))
}
