//! Tab-indented XML emission of the three descriptor documents

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use assembly3d_core::{Error, Result, ResultExt};

use super::{
    ANIMATION_NAMESPACE, AnimationDescriptor, AttributeDesc, FLOAT_TYPE, MESH_NAMESPACE,
    MeshDescriptor, SCENE_NAMESPACE, SceneDescriptor, XSI_NAMESPACE, schema_location,
};

fn float(value: f32) -> String {
    format!("{value:.6}")
}

/// Thin wrapper mapping quick-xml failures into [`Error::Xml`]
struct XmlOut<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlOut<W> {
    fn new(inner: W) -> Self {
        Self {
            writer: Writer::new_with_indent(inner, b'\t', 1),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::xml(e.to_string()))
    }

    fn declaration(&mut self) -> Result<()> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    /// Open the root element with its namespace declarations
    fn root(&mut self, name: &str, namespace: &str) -> Result<()> {
        let location = schema_location(namespace);
        let mut start = BytesStart::new(name);
        start.push_attribute(("xmlns", namespace));
        start.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        start.push_attribute(("xsi:schemaLocation", location.as_str()));
        self.event(Event::Start(start))
    }

    fn start(&mut self, start: BytesStart<'_>) -> Result<()> {
        self.event(Event::Start(start))
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.event(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn attribute(&mut self, attribute: &AttributeDesc) -> Result<()> {
        let size = attribute.size.to_string();
        let mut element = BytesStart::new("Attribute");
        element.push_attribute(("name", attribute.name.as_str()));
        element.push_attribute(("size", size.as_str()));
        element.push_attribute(("type", FLOAT_TYPE));
        self.empty(element)
    }

    fn vector(&mut self, name: &str, v: [f32; 3]) -> Result<()> {
        let [x, y, z] = v.map(float);
        let mut element = BytesStart::new(name);
        element.push_attribute(("x", x.as_str()));
        element.push_attribute(("y", y.as_str()));
        element.push_attribute(("z", z.as_str()));
        self.empty(element)
    }

    fn finish(mut self) -> Result<W> {
        self.writer.get_mut().write_all(b"\n")?;
        Ok(self.writer.into_inner())
    }
}

/// Write a `<Mesh>` document
pub fn write_mesh<W: Write>(out: W, desc: &MeshDescriptor) -> Result<W> {
    let mut xml = XmlOut::new(out);
    xml.declaration()?;
    xml.root("Mesh", MESH_NAMESPACE)?;

    let count = desc.vertex_count.to_string();
    let attributes = desc.attributes.len().to_string();
    let mut vertices = BytesStart::new("Vertices");
    vertices.push_attribute(("count", count.as_str()));
    vertices.push_attribute(("attributes", attributes.as_str()));
    xml.start(vertices)?;
    for attribute in &desc.attributes {
        xml.attribute(attribute)?;
    }
    xml.end("Vertices")?;

    let groups = desc.groups.len().to_string();
    let mut triangles = BytesStart::new("Triangles");
    triangles.push_attribute(("type", desc.index_type.name()));
    triangles.push_attribute(("groups", groups.as_str()));
    xml.start(triangles)?;
    for group in &desc.groups {
        let count = group.count.to_string();
        let mut element = BytesStart::new("Group");
        element.push_attribute(("name", group.name.as_str()));
        element.push_attribute(("count", count.as_str()));
        xml.empty(element)?;
    }
    xml.end("Triangles")?;

    xml.end("Mesh")?;
    xml.finish()
}

/// Write an `<Animation>` document
pub fn write_animation<W: Write>(out: W, desc: &AnimationDescriptor) -> Result<W> {
    let mut xml = XmlOut::new(out);
    xml.declaration()?;
    xml.root("Animation", ANIMATION_NAMESPACE)?;

    let duration = float(desc.duration);
    let channels = desc.channels.len().to_string();
    let mut sampler = BytesStart::new("Sampler");
    sampler.push_attribute(("duration", duration.as_str()));
    sampler.push_attribute(("channels", channels.as_str()));
    xml.start(sampler)?;

    for channel in &desc.channels {
        let keyframes = channel.keyframes.to_string();
        let attributes = channel.attributes.len().to_string();
        let mut element = BytesStart::new("Channel");
        element.push_attribute(("name", channel.name.as_str()));
        element.push_attribute(("keyframes", keyframes.as_str()));
        element.push_attribute(("attributes", attributes.as_str()));
        // from/to only appear when they differ from the reader defaults
        let (from, to) = (float(channel.from), float(channel.to));
        if channel.from != 0.0 || channel.to != 1.0 {
            element.push_attribute(("from", from.as_str()));
            element.push_attribute(("to", to.as_str()));
        }
        xml.start(element)?;
        for attribute in &channel.attributes {
            xml.attribute(attribute)?;
        }
        xml.end("Channel")?;
    }

    xml.end("Sampler")?;
    xml.end("Animation")?;
    xml.finish()
}

/// Write a `<Scene>` document
pub fn write_scene<W: Write>(out: W, desc: &SceneDescriptor) -> Result<W> {
    let mut xml = XmlOut::new(out);
    xml.declaration()?;
    xml.root("Scene", SCENE_NAMESPACE)?;

    let objects = desc.objects.len().to_string();
    let mut world = BytesStart::new("World");
    world.push_attribute(("objects", objects.as_str()));
    xml.start(world)?;

    for object in &desc.objects {
        let scale = object.scale.map(float);
        let mut element = BytesStart::new("Object");
        element.push_attribute(("name", object.name.as_str()));
        if let Some(scale) = &scale {
            element.push_attribute(("scale", scale.as_str()));
        }
        xml.start(element)?;
        xml.vector("Position", object.position)?;
        xml.vector("Orientation", object.orientation)?;
        xml.end("Object")?;
    }

    xml.end("World")?;
    xml.end("Scene")?;
    xml.finish()
}

fn to_string<F>(write: F) -> Result<String>
where
    F: FnOnce(Vec<u8>) -> Result<Vec<u8>>,
{
    let bytes = write(Vec::new())?;
    String::from_utf8(bytes).map_err(|e| Error::xml(e.to_string()))
}

pub fn mesh_to_string(desc: &MeshDescriptor) -> Result<String> {
    to_string(|out| write_mesh(out, desc))
}

pub fn animation_to_string(desc: &AnimationDescriptor) -> Result<String> {
    to_string(|out| write_animation(out, desc))
}

pub fn scene_to_string(desc: &SceneDescriptor) -> Result<String> {
    to_string(|out| write_scene(out, desc))
}

fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<BufWriter<File>>,
{
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = write(BufWriter::new(file))?;
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn write_mesh_file(path: &Path, desc: &MeshDescriptor) -> Result<()> {
    write_file(path, |out| write_mesh(out, desc))
}

pub fn write_animation_file(path: &Path, desc: &AnimationDescriptor) -> Result<()> {
    write_file(path, |out| write_animation(out, desc))
}

pub fn write_scene_file(path: &Path, desc: &SceneDescriptor) -> Result<()> {
    write_file(path, |out| write_scene(out, desc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ChannelDesc, GroupDesc, ObjectDesc};
    use crate::mesh::IndexType;

    #[test]
    fn test_mesh_document() {
        let desc = MeshDescriptor {
            vertex_count: 4,
            attributes: vec![
                AttributeDesc::new("POSITION", 3),
                AttributeDesc::new("NORMAL", 3),
                AttributeDesc::new("TEXCOORD", 2),
            ],
            index_type: IndexType::UnsignedByte,
            groups: vec![GroupDesc {
                name: "default".into(),
                count: 2,
            }],
        };
        let xml = mesh_to_string(&desc).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<Mesh xmlns="http://assembly.interaction3d.org/mesh""#));
        assert!(xml.contains("\n\t<Vertices count=\"4\" attributes=\"3\">"));
        assert!(xml.contains("\n\t\t<Attribute name=\"TEXCOORD\" size=\"2\" type=\"FLOAT\"/>"));
        assert!(xml.contains(r#"<Triangles type="UNSIGNED_BYTE" groups="1">"#));
        assert!(xml.contains(r#"<Group name="default" count="2"/>"#));
        assert!(xml.trim_end().ends_with("</Mesh>"));
    }

    #[test]
    fn test_animation_document() {
        let desc = AnimationDescriptor {
            duration: 2.5,
            channels: vec![ChannelDesc {
                name: "Cube".into(),
                keyframes: 60,
                from: 0.0,
                to: 1.0,
                attributes: vec![AttributeDesc::new("POSITION", 3)],
            }],
        };
        let xml = animation_to_string(&desc).unwrap();

        assert!(xml.contains(r#"<Sampler duration="2.500000" channels="1">"#));
        assert!(xml.contains(r#"<Channel name="Cube" keyframes="60" attributes="1">"#));
        assert!(!xml.contains("from="));
    }

    #[test]
    fn test_scene_document() {
        let desc = SceneDescriptor::new(vec![
            ObjectDesc {
                name: "Big".into(),
                scale: Some(2.0),
                position: [1.0, 2.0, 3.0],
                orientation: [0.0, 0.0, 0.0],
            },
            ObjectDesc {
                name: "Plain".into(),
                scale: None,
                position: [0.0; 3],
                orientation: [0.5, 0.0, 0.0],
            },
        ]);
        let xml = scene_to_string(&desc).unwrap();

        assert!(xml.contains(r#"<World objects="2">"#));
        assert!(xml.contains(r#"<Object name="Big" scale="2.000000">"#));
        assert!(xml.contains(r#"<Object name="Plain">"#));
        assert!(xml.contains(r#"<Position x="1.000000" y="2.000000" z="3.000000"/>"#));
        assert!(xml.contains(r#"<Orientation x="0.500000" y="0.000000" z="0.000000"/>"#));
    }

    #[test]
    fn test_names_are_escaped() {
        let desc = SceneDescriptor::new(vec![ObjectDesc {
            name: "A<B>&\"C\"".into(),
            scale: None,
            position: [0.0; 3],
            orientation: [0.0; 3],
        }]);
        let xml = scene_to_string(&desc).unwrap();
        assert!(xml.contains("A&lt;B&gt;&amp;&quot;C&quot;"));
    }
}
