//! End-to-end tests for the exporter
//!
//! These tests run full exports into temporary directories and check:
//! - Mesh descriptors against their blobs
//! - Deterministic output
//! - Index width selection as written to disk
//! - Animation channel suppression and inclusion
//! - The world document's scale shortcut
//! - Attribute order in animation blobs
//! - Restoration of the scene frame

use std::fs;
use std::path::{Path, PathBuf};

use assembly3d_core::ExportConfig;
use assembly3d_export::descriptor::{read_animation, read_mesh, read_scene};
use assembly3d_export::{AnimationAsset, Exporter, MeshAsset, world_descriptor_path};
use assembly3d_scene::{
    AnimationSource, ArmatureData, Bone, Keyframe, LocalTransform, MemoryScene, MeshData,
    MeshFace, MeshVertex, ObjectData, ParentKind, ParentLink, SceneObject, SceneSource,
};
use tempfile::TempDir;

/// Helper to build a config writing into `<tmp>/out`
fn config_for(tmp: &TempDir) -> ExportConfig {
    ExportConfig {
        output_dir: tmp.path().join("out"),
        ..ExportConfig::default()
    }
}

fn object(name: &str, data: ObjectData) -> SceneObject {
    SceneObject {
        name: name.to_string(),
        selected: true,
        data,
        transform: LocalTransform::default(),
        parent: None,
        animation: None,
    }
}

/// Unit quad in the XY plane, one smooth face
fn quad_mesh() -> MeshData {
    MeshData {
        vertices: vec![
            MeshVertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            MeshVertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            MeshVertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            MeshVertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ],
        faces: vec![MeshFace::new(vec![0, 1, 2, 3])],
        has_uv: false,
        materials: Vec::new(),
    }
}

/// A two-face strip with a UV seam on the shared edge
fn seamed_mesh() -> MeshData {
    MeshData {
        vertices: vec![
            MeshVertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            MeshVertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            MeshVertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            MeshVertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            MeshVertex::new([2.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ],
        faces: vec![
            MeshFace::new(vec![0, 1, 2, 3]).with_uvs(vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 1.0],
            ]),
            MeshFace::new(vec![1, 4, 2]).with_uvs(vec![[0.5, 0.0], [1.0, 0.0], [0.5, 1.0]]),
            MeshFace::new(vec![2, 3, 0]).flat().with_material(1).with_uvs(vec![
                [1.0, 1.0],
                [0.0, 1.0],
                [0.0, 0.0],
            ]),
        ],
        has_uv: true,
        materials: vec!["Paint".to_string(), "Decal".to_string()],
    }
}

fn animated(name: &str, action: Option<&str>, keys: Vec<(i32, LocalTransform)>) -> SceneObject {
    let mut object = object(name, ObjectData::Empty);
    object.animation = Some(AnimationSource {
        action: action.map(str::to_string),
        use_nla: false,
        keyframes: keys
            .into_iter()
            .map(|(frame, transform)| Keyframe { frame, transform })
            .collect(),
    });
    object
}

fn scaled(s: [f32; 3]) -> LocalTransform {
    LocalTransform {
        scale: s,
        ..LocalTransform::default()
    }
}

/// Little-endian vec3s starting at `offset` bytes into a blob
fn vec3s_at(blob: &[u8], offset: usize, count: usize) -> Vec<[f32; 3]> {
    blob[offset..offset + count * 12]
        .chunks_exact(12)
        .map(|c| {
            let f = |i: usize| f32::from_le_bytes([c[i], c[i + 1], c[i + 2], c[i + 3]]);
            [f(0), f(4), f(8)]
        })
        .collect()
}

fn assert_vec3_near(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

fn out(tmp: &TempDir, file: &str) -> PathBuf {
    tmp.path().join("out").join(file)
}

mod mesh_tests {
    use super::*;

    #[test]
    fn test_descriptor_matches_blob() {
        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![object("Strip", ObjectData::Mesh(seamed_mesh()))]);
        let report = Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        let desc = read_mesh(&read(out(&tmp, "Strip.mesh.xml"))).unwrap();
        let blob = fs::read(out(&tmp, "Strip.mesh.dat")).unwrap();
        assert_eq!(blob.len(), desc.expected_blob_len().unwrap());
        assert_eq!(report.meshes[0].vertices, desc.vertex_count);

        let asset = MeshAsset::load(out(&tmp, "Strip.mesh.xml")).unwrap();
        assert!(asset.texcoords.is_some());
        for group in &asset.groups {
            assert!(group.indices.iter().all(|&i| (i as usize) < desc.vertex_count));
        }
        assert_eq!(asset.groups.len(), 2);
        assert_eq!(asset.groups[0].name, "Paint");
        assert_eq!(asset.groups[1].name, "Decal");
    }

    #[test]
    fn test_seam_and_flat_clones() {
        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![object("Strip", ObjectData::Mesh(seamed_mesh()))]);
        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        let asset = MeshAsset::load(out(&tmp, "Strip.mesh.xml")).unwrap();
        // 5 base + 3 hard clones (flat face) + 2 uv clones (seam on 1 and 2)
        assert_eq!(asset.vertex_count(), 10);
        assert_eq!(asset.groups[0].indices, vec![0, 1, 2, 0, 2, 3, 8, 4, 9]);
        assert_eq!(asset.groups[1].indices, vec![5, 6, 7]);

        let texcoords = asset.texcoords.as_ref().unwrap();
        assert_eq!(texcoords[8], [0.5, 0.0]);
        assert_eq!(texcoords[9], [0.5, 1.0]);
    }

    #[test]
    fn test_quad_shares_base_slots() {
        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![object("Quad", ObjectData::Mesh(quad_mesh()))]);
        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        let xml = read(out(&tmp, "Quad.mesh.xml"));
        assert!(xml.contains(r#"<Vertices count="4" attributes="2">"#));
        assert!(!xml.contains("TEXCOORD"));
        assert!(xml.contains(r#"<Group name="default" count="2"/>"#));

        let asset = MeshAsset::load(out(&tmp, "Quad.mesh.xml")).unwrap();
        assert_eq!(asset.groups[0].indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_wide_index_type_on_disk() {
        let vertices = (0..256)
            .map(|i| MeshVertex::new([i as f32, 0.0, 0.0], [0.0, 0.0, 1.0]))
            .collect();
        let mesh = MeshData {
            vertices,
            faces: vec![MeshFace::new(vec![0, 128, 255])],
            has_uv: false,
            materials: Vec::new(),
        };

        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![object("Wide", ObjectData::Mesh(mesh))]);
        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        let desc = read_mesh(&read(out(&tmp, "Wide.mesh.xml"))).unwrap();
        assert_eq!(desc.index_type.name(), "UNSIGNED_SHORT");
        let blob = fs::read(out(&tmp, "Wide.mesh.dat")).unwrap();
        assert_eq!(blob.len(), 256 * 24 + 3 * 2);
        assert_eq!(&blob[256 * 24..], &[0, 0, 128, 0, 255, 0]);
    }

    #[test]
    fn test_export_is_deterministic() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        for tmp in [&first, &second] {
            let mut scene = MemoryScene::new(vec![object("Strip", ObjectData::Mesh(seamed_mesh()))]);
            Exporter::new(config_for(tmp)).export(&mut scene).unwrap();
        }

        for file in ["Strip.mesh.dat", "Strip.mesh.xml"] {
            assert_eq!(fs::read(out(&first, file)).unwrap(), fs::read(out(&second, file)).unwrap());
        }
    }

    #[test]
    fn test_short_faces_are_skipped() {
        let mut mesh = quad_mesh();
        mesh.faces.push(MeshFace::new(vec![0, 1]));

        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![object("Quad", ObjectData::Mesh(mesh))]);
        let report = Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        assert_eq!(report.skipped_faces, 1);
        assert_eq!(report.meshes[0].triangles, 2);
    }

    #[test]
    fn test_invalid_mesh_aborts() {
        let mut mesh = quad_mesh();
        mesh.faces.push(MeshFace::new(vec![0, 1, 7]));

        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![object("Broken", ObjectData::Mesh(mesh))]);
        let err = Exporter::new(config_for(&tmp)).export(&mut scene).unwrap_err();

        assert!(err.to_string().contains("Broken"));
        assert!(!out(&tmp, "Broken.mesh.dat").exists());
    }
}

mod scene_tests {
    use super::*;

    #[test]
    fn test_world_scale_shortcut() {
        let mut big = object("Big", ObjectData::Mesh(quad_mesh()));
        big.transform = LocalTransform {
            translation: [1.0, 2.0, 3.0],
            ..scaled([2.0, 2.0, 2.0])
        };
        let mut tall = object("Tall", ObjectData::Mesh(quad_mesh()));
        tall.transform = scaled([1.0, 2.0, 1.0]);
        let marker = object("Marker", ObjectData::Empty);

        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![big, tall, marker]);
        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        let world = world_descriptor_path(&tmp.path().join("out"));
        assert_eq!(world, tmp.path().join("out.world.xml"));

        let xml = read(&world);
        assert!(xml.contains(r#"<World objects="2">"#));
        assert!(xml.contains(r#"<Object name="Big" scale="2.000000">"#));
        assert!(xml.contains(r#"<Object name="Tall">"#));

        let desc = read_scene(&xml).unwrap();
        assert_eq!(desc.objects[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(desc.objects[1].scale, None);
        assert_eq!(desc.objects[1].orientation, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unselected_objects_are_ignored() {
        let mut hidden = object("Hidden", ObjectData::Mesh(quad_mesh()));
        hidden.selected = false;

        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![object("Shown", ObjectData::Mesh(quad_mesh())), hidden]);
        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();
        assert!(out(&tmp, "Shown.mesh.xml").exists());
        assert!(!out(&tmp, "Hidden.mesh.xml").exists());

        let all = TempDir::new().unwrap();
        let config = ExportConfig {
            selected_only: false,
            ..config_for(&all)
        };
        Exporter::new(config).export(&mut scene).unwrap();
        assert!(out(&all, "Hidden.mesh.xml").exists());
    }

    #[test]
    fn test_armature_survey_covers_unselected_meshes() {
        let rig = object(
            "Rig",
            ObjectData::Armature(ArmatureData {
                bones: vec![Bone {
                    name: "spine".to_string(),
                    parent: None,
                }],
            }),
        );
        let mut skinned = object("Body", ObjectData::Mesh(quad_mesh()));
        skinned.selected = false;
        skinned.parent = Some(ParentLink {
            object: "Rig".to_string(),
            kind: ParentKind::Bone("spine".to_string()),
        });

        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![rig, skinned, object("Prop", ObjectData::Mesh(quad_mesh()))]);
        let report = Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        assert_eq!(report.armatures, 1);
        assert_eq!(report.meshes.len(), 1);
        assert!(!out(&tmp, "Body.mesh.xml").exists());
    }

    #[test]
    fn test_output_dir_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("out");
        fs::write(&blocker, b"not a directory").unwrap();

        let mut scene = MemoryScene::new(vec![object("Quad", ObjectData::Mesh(quad_mesh()))]);
        assert!(Exporter::new(config_for(&tmp)).export(&mut scene).is_err());
    }
}

mod animation_tests {
    use super::*;

    #[test]
    fn test_static_animation_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![animated(
            "Idle",
            Some("Rest"),
            vec![(1, LocalTransform::default()), (10, LocalTransform::default())],
        )])
        .with_frame_range(1, 10);

        let report = Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        assert!(report.animations.is_empty());
        assert_eq!(report.skipped_animations, vec!["Idle".to_string()]);
        assert!(!out(&tmp, "Rest.anim.xml").exists());
        assert!(!out(&tmp, "Rest.anim.dat").exists());
    }

    #[test]
    fn test_scale_only_animation() {
        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![animated(
            "Balloon",
            Some("Grow"),
            vec![(1, scaled([2.0, 2.0, 2.0])), (10, scaled([2.0, 2.0, 2.0]))],
        )])
        .with_frame_range(1, 10);

        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        let xml = read(out(&tmp, "Grow.anim.xml"));
        assert_eq!(xml.matches("<Attribute ").count(), 1);
        assert!(xml.contains(r#"<Attribute name="SCALING" size="3" type="FLOAT"/>"#));
        assert!(xml.contains(r#"<Channel name="Balloon" keyframes="10" attributes="1">"#));

        let blob = fs::read(out(&tmp, "Grow.anim.dat")).unwrap();
        assert_eq!(blob.len(), 3 * 4 * 10);

        let asset = AnimationAsset::load(out(&tmp, "Grow.anim.xml")).unwrap();
        let scales = asset.channels[0].scales.as_ref().unwrap();
        assert!(scales.iter().all(|s| (s[0] - 2.0).abs() < 1e-5));
    }

    #[test]
    fn test_translation_and_duration() {
        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![animated(
            "Cube",
            None,
            vec![
                (1, LocalTransform::default()),
                (
                    25,
                    LocalTransform {
                        translation: [0.0, 0.0, 4.0],
                        ..LocalTransform::default()
                    },
                ),
            ],
        )])
        .with_frame_range(1, 25)
        .with_fps(25.0);
        if let Some(anim) = scene.objects[0].animation.as_mut() {
            anim.use_nla = true;
        }

        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        let desc = read_animation(&read(out(&tmp, "Cube.anim.xml"))).unwrap();
        assert!((desc.duration - 1.0).abs() < 1e-6);
        let channel = &desc.channels[0];
        assert_eq!(channel.keyframes, 25);
        assert!(channel.attribute("POSITION").is_some());
        assert!(channel.attribute("ORIENTATION").is_none());

        let asset = AnimationAsset::load(out(&tmp, "Cube.anim.xml")).unwrap();
        let translations = asset.channels[0].translations.as_ref().unwrap();
        assert_eq!(translations[0], [0.0, 0.0, 0.0]);
        assert_eq!(translations[24], [0.0, 0.0, 4.0]);
    }

    #[test]
    fn test_all_channels_in_blob_order() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let end = LocalTransform {
            translation: [2.0, 0.0, 0.0],
            rotation: [0.0, 0.0, half, half],
            scale: [3.0, 3.0, 3.0],
        };

        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![animated(
            "Spinner",
            Some("Spin"),
            vec![(1, LocalTransform::default()), (3, end)],
        )])
        .with_frame_range(1, 3);

        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();

        let xml = read(out(&tmp, "Spin.anim.xml"));
        assert!(xml.contains(r#"<Channel name="Spinner" keyframes="3" attributes="3">"#));
        let position = xml.find(r#"name="POSITION""#).unwrap();
        let orientation = xml.find(r#"name="ORIENTATION""#).unwrap();
        let scaling = xml.find(r#"name="SCALING""#).unwrap();
        assert!(position < orientation && orientation < scaling);

        const N: usize = 3;
        let blob = fs::read(out(&tmp, "Spin.anim.dat")).unwrap();
        assert_eq!(blob.len(), 36 * N);

        let translations = vec3s_at(&blob, 0, N);
        let rotations = vec3s_at(&blob, 12 * N, N);
        let scales = vec3s_at(&blob, 24 * N, N);

        assert_vec3_near(translations[0], [0.0, 0.0, 0.0]);
        assert_vec3_near(translations[1], [1.0, 0.0, 0.0]);
        assert_vec3_near(translations[2], [2.0, 0.0, 0.0]);

        // vector part only: w is dropped
        let eighth = (std::f32::consts::PI / 8.0).sin();
        assert_vec3_near(rotations[0], [0.0, 0.0, 0.0]);
        assert_vec3_near(rotations[1], [0.0, 0.0, eighth]);
        assert_vec3_near(rotations[2], [0.0, 0.0, half]);

        assert_vec3_near(scales[0], [1.0, 1.0, 1.0]);
        assert_vec3_near(scales[1], [2.0, 2.0, 2.0]);
        assert_vec3_near(scales[2], [3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_frame_is_restored() {
        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(vec![
            animated("Idle", Some("Rest"), vec![(1, LocalTransform::default())]),
            animated("Balloon", Some("Grow"), vec![(1, scaled([1.0; 3])), (5, scaled([3.0; 3]))]),
        ])
        .with_frame_range(1, 5)
        .with_current_frame(3);

        Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();
        assert_eq!(scene.current_frame(), 3);
    }

    #[test]
    fn test_frame_is_restored_for_empty_scene() {
        let tmp = TempDir::new().unwrap();
        let mut scene = MemoryScene::new(Vec::new()).with_current_frame(42);

        let report = Exporter::new(config_for(&tmp)).export(&mut scene).unwrap();
        assert_eq!(scene.current_frame(), 42);
        assert!(report.meshes.is_empty());
        assert!(report.animations.is_empty());
    }
}
