//! Export orchestration: which objects go where, in what order

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use assembly3d_core::{Error, ExportConfig, Result, ResultExt, Transform};
use assembly3d_scene::{ObjectId, SceneObject, SceneSource};

use crate::animation::{AnimationSampler, SampledAnimation};
use crate::armature;
use crate::buffer::{animation_blob, mesh_blob};
use crate::descriptor::{
    AnimationDescriptor, MeshDescriptor, ObjectDesc, SceneDescriptor, write_animation_file,
    write_mesh_file, write_scene_file,
};
use crate::mesh::{GeometryConsolidator, IndexType};

/// Path of the scene document for an output directory
///
/// The document sits next to the directory: `out/` maps to `out.world.xml`.
pub fn world_descriptor_path(dir: &Path) -> PathBuf {
    let normalized: PathBuf = dir.components().collect();
    let mut path = normalized.into_os_string();
    path.push(".world.xml");
    PathBuf::from(path)
}

/// Object and action names become file stems and must stay inside the output directory
fn file_stem(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::export_failed(format!(
            "'{name}' cannot be used as an output file name"
        )));
    }
    Ok(name)
}

pub fn mesh_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{name}.mesh.xml")),
        dir.join(format!("{name}.mesh.dat")),
    )
}

pub fn animation_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{name}.anim.xml")),
        dir.join(format!("{name}.anim.dat")),
    )
}

fn exportable_meshes<S: SceneSource + ?Sized>(source: &S, ids: &[ObjectId]) -> Vec<ObjectId> {
    ids.iter()
        .copied()
        .filter(|&id| source.object(id).is_some_and(SceneObject::is_exportable_mesh))
        .collect()
}

/// Per-mesh export statistics
#[derive(Debug, Clone, Serialize)]
pub struct MeshSummary {
    pub name: String,
    pub vertices: usize,
    pub triangles: usize,
    pub groups: usize,
    pub index_type: IndexType,
    pub skipped_faces: usize,
}

/// Per-animation export statistics
#[derive(Debug, Clone, Serialize)]
pub struct AnimationSummary {
    pub name: String,
    pub object: String,
    pub keyframes: usize,
    pub attributes: Vec<String>,
}

/// What an export run wrote
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub files: Vec<PathBuf>,
    pub meshes: Vec<MeshSummary>,
    pub animations: Vec<AnimationSummary>,
    /// Animated objects that produced no output
    pub skipped_animations: Vec<String>,
    /// Faces dropped for having fewer than three corners, over all meshes
    pub skipped_faces: usize,
    /// Armatures found parenting any mesh in the scene
    pub armatures: usize,
}

/// Runs a full export of a scene into one directory
pub struct Exporter {
    config: ExportConfig,
    sampler: AnimationSampler,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            sampler: AnimationSampler::default(),
        }
    }

    pub fn with_sampler(mut self, sampler: AnimationSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the scene
    ///
    /// Writes the world document first, then each mesh pair, then each
    /// animation pair. The first I/O failure aborts the run; files written
    /// before it stay on disk.
    pub fn export<S: SceneSource + ?Sized>(&self, source: &mut S) -> Result<ExportReport> {
        self.config.validate()?;
        let dir = self.config.output_dir.as_path();
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let ids = source.object_ids(self.config.selected_only);
        let mesh_ids = exportable_meshes(&*source, &ids);

        tracing::info!(
            objects = ids.len(),
            meshes = mesh_ids.len(),
            dir = %dir.display(),
            "Starting export"
        );

        // the survey looks at every mesh in the scene, selected or not
        let all_meshes = exportable_meshes(&*source, &source.object_ids(false));
        let mut report = ExportReport {
            armatures: armature::survey(&*source, &all_meshes),
            ..ExportReport::default()
        };

        if self.config.export_scene {
            self.export_scene(&*source, &mesh_ids, &mut report)?;
        }

        if self.config.export_meshes {
            for &id in &mesh_ids {
                self.export_mesh(&*source, id, &mut report)?;
            }
        }

        if self.config.export_animations {
            self.export_animations(source, &ids, &mut report)?;
        }

        tracing::info!(files = report.files.len(), "Export finished");
        Ok(report)
    }

    fn export_scene<S: SceneSource + ?Sized>(
        &self,
        source: &S,
        mesh_ids: &[ObjectId],
        report: &mut ExportReport,
    ) -> Result<()> {
        let mut objects = Vec::with_capacity(mesh_ids.len());
        for &id in mesh_ids {
            let Some(object) = source.object(id) else {
                continue;
            };
            let transform = Transform::from_matrix(&source.world_transform(id)?);
            objects.push(ObjectDesc::from_transform(&object.name, &transform));
        }

        let path = world_descriptor_path(&self.config.output_dir);
        write_scene_file(&path, &SceneDescriptor::new(objects))?;
        tracing::info!(path = %path.display(), objects = mesh_ids.len(), "Wrote scene");
        report.files.push(path);
        Ok(())
    }

    fn export_mesh<S: SceneSource + ?Sized>(
        &self,
        source: &S,
        id: ObjectId,
        report: &mut ExportReport,
    ) -> Result<()> {
        let Some(object) = source.object(id) else {
            return Ok(());
        };
        let Some(mesh) = object.mesh() else {
            return Ok(());
        };

        let consolidated = GeometryConsolidator::consolidate(mesh)
            .with_context(|| format!("consolidating mesh '{}'", object.name))?;
        let descriptor = MeshDescriptor::from_mesh(&consolidated);
        let blob = mesh_blob(&consolidated);
        debug_assert_eq!(Some(blob.len()), descriptor.expected_blob_len().ok());

        let stem = file_stem(&object.name)?;
        let (xml_path, dat_path) = mesh_paths(&self.config.output_dir, stem);
        fs::write(&dat_path, &blob).with_context(|| format!("writing {}", dat_path.display()))?;
        write_mesh_file(&xml_path, &descriptor)?;

        tracing::info!(
            mesh = %object.name,
            vertices = descriptor.vertex_count,
            triangles = descriptor.triangle_count(),
            index_type = %descriptor.index_type,
            "Wrote mesh"
        );

        report.skipped_faces += consolidated.skipped_faces();
        report.meshes.push(MeshSummary {
            name: object.name.clone(),
            vertices: descriptor.vertex_count,
            triangles: descriptor.triangle_count(),
            groups: descriptor.groups.len(),
            index_type: descriptor.index_type,
            skipped_faces: consolidated.skipped_faces(),
        });
        report.files.push(xml_path);
        report.files.push(dat_path);
        Ok(())
    }

    fn export_animations<S: SceneSource + ?Sized>(
        &self,
        source: &mut S,
        ids: &[ObjectId],
        report: &mut ExportReport,
    ) -> Result<()> {
        let dir = self.config.output_dir.as_path();
        let mut written = Vec::new();

        let outcome = self.sampler.for_each_animation(source, ids, |animation| {
            let summary = write_animation(dir, &animation)?;
            written.push(summary);
            Ok(())
        })?;

        for (summary, files) in written {
            report.animations.push(summary);
            report.files.extend(files);
        }
        report.skipped_animations = outcome.skipped;
        Ok(())
    }
}

fn write_animation(dir: &Path, animation: &SampledAnimation) -> Result<(AnimationSummary, [PathBuf; 2])> {
    let descriptor = AnimationDescriptor::from_animation(animation);
    let blob = animation_blob(animation);
    debug_assert_eq!(Some(blob.len()), descriptor.expected_blob_len().ok());

    let (xml_path, dat_path) = animation_paths(dir, file_stem(&animation.name)?);
    fs::write(&dat_path, &blob).with_context(|| format!("writing {}", dat_path.display()))?;
    write_animation_file(&xml_path, &descriptor)?;

    let attributes: Vec<String> = animation
        .present_attributes()
        .iter()
        .map(|(attribute, _)| attribute.name().to_string())
        .collect();
    tracing::info!(
        animation = %animation.name,
        object = %animation.channel_name,
        keyframes = animation.frame_count(),
        attributes = ?attributes,
        "Wrote animation"
    );

    let summary = AnimationSummary {
        name: animation.name.clone(),
        object: animation.channel_name.clone(),
        keyframes: animation.frame_count(),
        attributes,
    };
    Ok((summary, [xml_path, dat_path]))
}
