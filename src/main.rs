//! Assembly3D CLI
//!
//! Command-line interface for exporting scenes to the Assembly3D format and
//! inspecting exported descriptors.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use assembly3d_core::{ExportConfig, logging};
use assembly3d_export::descriptor::{read_animation, read_mesh, read_scene};
use assembly3d_export::{AnimationAsset, DescriptorKind, ExportReport, Exporter, MeshAsset};
use assembly3d_scene::{MemoryScene, ObjectData, SceneSource};

/// Assembly3D - mesh, animation and scene exporter
#[derive(Parser)]
#[command(name = "assembly3d")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for structured data
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Export configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene to mesh, animation and world files
    Export(ExportArgs),

    /// Show the contents of a .mesh.xml, .anim.xml or .world.xml descriptor
    Inspect(InspectArgs),

    /// List the objects of a scene
    Info(InfoArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Scene file (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Output directory (overrides the config file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export every object, not just the selected ones
    #[arg(long)]
    all: bool,

    /// Do not write the world document
    #[arg(long)]
    no_scene: bool,

    /// Do not write meshes
    #[arg(long)]
    no_meshes: bool,

    /// Do not write animations
    #[arg(long)]
    no_animations: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Descriptor to inspect
    path: PathBuf,

    /// Also load the paired .dat blob and check it against the descriptor
    #[arg(long)]
    verify: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Scene file (JSON)
    #[arg(short, long)]
    scene: PathBuf,
}

fn load_config(path: Option<&Path>) -> Result<ExportConfig> {
    match path {
        Some(path) => ExportConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ExportConfig::default()),
    }
}

fn setup_logging(verbosity: u8, config: &mut ExportConfig) {
    let level = match verbosity {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };

    if let Some(level) = level {
        config.logging.level = level.to_string();
        config.logging.show_target = verbosity >= 2;
    }
    logging::init_with_config(&config.logging);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    setup_logging(cli.verbose, &mut config);

    match cli.command {
        Commands::Export(args) => cmd_export(args, config, cli.format),
        Commands::Inspect(args) => cmd_inspect(args, cli.format),
        Commands::Info(args) => cmd_info(args, cli.format),
    }
}

fn load_scene(path: &Path) -> Result<MemoryScene> {
    MemoryScene::from_json_file(path).with_context(|| format!("Failed to load scene {}", path.display()))
}

fn cmd_export(args: ExportArgs, mut config: ExportConfig, format: OutputFormat) -> Result<()> {
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if args.all {
        config.selected_only = false;
    }
    config.export_scene &= !args.no_scene;
    config.export_meshes &= !args.no_meshes;
    config.export_animations &= !args.no_animations;
    config.validate().context("Invalid export options")?;

    let mut scene = load_scene(&args.scene)?;
    info!("Exporting {:?} to {:?}", args.scene, config.output_dir);

    let exporter = Exporter::new(config);
    let report = logging::timed("export", || exporter.export(&mut scene)).context("Export failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &ExportReport) {
    println!("Exported {} file(s)", report.files.len());

    if !report.meshes.is_empty() {
        println!("\nMeshes:");
        for mesh in &report.meshes {
            println!(
                "  {:<24} {:>8} vertices {:>8} triangles  {} group(s)  {}",
                mesh.name, mesh.vertices, mesh.triangles, mesh.groups, mesh.index_type
            );
        }
    }

    if !report.animations.is_empty() {
        println!("\nAnimations:");
        for anim in &report.animations {
            println!(
                "  {:<24} {:>6} keyframes  [{}]  ({})",
                anim.name,
                anim.keyframes,
                anim.attributes.join(", "),
                anim.object
            );
        }
    }

    if !report.skipped_animations.is_empty() {
        println!("\nSkipped (no animated channel): {}", report.skipped_animations.join(", "));
    }
    if report.skipped_faces > 0 {
        println!("Skipped faces with fewer than 3 vertices: {}", report.skipped_faces);
    }
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let path = &args.path;
    if !path.exists() {
        bail!("File not found: {:?}", path);
    }

    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let kind = DescriptorKind::detect(&text).context("Not an Assembly3D descriptor")?;

    match kind {
        DescriptorKind::Mesh => {
            let desc = read_mesh(&text)?;
            if args.verify {
                MeshAsset::load(path).context("Blob does not match descriptor")?;
            }
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&desc)?),
                OutputFormat::Text => {
                    println!("Mesh: {:?}", path);
                    println!("  Vertices:   {}", desc.vertex_count);
                    for attribute in &desc.attributes {
                        println!("    {:<12} {} x FLOAT", attribute.name, attribute.size);
                    }
                    println!("  Triangles:  {} ({})", desc.triangle_count(), desc.index_type);
                    for group in &desc.groups {
                        println!("    {:<24} {}", group.name, group.count);
                    }
                    println!("  Blob size:  {}", format_size(desc.expected_blob_len()? as u64));
                }
            }
        }
        DescriptorKind::Animation => {
            let desc = read_animation(&text)?;
            if args.verify {
                AnimationAsset::load(path).context("Blob does not match descriptor")?;
            }
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&desc)?),
                OutputFormat::Text => {
                    println!("Animation: {:?}", path);
                    println!("  Duration:   {:.3}s", desc.duration);
                    for channel in &desc.channels {
                        let names: Vec<_> = channel.attributes.iter().map(|a| a.name.as_str()).collect();
                        println!(
                            "  Channel {:<16} {} keyframes [{}]",
                            channel.name,
                            channel.keyframes,
                            names.join(", ")
                        );
                    }
                    println!("  Blob size:  {}", format_size(desc.expected_blob_len()? as u64));
                }
            }
        }
        DescriptorKind::Scene => {
            let desc = read_scene(&text)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&desc)?),
                OutputFormat::Text => {
                    println!("Scene: {:?}", path);
                    for object in &desc.objects {
                        let [x, y, z] = object.position;
                        print!("  {:<24} at ({x:.3}, {y:.3}, {z:.3})", object.name);
                        match object.scale {
                            Some(scale) => println!(" scale {scale:.3}"),
                            None => println!(),
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn cmd_info(args: InfoArgs, format: OutputFormat) -> Result<()> {
    let scene = load_scene(&args.scene)?;
    let range = scene.frame_range();

    match format {
        OutputFormat::Json => {
            let objects: Vec<_> = scene
                .objects()
                .iter()
                .map(|o| {
                    serde_json::json!({
                        "name": o.name,
                        "kind": o.data.kind_name(),
                        "selected": o.selected,
                        "vertices": o.mesh().map(|m| m.vertex_count()),
                        "faces": o.mesh().map(|m| m.face_count()),
                        "animated": o.has_animation(),
                    })
                })
                .collect();
            let json = serde_json::json!({
                "path": args.scene,
                "frame_start": range.start,
                "frame_end": range.end,
                "fps": scene.fps(),
                "objects": objects,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Scene: {:?}", args.scene);
            println!("  Frames:  {}..={} @ {} fps", range.start, range.end, scene.fps());
            println!("  Objects: {}", scene.objects().len());
            for object in scene.objects() {
                let detail = match &object.data {
                    ObjectData::Mesh(mesh) => {
                        format!("{} vertices, {} faces", mesh.vertex_count(), mesh.face_count())
                    }
                    ObjectData::Armature(armature) => format!("{} bones", armature.bones.len()),
                    ObjectData::Empty => String::new(),
                };
                println!(
                    "  {} {:<24} {:<9} {}{}",
                    if object.selected { "*" } else { " " },
                    object.name,
                    object.data.kind_name(),
                    detail,
                    if object.has_animation() { " (animated)" } else { "" }
                );
            }
        }
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
