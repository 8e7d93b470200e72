//! Export configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file
//! (or no file at all) is a valid configuration.
//!
//! ```toml
//! output_dir = "/tmp/assets"
//! selected_only = true
//! export_scene = true
//! export_meshes = true
//! export_animations = true
//!
//! [logging]
//! level = "info"
//! show_target = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ResultExt};

/// Settings for one export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving `.mesh.*` and `.anim.*` files
    pub output_dir: PathBuf,
    /// Only export objects flagged as selected
    pub selected_only: bool,
    /// Write `<dir>.world.xml`
    pub export_scene: bool,
    /// Write `.mesh.xml` / `.mesh.dat` pairs
    pub export_meshes: bool,
    /// Write `.anim.xml` / `.anim.dat` pairs
    pub export_animations: bool,
    pub logging: LoggingConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            selected_only: true,
            export_scene: true,
            export_meshes: true,
            export_animations: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ExportConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::invalid_config("output_dir must not be empty"));
        }
        if !(self.export_scene || self.export_meshes || self.export_animations) {
            return Err(Error::invalid_config("nothing to export: scene, meshes and animations are all disabled"));
        }
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Show the target (module path) in log output
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn,assembly3d=info".to_string(),
            show_target: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ExportConfig::from_toml("").unwrap();
        assert!(config.selected_only);
        assert!(config.export_meshes);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = ExportConfig::from_toml(
            r#"
            output_dir = "/tmp/out"
            export_animations = false

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(!config.export_animations);
        assert!(config.export_scene);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_nothing_to_export_is_rejected() {
        let err = ExportConfig::from_toml(
            "export_scene = false\nexport_meshes = false\nexport_animations = false",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.toml");
        std::fs::write(&path, "selected_only = false").unwrap();

        let config = ExportConfig::from_file(&path).unwrap();
        assert!(!config.selected_only);

        let missing = ExportConfig::from_file(dir.path().join("missing.toml"));
        assert!(missing.unwrap_err().is_not_found());
    }
}
