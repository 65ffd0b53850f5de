// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export settings and output path resolution.
//!
//! Settings live in `hyperprops.ron` next to the project file. A missing
//! file means defaults; an unsaved project exports into the user's
//! documents directory.

use crate::exporter::{ExportFormat, ImageFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "hyperprops.ron";

/// Error reading or writing settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File system error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed settings file
    #[error("Deserialization error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// File written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

fn default_image_format() -> ImageFormat {
    ImageFormat::WebP
}

fn default_individual_dir_name() -> String {
    "exported_glbs".to_string()
}

fn default_untitled_name() -> String {
    "untitled".to_string()
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Format version
    pub version: u32,
    /// Preferred image encoding; dropped automatically if the exporter rejects it
    #[serde(default = "default_image_format")]
    pub image_format: ImageFormat,
    /// Directory name for per-root exports
    #[serde(default = "default_individual_dir_name")]
    pub individual_dir_name: String,
    /// Output directory for unsaved projects; the documents directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_dir: Option<PathBuf>,
    /// File stem for unsaved projects
    #[serde(default = "default_untitled_name")]
    pub untitled_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            image_format: default_image_format(),
            individual_dir_name: default_individual_dir_name(),
            fallback_dir: None,
            untitled_name: default_untitled_name(),
        }
    }
}

impl ExportSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: ExportSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load the settings stored beside `project`, or defaults if there are none
    pub fn load_or_default(project: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(dir) = project.map(project_dir) else {
            return Ok(Self::default());
        };
        let path = Self::settings_path(&dir);
        if path.is_file() {
            tracing::debug!("Loading export settings from {:?}", path);
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings file path for a project directory
    pub fn settings_path(project_dir: &Path) -> PathBuf {
        project_dir.join(SETTINGS_FILE_NAME)
    }

    /// Directory used when the project has never been saved
    pub fn fallback_dir(&self) -> PathBuf {
        self.fallback_dir
            .clone()
            .or_else(dirs::document_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Output file of a whole-scene export
    pub fn batch_output_path(&self, project: Option<&Path>) -> PathBuf {
        let extension = ExportFormat::Glb.extension();
        match project {
            Some(path) => path.with_extension(extension),
            None => self
                .fallback_dir()
                .join(format!("{}.{extension}", self.untitled_name)),
        }
    }

    /// Directory receiving one file per root node
    pub fn individual_dir(&self, project: Option<&Path>) -> PathBuf {
        let base = match project {
            Some(path) => project_dir(path),
            None => self.fallback_dir(),
        };
        base.join(&self.individual_dir_name)
    }

    /// Output file for one root node inside `dir`
    pub fn root_output_path(dir: &Path, root_name: &str) -> PathBuf {
        let stem: String = root_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        dir.join(format!("{stem}.{}", ExportFormat::Glb.extension()))
    }
}

fn project_dir(project: &Path) -> PathBuf {
    project.parent().map(Path::to_path_buf).unwrap_or_default()
}
