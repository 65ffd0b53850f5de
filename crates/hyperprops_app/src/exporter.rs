// SPDX-License-Identifier: MIT OR Apache-2.0
//! Exporter collaborator.
//!
//! The interchange encoder itself lives outside this crate; the pipeline
//! only needs a single blocking call that either succeeds or tells apart an
//! unsupported option from any other failure.

use crate::state::{EntityId, NodeKind, SceneData, Selection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the exporter option selecting the image format
pub const IMAGE_FORMAT_OPTION: &str = "export_image_format";

/// Interchange container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Binary glTF
    #[default]
    Glb,
}

impl ExportFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Glb => "glb",
        }
    }

    /// Exporter option value
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Glb => "GLB",
        }
    }
}

/// Image encoding for embedded textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Lossy web-friendly encoding
    WebP,
    /// JPEG
    Jpeg,
    /// PNG
    Png,
}

impl ImageFormat {
    /// Exporter option value
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::WebP => "WEBP",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
        }
    }
}

/// One exporter invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// Output file
    pub output_path: PathBuf,
    /// Container format
    pub format: ExportFormat,
    /// Image encoding; `None` leaves the exporter's default
    pub image_format: Option<ImageFormat>,
    /// Embed custom attributes as extras
    pub export_extras: bool,
    /// Bake modifiers into exported geometry
    pub apply_modifiers: bool,
    /// Export only the selection instead of the whole scene
    pub use_selection: bool,
    /// Export only visible nodes
    pub use_visible: bool,
}

impl ExportRequest {
    /// GLB export of the whole visible scene with extras and baked modifiers
    pub fn glb(output_path: impl Into<PathBuf>, image_format: Option<ImageFormat>) -> Self {
        Self {
            output_path: output_path.into(),
            format: ExportFormat::Glb,
            image_format,
            export_extras: true,
            apply_modifiers: true,
            use_selection: false,
            use_visible: true,
        }
    }

    /// Restrict the export to the selection
    pub fn selection_only(mut self) -> Self {
        self.use_selection = true;
        self
    }

    /// Same request without an explicit image format
    pub fn without_image_format(&self) -> Self {
        Self {
            image_format: None,
            ..self.clone()
        }
    }

    /// Nodes this request covers
    pub fn nodes(&self, scene: &SceneData, selection: &Selection) -> Vec<EntityId> {
        scene
            .entities
            .iter()
            .filter(|(id, data)| {
                (!self.use_visible || data.visible) && (!self.use_selection || selection.contains(id))
            })
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Exporter failure
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// An option value is not available in this exporter build
    #[error("Option {option} does not accept \"{value}\"")]
    UnsupportedOption {
        /// Option name
        option: String,
        /// Rejected value
        value: String,
    },

    /// Any other failure
    #[error("Export failed: {0}")]
    Failed(String),

    /// File system error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Whether this rejects a value of the named option
    pub fn is_unsupported(&self, option: &str) -> bool {
        matches!(self, ExporterError::UnsupportedOption { option: o, .. } if o == option)
    }
}

/// Writes a scene (or part of it) to an interchange file
pub trait Exporter {
    /// Run one blocking export
    fn export(
        &mut self,
        scene: &SceneData,
        selection: &Selection,
        request: &ExportRequest,
    ) -> Result<(), ExporterError>;
}

/// Exporter that writes a JSON manifest of what would be encoded, next to
/// the requested output (`<output>.json`).
#[derive(Debug, Clone)]
pub struct ManifestExporter {
    /// Image formats this exporter accepts
    pub supported_images: Vec<ImageFormat>,
}

impl Default for ManifestExporter {
    fn default() -> Self {
        Self {
            supported_images: vec![ImageFormat::WebP, ImageFormat::Jpeg, ImageFormat::Png],
        }
    }
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    format: &'static str,
    image_format: Option<&'static str>,
    apply_modifiers: bool,
    nodes: Vec<ManifestNode<'a>>,
}

#[derive(Debug, Serialize)]
struct ManifestNode<'a> {
    name: &'a str,
    kind: NodeKind,
    parent: Option<&'a str>,
    translation: [f32; 3],
    rotation: [f32; 3],
    scale: [f32; 3],
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    extras: serde_json::Map<String, serde_json::Value>,
    materials: Vec<ManifestMaterial<'a>>,
}

#[derive(Debug, Serialize)]
struct ManifestMaterial<'a> {
    name: &'a str,
    nodes: usize,
    links: usize,
    textures: Vec<&'a str>,
}

impl ManifestExporter {
    /// Path the manifest for `output` is written to
    pub fn manifest_path(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }

    fn manifest<'a>(scene: &'a SceneData, selection: &Selection, request: &ExportRequest) -> Manifest<'a> {
        let nodes = request
            .nodes(scene, selection)
            .into_iter()
            .filter_map(|id| scene.get(&id).map(|data| (id, data)))
            .map(|(id, data)| ManifestNode {
                name: &data.name,
                kind: data.kind,
                parent: data.parent.and_then(|p| scene.get(&p)).map(|p| p.name.as_str()),
                translation: data.transform.position,
                rotation: data.transform.rotation,
                scale: data.transform.scale,
                extras: if request.export_extras {
                    data.attributes
                        .iter()
                        .map(|(k, v)| (k.as_str().to_string(), v.to_json()))
                        .collect()
                } else {
                    serde_json::Map::new()
                },
                materials: scene
                    .materials_of(&id)
                    .into_iter()
                    .map(|m| ManifestMaterial {
                        name: &m.name,
                        nodes: m.graph.node_count(),
                        links: m.graph.link_count(),
                        textures: m
                            .graph
                            .nodes_of_type(hyperprops_graph::shader::TEX_IMAGE)
                            .map(|n| n.label.as_str())
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Manifest {
            format: request.format.as_str(),
            image_format: request.image_format.map(|f| f.as_str()),
            apply_modifiers: request.apply_modifiers,
            nodes,
        }
    }
}

impl Exporter for ManifestExporter {
    fn export(
        &mut self,
        scene: &SceneData,
        selection: &Selection,
        request: &ExportRequest,
    ) -> Result<(), ExporterError> {
        if let Some(format) = request.image_format {
            if !self.supported_images.contains(&format) {
                return Err(ExporterError::UnsupportedOption {
                    option: IMAGE_FORMAT_OPTION.to_string(),
                    value: format.as_str().to_string(),
                });
            }
        }

        let manifest = Self::manifest(scene, selection, request);
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| ExporterError::Failed(e.to_string()))?;
        let path = Self::manifest_path(&request.output_path);
        std::fs::write(&path, json)?;
        tracing::debug!("Wrote {} node(s) to {:?}", manifest.nodes.len(), path);
        Ok(())
    }
}
