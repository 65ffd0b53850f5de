// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export orchestration.
//!
//! Two entry points drive the exporter:
//! - [`ExportOrchestrator::export_all`] writes the whole visible scene to one
//!   file, with every visible splatmap node swapped for its export clone.
//! - [`ExportOrchestrator::export_individual`] writes one file per visible
//!   root node, each centred at the origin.
//!
//! Whatever happens, the scene comes back as it was: clones are removed,
//! originals un-hidden, root translations restored, and the selection and
//! active node put back.

use crate::clone::{CloneError, CloneScope};
use crate::exporter::{ExportRequest, Exporter, ExporterError, IMAGE_FORMAT_OPTION};
use crate::settings::ExportSettings;
use crate::state::{EntityId, SceneContext, SceneData, Selection, SelectionGuard};
use crate::tags::is_splatmap;
use hyperprops_graph::{SplatmapTransformer, TransformError, ValidationError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Export failure
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A splatmap node cannot be converted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Export graph could not be built
    #[error(transparent)]
    Transform(TransformError),

    /// Node disappeared during export
    #[error("Node not found: {0:?}")]
    NodeNotFound(EntityId),

    /// Exporter failed
    #[error(transparent)]
    Exporter(#[from] ExporterError),

    /// Output location could not be prepared
    #[error("Failed to prepare output directory: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CloneError> for ExportError {
    fn from(err: CloneError) -> Self {
        match err {
            CloneError::NodeNotFound(id) => ExportError::NodeNotFound(id),
            CloneError::Validation(err) => ExportError::Validation(err),
            CloneError::Transform(err) => ExportError::Transform(err),
        }
    }
}

/// Outcome of a whole-scene export
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// File written
    pub output_path: PathBuf,
    /// Number of splatmap nodes exported through clones
    pub converted: usize,
    /// Whether the image format had to be left to the exporter
    pub image_format_dropped: bool,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exported scene to {} ({} splatmap objects converted)",
            self.output_path.display(),
            self.converted
        )
    }
}

/// A root whose export was abandoned
#[derive(Debug, Clone, PartialEq)]
pub struct RootFailure {
    /// Root node name
    pub root: String,
    /// Why it failed
    pub error: ValidationError,
}

/// Outcome of a per-root export
#[derive(Debug, Clone, PartialEq)]
pub struct IndividualReport {
    /// Output directory
    pub dir: PathBuf,
    /// Files written, in root order
    pub exported: Vec<PathBuf>,
    /// Roots skipped because they are hidden
    pub skipped_hidden: usize,
    /// Roots that failed validation
    pub failures: Vec<RootFailure>,
    /// Whether the image format had to be left to the exporter
    pub image_format_dropped: bool,
}

impl IndividualReport {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            exported: Vec::new(),
            skipped_hidden: 0,
            failures: Vec::new(),
            image_format_dropped: false,
        }
    }
}

impl fmt::Display for IndividualReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exported {} objects to {} (Skipped {} hidden root objects)",
            self.exported.len(),
            self.dir.display(),
            self.skipped_hidden
        )?;
        if !self.failures.is_empty() {
            write!(f, ", {} failed", self.failures.len())?;
        }
        Ok(())
    }
}

/// Drives splatmap conversion and the exporter
#[derive(Debug, Clone, Default)]
pub struct ExportOrchestrator {
    settings: ExportSettings,
    transformer: SplatmapTransformer,
}

impl ExportOrchestrator {
    /// Create an orchestrator with the stock shader registry
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            settings,
            transformer: SplatmapTransformer::new(),
        }
    }

    /// Use a specific transformer
    pub fn with_transformer(mut self, transformer: SplatmapTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    /// Export the whole visible scene to one file.
    ///
    /// Any splatmap node that fails validation aborts the export before the
    /// exporter runs.
    pub fn export_all(
        &self,
        ctx: &mut SceneContext,
        exporter: &mut dyn Exporter,
    ) -> Result<BatchReport, ExportError> {
        let output_path = self.settings.batch_output_path(ctx.project_path.as_deref());
        let targets: Vec<EntityId> = ctx
            .scene
            .entities
            .iter()
            .filter(|(_, data)| data.visible && is_splatmap(data))
            .map(|(id, _)| *id)
            .collect();

        let SceneContext {
            scene, selection, ..
        } = ctx;
        let mut scope = CloneScope::new(scene, &self.transformer);
        for id in targets {
            scope.begin(id)?;
        }

        let request = ExportRequest::glb(&output_path, Some(self.settings.image_format));
        let image_format_dropped = run_exporter(exporter, scope.scene(), selection, &request)?;

        let report = BatchReport {
            output_path,
            converted: scope.len(),
            image_format_dropped,
        };
        tracing::info!("{}", report);
        Ok(report)
    }

    /// Export each visible root node and its descendants to its own file.
    ///
    /// A root that fails validation is reported and skipped; exporter
    /// failures stop the run.
    pub fn export_individual(
        &self,
        ctx: &mut SceneContext,
        exporter: &mut dyn Exporter,
    ) -> Result<IndividualReport, ExportError> {
        let dir = self.settings.individual_dir(ctx.project_path.as_deref());
        std::fs::create_dir_all(&dir)?;

        let roots = ctx.scene.root_entities();
        let mut report = IndividualReport::new(dir);
        let mut guard = SelectionGuard::new(ctx);

        for root in roots {
            let Some(data) = guard.scene.get(&root) else {
                continue;
            };
            if !data.visible {
                report.skipped_hidden += 1;
                continue;
            }

            let name = data.name.clone();
            let path = ExportSettings::root_output_path(&report.dir, &name);
            match self.export_root(&mut guard, root, &path, exporter) {
                Ok(dropped) => {
                    report.image_format_dropped |= dropped;
                    report.exported.push(path);
                }
                Err(ExportError::Validation(error)) => {
                    tracing::warn!("Skipping '{}': {}", name, error);
                    report.failures.push(RootFailure { root: name, error });
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!("{}", report);
        Ok(report)
    }

    /// Export one root from the origin, putting its translation back afterwards
    fn export_root(
        &self,
        ctx: &mut SceneContext,
        root: EntityId,
        path: &Path,
        exporter: &mut dyn Exporter,
    ) -> Result<bool, ExportError> {
        ctx.selection.clear();
        let node = ctx.scene.get_mut(&root).ok_or(ExportError::NodeNotFound(root))?;
        let position = std::mem::take(&mut node.transform.position);

        let result = self.export_selection(ctx, root, path, exporter);

        if let Some(node) = ctx.scene.get_mut(&root) {
            node.transform.position = position;
        }
        ctx.selection.clear();
        result
    }

    fn export_selection(
        &self,
        ctx: &mut SceneContext,
        root: EntityId,
        path: &Path,
        exporter: &mut dyn Exporter,
    ) -> Result<bool, ExportError> {
        ctx.select_hierarchy(root);
        ctx.active = Some(root);

        let SceneContext {
            scene, selection, ..
        } = ctx;
        let targets: Vec<EntityId> = selection
            .iter()
            .copied()
            .filter(|id| scene.get(id).is_some_and(|data| data.visible && is_splatmap(data)))
            .collect();

        let mut scope = CloneScope::new(scene, &self.transformer);
        for id in targets {
            let clone = scope.begin(id)?.clone;
            selection.remove(&id);
            selection.add(clone);
        }

        let request =
            ExportRequest::glb(path, Some(self.settings.image_format)).selection_only();
        Ok(run_exporter(exporter, scope.scene(), selection, &request)?)
    }
}

/// Run the exporter, retrying once without an image format if the exporter
/// does not support the requested one. Returns whether the retry happened.
fn run_exporter(
    exporter: &mut dyn Exporter,
    scene: &SceneData,
    selection: &Selection,
    request: &ExportRequest,
) -> Result<bool, ExporterError> {
    match exporter.export(scene, selection, request) {
        Ok(()) => Ok(false),
        Err(err) if request.image_format.is_some() && err.is_unsupported(IMAGE_FORMAT_OPTION) => {
            tracing::warn!("{}; exporting with the default image format", err);
            exporter.export(scene, selection, &request.without_image_format())?;
            Ok(true)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttrKey, AttrValue};
    use crate::exporter::ImageFormat;
    use crate::state::EntityData;
    use hyperprops_graph::shader::{self, socket};
    use hyperprops_graph::{Graph, Material, NodeRegistry, PortValue, SplatLabel};

    /// What the exporter saw on one call
    #[derive(Debug)]
    struct Call {
        request: ExportRequest,
        nodes: Vec<String>,
        positions: Vec<[f32; 3]>,
        materials: Vec<String>,
    }

    /// Records calls; optionally rejects image formats or fails outright
    #[derive(Default)]
    struct RecordingExporter {
        calls: Vec<Call>,
        reject_images: bool,
        fail: bool,
    }

    impl Exporter for RecordingExporter {
        fn export(
            &mut self,
            scene: &SceneData,
            selection: &Selection,
            request: &ExportRequest,
        ) -> Result<(), ExporterError> {
            let ids = request.nodes(scene, selection);
            self.calls.push(Call {
                request: request.clone(),
                nodes: ids.iter().map(|id| scene.get(id).unwrap().name.clone()).collect(),
                positions: ids.iter().map(|id| scene.get(id).unwrap().transform.position).collect(),
                materials: ids
                    .iter()
                    .flat_map(|id| scene.materials_of(id))
                    .map(|m| m.name.clone())
                    .collect(),
            });
            if self.fail {
                return Err(ExporterError::Failed("disk full".to_string()));
            }
            match request.image_format {
                Some(format) if self.reject_images => Err(ExporterError::UnsupportedOption {
                    option: IMAGE_FORMAT_OPTION.to_string(),
                    value: format.as_str().to_string(),
                }),
                _ => Ok(()),
            }
        }
    }

    fn splat_material(name: &str) -> Material {
        let registry = shader::create_shader_registry();
        let mut graph = Graph::new(name);
        let mut mapping = registry.create_node(shader::MAPPING).unwrap();
        mapping.set_input_default(socket::SCALE, PortValue::Vector3([2.0, 2.0, 2.0]));
        let mapping = graph.add_node(mapping);
        let splat = graph.add_node(
            registry
                .create_node(shader::TEX_IMAGE)
                .unwrap()
                .with_label(SplatLabel::Splat.as_str()),
        );
        graph.connect_named(mapping, socket::VECTOR, splat, socket::VECTOR).unwrap();
        Material::with_graph(name, graph)
    }

    fn mark_splatmap(scene: &mut SceneData, id: EntityId) {
        scene
            .get_mut(&id)
            .unwrap()
            .attributes
            .set(AttrKey::Splatmap, AttrValue::Bool(true));
    }

    struct Fixture {
        ctx: SceneContext,
        dir: PathBuf,
        forest: EntityId,
        ground: EntityId,
        ruins: EntityId,
        broken: EntityId,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    /// Two roots: `Forest` with a valid splatmap child, `Ruins` with one that
    /// has two materials
    fn fixture() -> Fixture {
        let mut scene = SceneData::new();
        let forest = scene.add_entity(EntityData {
            transform: crate::state::Transform {
                position: [5.0, 0.0, -3.0],
                ..Default::default()
            },
            ..EntityData::new("Forest")
        });
        let ground = scene.add_mesh_object("Ground", Some(forest), vec![splat_material("Terrain")]);
        mark_splatmap(&mut scene, ground);
        scene.add_mesh_object("Tree", Some(forest), vec![Material::new("Bark")]);

        let ruins = scene.add_entity(EntityData::new("Ruins"));
        let broken = scene.add_mesh_object(
            "Floor",
            Some(ruins),
            vec![splat_material("Stone"), splat_material("Moss")],
        );
        mark_splatmap(&mut scene, broken);

        let dir = std::env::temp_dir().join(format!("hyperprops-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut ctx = SceneContext::new(scene);
        ctx.project_path = Some(dir.join("level.ron"));
        ctx.selection.add(ground);
        ctx.active = Some(ground);

        Fixture {
            ctx,
            dir,
            forest,
            ground,
            ruins,
            broken,
        }
    }

    #[test]
    fn test_export_all_uses_clones() {
        let mut fx = fixture();
        fx.ctx.scene.remove(&fx.ruins);
        fx.ctx.scene.remove(&fx.broken);
        let before = fx.ctx.scene.clone();
        let mut exporter = RecordingExporter::default();

        let report = ExportOrchestrator::default()
            .export_all(&mut fx.ctx, &mut exporter)
            .unwrap();

        assert_eq!(report.output_path, fx.dir.join("level.glb"));
        assert_eq!(report.converted, 1);
        assert!(!report.image_format_dropped);
        assert_eq!(exporter.calls.len(), 1);

        let call = &exporter.calls[0];
        assert_eq!(call.request.image_format, Some(ImageFormat::WebP));
        assert!(!call.request.use_selection);
        assert!(call.request.use_visible);
        assert!(call.request.export_extras);
        assert_eq!(call.nodes, vec!["Forest", "Tree", "Ground_splatmap_clone"]);
        assert!(call.materials.contains(&"Terrain_splatmap_converted".to_string()));
        assert!(!call.materials.contains(&"Terrain".to_string()));

        assert_eq!(fx.ctx.scene, before);
        assert_eq!(fx.ctx.selection.entities, vec![fx.ground]);
    }

    #[test]
    fn test_export_all_aborts_on_invalid_splatmap() {
        let mut fx = fixture();
        let before = fx.ctx.scene.clone();
        let mut exporter = RecordingExporter::default();

        let result = ExportOrchestrator::default().export_all(&mut fx.ctx, &mut exporter);

        assert!(matches!(
            result,
            Err(ExportError::Validation(ValidationError::MultipleMaterials { count: 2, .. }))
        ));
        assert!(exporter.calls.is_empty());
        assert_eq!(fx.ctx.scene, before);
        assert!(fx.ctx.scene.find_by_name("Ground_splatmap_clone").is_none());
    }

    #[test]
    fn test_export_all_retries_without_image_format() {
        let mut fx = fixture();
        fx.ctx.scene.remove(&fx.broken);
        let before = fx.ctx.scene.clone();
        let mut exporter = RecordingExporter {
            reject_images: true,
            ..Default::default()
        };

        let report = ExportOrchestrator::default()
            .export_all(&mut fx.ctx, &mut exporter)
            .unwrap();

        assert!(report.image_format_dropped);
        assert_eq!(exporter.calls.len(), 2);
        assert_eq!(exporter.calls[1].request.image_format, None);
        assert_eq!(fx.ctx.scene, before);
    }

    #[test]
    fn test_export_all_failure_restores_scene() {
        let mut fx = fixture();
        fx.ctx.scene.remove(&fx.broken);
        let before = fx.ctx.scene.clone();
        let mut exporter = RecordingExporter {
            fail: true,
            ..Default::default()
        };

        let result = ExportOrchestrator::default().export_all(&mut fx.ctx, &mut exporter);

        assert!(matches!(result, Err(ExportError::Exporter(ExporterError::Failed(_)))));
        assert_eq!(exporter.calls.len(), 1);
        assert_eq!(fx.ctx.scene, before);
    }

    #[test]
    fn test_export_all_unsaved_project_uses_fallback() {
        let mut fx = fixture();
        fx.ctx.scene.remove(&fx.broken);
        fx.ctx.project_path = None;
        let settings = ExportSettings {
            fallback_dir: Some(fx.dir.clone()),
            ..Default::default()
        };

        let report = ExportOrchestrator::new(settings)
            .export_all(&mut fx.ctx, &mut RecordingExporter::default())
            .unwrap();
        assert_eq!(report.output_path, fx.dir.join("untitled.glb"));
    }

    #[test]
    fn test_export_individual_isolates_failing_root() {
        let mut fx = fixture();
        let before = fx.ctx.scene.clone();
        let mut exporter = RecordingExporter::default();

        let report = ExportOrchestrator::default()
            .export_individual(&mut fx.ctx, &mut exporter)
            .unwrap();

        let dir = fx.dir.join("exported_glbs");
        assert!(dir.is_dir());
        assert_eq!(report.exported, vec![dir.join("Forest.glb")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].root, "Ruins");
        assert_eq!(report.skipped_hidden, 0);

        assert_eq!(exporter.calls.len(), 1);
        let call = &exporter.calls[0];
        assert_eq!(call.request.output_path, dir.join("Forest.glb"));
        assert!(call.request.use_selection);
        assert_eq!(call.nodes, vec!["Forest", "Tree", "Ground_splatmap_clone"]);
        assert_eq!(call.positions[0], [0.0, 0.0, 0.0]);

        assert_eq!(fx.ctx.scene, before);
        assert_eq!(fx.ctx.scene.get(&fx.forest).unwrap().transform.position, [5.0, 0.0, -3.0]);
        assert_eq!(fx.ctx.selection.entities, vec![fx.ground]);
        assert_eq!(fx.ctx.active, Some(fx.ground));
    }

    #[test]
    fn test_export_individual_skips_hidden_roots() {
        let mut fx = fixture();
        fx.ctx.scene.get_mut(&fx.ruins).unwrap().visible = false;
        let hidden = fx.ctx.scene.add_entity(EntityData {
            visible: false,
            ..EntityData::new("Camera")
        });
        let mut exporter = RecordingExporter::default();

        let report = ExportOrchestrator::default()
            .export_individual(&mut fx.ctx, &mut exporter)
            .unwrap();

        assert!(fx.ctx.scene.get(&hidden).is_some());
        assert_eq!(report.exported.len(), 1);
        assert_eq!(report.skipped_hidden, 2);
        assert!(report.failures.is_empty());
        assert_eq!(
            report.to_string(),
            format!(
                "Exported 1 objects to {} (Skipped 2 hidden root objects)",
                fx.dir.join("exported_glbs").display()
            )
        );
    }

    #[test]
    fn test_export_individual_retries_per_root() {
        let mut fx = fixture();
        fx.ctx.scene.remove(&fx.broken);
        let mut exporter = RecordingExporter {
            reject_images: true,
            ..Default::default()
        };

        let report = ExportOrchestrator::default()
            .export_individual(&mut fx.ctx, &mut exporter)
            .unwrap();

        assert!(report.image_format_dropped);
        assert_eq!(report.exported.len(), 2);
        let formats: Vec<_> = exporter.calls.iter().map(|c| c.request.image_format).collect();
        assert_eq!(
            formats,
            vec![Some(ImageFormat::WebP), None, Some(ImageFormat::WebP), None]
        );
    }

    #[test]
    fn test_export_individual_failure_restores_everything() {
        let mut fx = fixture();
        let before = fx.ctx.scene.clone();
        let mut exporter = RecordingExporter {
            fail: true,
            ..Default::default()
        };

        let result = ExportOrchestrator::default().export_individual(&mut fx.ctx, &mut exporter);

        assert!(matches!(result, Err(ExportError::Exporter(_))));
        assert_eq!(exporter.calls.len(), 1);
        assert_eq!(fx.ctx.scene, before);
        assert_eq!(fx.ctx.selection.entities, vec![fx.ground]);
        assert_eq!(fx.ctx.active, Some(fx.ground));
    }

    #[test]
    fn test_transform_error_is_fatal_and_restores_scene() {
        let mut fx = fixture();
        fx.ctx.scene.remove(&fx.broken);
        let before = fx.ctx.scene.clone();
        let orchestrator = ExportOrchestrator::default()
            .with_transformer(SplatmapTransformer::with_registry(NodeRegistry::new()));
        let mut exporter = RecordingExporter::default();

        let result = orchestrator.export_individual(&mut fx.ctx, &mut exporter);
        assert!(matches!(
            result,
            Err(ExportError::Transform(TransformError::UnknownNodeType(_)))
        ));
        assert!(exporter.calls.is_empty());
        assert_eq!(fx.ctx.scene, before);
        assert_eq!(fx.ctx.selection.entities, vec![fx.ground]);
        assert_eq!(fx.ctx.active, Some(fx.ground));

        let result = orchestrator.export_all(&mut fx.ctx, &mut exporter);
        assert!(matches!(result, Err(ExportError::Transform(_))));
        assert!(exporter.calls.is_empty());
        assert_eq!(fx.ctx.scene, before);
    }

    #[test]
    fn test_hidden_splatmap_child_is_not_converted() {
        let mut fx = fixture();
        fx.ctx.scene.remove(&fx.broken);
        fx.ctx.scene.get_mut(&fx.ground).unwrap().visible = false;
        let mut exporter = RecordingExporter::default();

        ExportOrchestrator::default()
            .export_individual(&mut fx.ctx, &mut exporter)
            .unwrap();

        assert_eq!(exporter.calls[0].nodes, vec!["Forest", "Tree"]);
        assert!(!fx.ctx.scene.get(&fx.ground).unwrap().visible);
    }
}
