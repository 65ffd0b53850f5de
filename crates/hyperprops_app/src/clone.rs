// SPDX-License-Identifier: MIT OR Apache-2.0
//! Temporary export clones of splatmap nodes.
//!
//! Exporting a splatmap node means swapping it for a hidden-original /
//! visible-clone pair whose single material is the rewritten export graph.
//! Every clone must be torn down again, whichever way the export ends;
//! [`CloneScope`] owns the scene borrow for the duration and undoes all of
//! its clones on drop.

use crate::attributes::{AttrKey, AttrValue};
use crate::state::{EntityData, EntityId, MeshData, MeshId, SceneData};
use hyperprops_graph::{MaterialId, SplatmapTransformer, TransformError, ValidationError};

/// A live clone and everything needed to undo it
#[derive(Debug, Clone, PartialEq)]
pub struct ExportClone {
    /// The clone node
    pub clone: EntityId,
    /// The node it stands in for
    pub original: EntityId,
    /// The clone's mesh data
    pub mesh: MeshId,
    /// The transformed material
    pub material: MaterialId,
    original_visible: bool,
}

/// Failure to start a clone. The scene is unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(EntityId),

    /// Node's materials cannot be transformed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Export graph could not be built
    #[error(transparent)]
    Transform(TransformError),
}

impl From<TransformError> for CloneError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Validation(err) => CloneError::Validation(err),
            other => CloneError::Transform(other),
        }
    }
}

/// Build the export clone of `id` and hide the original.
///
/// The material transform runs before anything is touched, so an error
/// leaves the scene exactly as it was.
pub fn begin_transform(
    scene: &mut SceneData,
    transformer: &SplatmapTransformer,
    id: EntityId,
) -> Result<ExportClone, CloneError> {
    let source = scene.get(&id).cloned().ok_or(CloneError::NodeNotFound(id))?;
    let transformed = transformer.transform(&source.name, &scene.materials_of(&id))?;

    let mesh_name = source
        .mesh
        .and_then(|m| scene.meshes.get(&m))
        .map_or_else(|| source.name.clone(), |m| m.name.clone());
    let material = scene.add_material(transformed.material);
    let mesh = scene.add_mesh(MeshData::new(format!("{mesh_name}_splatmap_clone"), vec![material]));

    let mut attributes = source.attributes.clone();
    for (label, scale) in &transformed.scale_by_label {
        attributes.set(AttrKey::ChannelScale(*label), AttrValue::Float(*scale));
    }

    let clone = scene.add_entity(EntityData {
        name: format!("{}_splatmap_clone", source.name),
        kind: source.kind,
        visible: true,
        transform: source.transform.clone(),
        parent: source.parent,
        children: Vec::new(),
        mesh: Some(mesh),
        attributes,
    });

    if let Some(original) = scene.get_mut(&id) {
        original.visible = false;
    }

    tracing::debug!("Created export clone of '{}'", source.name);

    Ok(ExportClone {
        clone,
        original: id,
        mesh,
        material,
        original_visible: source.visible,
    })
}

/// Remove a clone and restore its original.
pub fn end(scene: &mut SceneData, clone: ExportClone) {
    scene.remove(&clone.clone);
    scene.meshes.shift_remove(&clone.mesh);
    if scene.material_users(&clone.material) == 0 {
        scene.materials.shift_remove(&clone.material);
    }

    if let Some(original) = scene.get_mut(&clone.original) {
        original.visible = clone.original_visible;
        tracing::debug!("Removed export clone of '{}'", original.name);
    }
}

/// Scope that owns the scene while export clones exist.
///
/// Clones are ended in reverse order of creation when the scope drops.
pub struct CloneScope<'a> {
    scene: &'a mut SceneData,
    transformer: &'a SplatmapTransformer,
    clones: Vec<ExportClone>,
}

impl<'a> CloneScope<'a> {
    /// Open a scope over `scene`
    pub fn new(scene: &'a mut SceneData, transformer: &'a SplatmapTransformer) -> Self {
        Self {
            scene,
            transformer,
            clones: Vec::new(),
        }
    }

    /// Clone `id` for export. On error the scene is unchanged and earlier
    /// clones stay live until the scope drops.
    pub fn begin(&mut self, id: EntityId) -> Result<&ExportClone, CloneError> {
        let clone = begin_transform(self.scene, self.transformer, id)?;
        self.clones.push(clone);
        Ok(&self.clones[self.clones.len() - 1])
    }

    /// Scene as currently modified
    pub fn scene(&self) -> &SceneData {
        &*self.scene
    }

    /// Live clones, oldest first
    pub fn clones(&self) -> &[ExportClone] {
        &self.clones
    }

    /// Number of live clones
    pub fn len(&self) -> usize {
        self.clones.len()
    }

    /// Whether no clone is live
    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }
}

impl Drop for CloneScope<'_> {
    fn drop(&mut self) {
        while let Some(clone) = self.clones.pop() {
            end(self.scene, clone);
        }
    }
}
