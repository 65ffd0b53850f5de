// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene state.
//!
//! This module contains the scene graph the export pipeline operates on:
//! nodes with their custom attributes, mesh data and material registries,
//! plus the explicit selection/active-node context that the host would
//! otherwise keep as ambient state.

use crate::attributes::Attributes;
use hyperprops_graph::{Material, MaterialId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier for scene nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for mesh data blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshId(pub Uuid);

impl MeshId {
    /// Create a new random mesh ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MeshId {
    fn default() -> Self {
        Self::new()
    }
}

/// Entity selection state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Currently selected entities
    pub entities: Vec<EntityId>,
}

impl Selection {
    /// Create a new empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an entity is selected
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Add an entity to the selection (idempotent)
    pub fn add(&mut self, id: EntityId) {
        if !self.contains(&id) {
            self.entities.push(id);
        }
    }

    /// Remove an entity from the selection
    pub fn remove(&mut self, id: &EntityId) {
        self.entities.retain(|e| e != id);
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Check if the selection is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over selected entities
    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.iter()
    }
}

/// Transform component data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position (x, y, z)
    pub position: [f32; 3],
    /// Rotation in euler angles (degrees)
    pub rotation: [f32; 3],
    /// Scale
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

/// Host object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeKind {
    /// Polygon mesh
    Mesh,
    /// Empty, used as a group
    #[default]
    Empty,
    /// Armature, exported as a skinned mesh
    Armature,
}

impl NodeKind {
    /// Name the runtime gives an untagged node of this kind
    pub fn untagged_name(&self) -> &'static str {
        match self {
            NodeKind::Mesh => "Mesh",
            NodeKind::Empty => "Group",
            NodeKind::Armature => "Skinned Mesh",
        }
    }
}

/// Mesh data block: geometry is owned by the host, only material slots are modelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Mesh name
    pub name: String,
    /// Material slots, in order
    pub materials: Vec<MaterialId>,
}

impl MeshData {
    /// Create mesh data with the given material slots
    pub fn new(name: impl Into<String>, materials: Vec<MaterialId>) -> Self {
        Self {
            name: name.into(),
            materials,
        }
    }
}

/// Scene node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    /// Node name
    pub name: String,
    /// Object type
    pub kind: NodeKind,
    /// Whether the node is visible in the viewport
    pub visible: bool,
    /// Local transform
    pub transform: Transform,
    /// Parent entity (if any)
    pub parent: Option<EntityId>,
    /// Child entities
    pub children: Vec<EntityId>,
    /// Mesh data, for mesh nodes
    pub mesh: Option<MeshId>,
    /// Custom attributes
    #[serde(default)]
    pub attributes: Attributes,
}

impl Default for EntityData {
    fn default() -> Self {
        Self {
            name: "Empty".to_string(),
            kind: NodeKind::Empty,
            visible: true,
            transform: Transform::default(),
            parent: None,
            children: Vec::new(),
            mesh: None,
            attributes: Attributes::new(),
        }
    }
}

impl EntityData {
    /// Create a new empty node with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a new node of the given kind
    pub fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }
}

/// Scene data: nodes plus the mesh and material registries they reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    /// All nodes in the scene
    pub entities: IndexMap<EntityId, EntityData>,
    /// Mesh data blocks
    #[serde(default)]
    pub meshes: IndexMap<MeshId, MeshData>,
    /// Material registry
    #[serde(default)]
    pub materials: IndexMap<MaterialId, Material>,
}

impl SceneData {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the scene, linking it under its parent if it has one
    pub fn add_entity(&mut self, data: EntityData) -> EntityId {
        let id = EntityId::new();
        self.insert_entity(id, data);
        id
    }

    /// Insert a node with a known ID. Returns false if the ID is taken.
    pub fn insert_entity(&mut self, id: EntityId, data: EntityData) -> bool {
        if self.entities.contains_key(&id) {
            return false;
        }
        if let Some(parent) = data.parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.children.push(id);
        }
        self.entities.insert(id, data);
        true
    }

    /// Add a node under `parent`
    pub fn add_child(&mut self, parent: EntityId, mut data: EntityData) -> EntityId {
        data.parent = Some(parent);
        self.add_entity(data)
    }

    /// Add a mesh node whose mesh data uses the given materials.
    /// The materials are registered with the scene.
    pub fn add_mesh_object(
        &mut self,
        name: impl Into<String>,
        parent: Option<EntityId>,
        materials: Vec<Material>,
    ) -> EntityId {
        let name = name.into();
        let slots = materials.into_iter().map(|m| self.add_material(m)).collect();
        let mesh = self.add_mesh(MeshData::new(name.clone(), slots));
        self.add_entity(EntityData {
            kind: NodeKind::Mesh,
            mesh: Some(mesh),
            parent,
            ..EntityData::new(name)
        })
    }

    /// Get a node by ID
    pub fn get(&self, id: &EntityId) -> Option<&EntityData> {
        self.entities.get(id)
    }

    /// Get a mutable reference to a node by ID
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut EntityData> {
        self.entities.get_mut(id)
    }

    /// Remove a node from the scene and unlink it from its parent.
    /// Children are left in place with a dangling parent reference.
    pub fn remove(&mut self, id: &EntityId) -> Option<EntityData> {
        let data = self.entities.shift_remove(id)?;
        if let Some(parent) = data.parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.children.retain(|c| c != id);
        }
        Some(data)
    }

    /// Find the first node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, data)| data.name == name)
            .map(|(id, _)| *id)
    }

    /// Get all root entities (no parent)
    pub fn root_entities(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, data)| data.parent.is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    /// All descendants of a node, depth first
    pub fn descendants(&self, id: &EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self
            .get(id)
            .map(|d| d.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if out.contains(&next) {
                continue;
            }
            out.push(next);
            if let Some(data) = self.get(&next) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    /// Register mesh data
    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        let id = MeshId::new();
        self.meshes.insert(id, mesh);
        id
    }

    /// Register a material
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = material.id;
        self.materials.insert(id, material);
        id
    }

    /// Material slots of a node, resolved against the registry
    pub fn materials_of(&self, id: &EntityId) -> Vec<&Material> {
        self.get(id)
            .and_then(|data| data.mesh)
            .and_then(|mesh| self.meshes.get(&mesh))
            .map(|mesh| mesh.materials.iter().filter_map(|m| self.materials.get(m)).collect())
            .unwrap_or_default()
    }

    /// Number of mesh data blocks using a material
    pub fn material_users(&self, material: &MaterialId) -> usize {
        self.meshes
            .values()
            .filter(|mesh| mesh.materials.contains(material))
            .count()
    }

    /// Number of nodes
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

/// Error reading or writing a scene file
#[derive(Debug, thiserror::Error)]
pub enum SceneIoError {
    /// File system error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed scene file
    #[error("Deserialization error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Scene could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Scene plus the selection state and project location every operation runs against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneContext {
    /// Scene data
    pub scene: SceneData,
    /// Current selection
    #[serde(default)]
    pub selection: Selection,
    /// Active node
    #[serde(default)]
    pub active: Option<EntityId>,
    /// Saved project location; `None` when unsaved
    #[serde(skip)]
    pub project_path: Option<PathBuf>,
}

impl SceneContext {
    /// Create a context for an unsaved scene
    pub fn new(scene: SceneData) -> Self {
        Self {
            scene,
            ..Default::default()
        }
    }

    /// Load a scene from a RON file
    pub fn load(path: &Path) -> Result<Self, SceneIoError> {
        let content = std::fs::read_to_string(path)?;
        let mut ctx: SceneContext = ron::from_str(&content)?;
        ctx.project_path = Some(path.to_path_buf());
        tracing::info!("Loaded scene from {:?}", path);
        Ok(ctx)
    }

    /// Save the scene to a RON file and remember the location
    pub fn save_to_path(&mut self, path: &Path) -> Result<(), SceneIoError> {
        let ron_str = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, ron_str)?;
        self.project_path = Some(path.to_path_buf());
        tracing::info!("Saved scene to {:?}", path);
        Ok(())
    }

    /// Select a node and all of its descendants
    pub fn select_hierarchy(&mut self, root: EntityId) {
        self.selection.add(root);
        for child in self.scene.descendants(&root) {
            self.selection.add(child);
        }
    }
}

/// Saves the selection and active node, clears the selection, and puts
/// both back when dropped.
pub struct SelectionGuard<'a> {
    ctx: &'a mut SceneContext,
    saved: Selection,
    saved_active: Option<EntityId>,
}

impl<'a> SelectionGuard<'a> {
    /// Save the current selection and start from an empty one
    pub fn new(ctx: &'a mut SceneContext) -> Self {
        let saved = std::mem::take(&mut ctx.selection);
        let saved_active = ctx.active;
        Self {
            ctx,
            saved,
            saved_active,
        }
    }
}

impl Deref for SelectionGuard<'_> {
    type Target = SceneContext;

    fn deref(&self) -> &SceneContext {
        &*self.ctx
    }
}

impl DerefMut for SelectionGuard<'_> {
    fn deref_mut(&mut self) -> &mut SceneContext {
        &mut *self.ctx
    }
}

impl Drop for SelectionGuard<'_> {
    fn drop(&mut self) {
        self.ctx.selection = std::mem::take(&mut self.saved);
        self.ctx.active = self.saved_active;
    }
}
