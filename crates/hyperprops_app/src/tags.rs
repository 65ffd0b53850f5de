// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node tags and their dependent attributes.
//!
//! Every node has at most one tag (the `node` attribute). Some attributes
//! belong to exactly one tag and must not outlive it, so re-tagging a node
//! purges the attributes owned by every other tag. Boolean flags are stored
//! only when they differ from their default, which [`TagStore::toggle_flag`]
//! maintains for all of them.

use crate::attributes::{AttrKey, AttrValue, Attributes};
use crate::state::{EntityData, EntityId, NodeKind, SceneData};
use std::fmt;
use std::str::FromStr;

/// Primary role of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeTag {
    /// Untagged
    #[default]
    None,
    /// Physics body
    Rigidbody,
    /// Collision shape
    Collider,
    /// Level-of-detail group
    LodGroup,
    /// Snap point
    SnapPoint,
}

impl NodeTag {
    /// All tags
    pub const ALL: [NodeTag; 5] = [
        NodeTag::None,
        NodeTag::Rigidbody,
        NodeTag::Collider,
        NodeTag::LodGroup,
        NodeTag::SnapPoint,
    ];

    /// Value of the `node` attribute; `None` is stored as absence
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            NodeTag::None => None,
            NodeTag::Rigidbody => Some("rigidbody"),
            NodeTag::Collider => Some("collider"),
            NodeTag::LodGroup => Some("lod"),
            NodeTag::SnapPoint => Some("snap"),
        }
    }

    /// Parse a stored `node` attribute value
    pub fn from_attr(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_attr() == Some(value))
    }

    /// Attributes that only exist while a node carries this tag
    pub fn exclusive_keys(&self) -> &'static [AttrKey] {
        match self {
            NodeTag::Rigidbody => &[AttrKey::Type],
            NodeTag::Collider => &[AttrKey::Convex, AttrKey::Trigger],
            NodeTag::None | NodeTag::LodGroup | NodeTag::SnapPoint => &[],
        }
    }

    /// Name the runtime shows for the tag; `None` when untagged
    pub fn display_name(&self) -> Option<&'static str> {
        match self {
            NodeTag::None => None,
            NodeTag::Rigidbody => Some("Rigidbody"),
            NodeTag::Collider => Some("Collider"),
            NodeTag::LodGroup => Some("LOD"),
            NodeTag::SnapPoint => Some("Snap"),
        }
    }

    /// Tags the host panel offers for a node kind
    pub fn offered_for(kind: NodeKind) -> &'static [NodeTag] {
        match kind {
            NodeKind::Mesh => &[NodeTag::None, NodeTag::Collider],
            NodeKind::Empty => &[
                NodeTag::None,
                NodeTag::Rigidbody,
                NodeTag::LodGroup,
                NodeTag::SnapPoint,
            ],
            NodeKind::Armature => &[NodeTag::None],
        }
    }
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_attr().unwrap_or("none"))
    }
}

/// Rigidbody simulation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RigidbodyKind {
    /// Immovable; the runtime default, never stored
    #[default]
    Static,
    /// Moved by scripts
    Kinematic,
    /// Simulated
    Dynamic,
}

impl RigidbodyKind {
    /// All kinds
    pub const ALL: [RigidbodyKind; 3] = [
        RigidbodyKind::Static,
        RigidbodyKind::Kinematic,
        RigidbodyKind::Dynamic,
    ];

    /// Value of the `type` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            RigidbodyKind::Static => "static",
            RigidbodyKind::Kinematic => "kinematic",
            RigidbodyKind::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for RigidbodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean attributes persisted only when they differ from their default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolFlag {
    /// Collider uses a convex hull
    Convex,
    /// Collider only reports overlaps
    Trigger,
    /// LOD distances scale with the group
    ScaleAware,
    /// Mesh casts shadows
    CastShadow,
    /// Mesh receives shadows
    ReceiveShadow,
    /// Mesh material is rewritten as a splatmap on export
    Splatmap,
}

impl BoolFlag {
    /// All flags
    pub const ALL: [BoolFlag; 6] = [
        BoolFlag::Convex,
        BoolFlag::Trigger,
        BoolFlag::ScaleAware,
        BoolFlag::CastShadow,
        BoolFlag::ReceiveShadow,
        BoolFlag::Splatmap,
    ];

    /// Attribute the flag is stored under
    pub fn key(&self) -> AttrKey {
        match self {
            BoolFlag::Convex => AttrKey::Convex,
            BoolFlag::Trigger => AttrKey::Trigger,
            BoolFlag::ScaleAware => AttrKey::ScaleAware,
            BoolFlag::CastShadow => AttrKey::CastShadow,
            BoolFlag::ReceiveShadow => AttrKey::ReceiveShadow,
            BoolFlag::Splatmap => AttrKey::Splatmap,
        }
    }

    /// Value the runtime assumes when the attribute is absent
    pub fn default_value(&self) -> bool {
        match self {
            BoolFlag::Convex | BoolFlag::Trigger | BoolFlag::Splatmap => false,
            BoolFlag::ScaleAware | BoolFlag::CastShadow | BoolFlag::ReceiveShadow => true,
        }
    }

    /// Precondition for touching the flag on `node`
    fn check(&self, node: &EntityData, tag: NodeTag) -> Result<(), &'static str> {
        match self {
            BoolFlag::Convex | BoolFlag::Trigger if tag != NodeTag::Collider => {
                Err("collider flags require the collider tag")
            }
            BoolFlag::ScaleAware if tag != NodeTag::LodGroup => {
                Err("scaleAware requires the lod tag")
            }
            BoolFlag::CastShadow | BoolFlag::ReceiveShadow | BoolFlag::Splatmap
                if node.kind != NodeKind::Mesh =>
            {
                Err("mesh flags require a mesh node")
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for BoolFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().as_str())
    }
}

/// Unrecognised tag, kind or flag name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for NodeTag {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "none" {
            return Ok(NodeTag::None);
        }
        Self::from_attr(s).ok_or_else(|| ParseEnumError { kind: "node tag", value: s.to_string() })
    }
}

impl FromStr for RigidbodyKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseEnumError { kind: "rigidbody type", value: s.to_string() })
    }
}

impl FromStr for BoolFlag {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.key().as_str() == s)
            .ok_or_else(|| ParseEnumError { kind: "flag", value: s.to_string() })
    }
}

/// Error from a tag store operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TagError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(EntityId),

    /// Operation not valid for the node's current tag or kind
    #[error("Invalid operation on '{node}': {reason}")]
    CallerContract {
        /// Node name
        node: String,
        /// Violated precondition
        reason: &'static str,
    },

    /// Stored attribute has an unexpected type or value
    #[error("Attribute '{key}' on '{node}' holds an unexpected value")]
    InvalidAttribute {
        /// Node name
        node: String,
        /// Offending attribute
        key: AttrKey,
    },
}

/// Receives a notification whenever a node's attributes change
pub trait TagObserver {
    /// Called after each mutation of `node`
    fn node_changed(&mut self, node: EntityId);
}

impl<F: FnMut(EntityId)> TagObserver for F {
    fn node_changed(&mut self, node: EntityId) {
        self(node);
    }
}

/// Read-only queries over the tags and attributes of a scene
#[derive(Debug, Clone, Copy)]
pub struct TagView<'a> {
    scene: &'a SceneData,
}

impl<'a> TagView<'a> {
    /// View a scene
    pub fn new(scene: &'a SceneData) -> Self {
        Self { scene }
    }

    fn node(&self, id: EntityId) -> Result<&'a EntityData, TagError> {
        self.scene.get(&id).ok_or(TagError::NodeNotFound(id))
    }

    /// Current tag of a node
    pub fn tag(&self, id: EntityId) -> Result<NodeTag, TagError> {
        let node = self.node(id)?;
        tag_of(node).ok_or_else(|| TagError::InvalidAttribute {
            node: node.name.clone(),
            key: AttrKey::Node,
        })
    }

    /// Rigidbody kind of a node; absence reads as `Static`
    pub fn rigidbody_kind(&self, id: EntityId) -> Result<RigidbodyKind, TagError> {
        let node = self.node(id)?;
        match node.attributes.get(AttrKey::Type) {
            None => Ok(RigidbodyKind::Static),
            Some(AttrValue::Str(value)) => value.parse().map_err(|_| TagError::InvalidAttribute {
                node: node.name.clone(),
                key: AttrKey::Type,
            }),
            Some(_) => Err(TagError::InvalidAttribute {
                node: node.name.clone(),
                key: AttrKey::Type,
            }),
        }
    }

    /// Effective value of a flag
    pub fn flag(&self, id: EntityId, flag: BoolFlag) -> Result<bool, TagError> {
        let node = self.node(id)?;
        stored_flag(node, flag).map(|v| v.unwrap_or(flag.default_value()))
    }

    /// Whether the node's parent is a LOD group
    pub fn is_lod_child(&self, id: EntityId) -> Result<bool, TagError> {
        let node = self.node(id)?;
        Ok(node
            .parent
            .and_then(|p| self.scene.get(&p))
            .is_some_and(|parent| tag_of(parent) == Some(NodeTag::LodGroup)))
    }

    /// LOD switch distance of a group child; 0 means unset
    pub fn max_distance(&self, id: EntityId) -> Result<u32, TagError> {
        let node = self.node(id)?;
        match node.attributes.get(AttrKey::MaxDistance) {
            None => Ok(0),
            Some(AttrValue::Int(v)) => u32::try_from(*v).map_err(|_| TagError::InvalidAttribute {
                node: node.name.clone(),
                key: AttrKey::MaxDistance,
            }),
            Some(_) => Err(TagError::InvalidAttribute {
                node: node.name.clone(),
                key: AttrKey::MaxDistance,
            }),
        }
    }
}

/// Tag/attribute state machine over a scene
pub struct TagStore<'a> {
    scene: &'a mut SceneData,
    observer: Option<&'a mut dyn TagObserver>,
}

impl<'a> TagStore<'a> {
    /// Create a store over a scene
    pub fn new(scene: &'a mut SceneData) -> Self {
        Self {
            scene,
            observer: None,
        }
    }

    /// Notify `observer` after every mutation
    pub fn with_observer(mut self, observer: &'a mut dyn TagObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Read-only view of the same scene
    pub fn view(&self) -> TagView<'_> {
        TagView::new(&*self.scene)
    }

    fn attributes_mut(&mut self, id: EntityId) -> Result<&mut Attributes, TagError> {
        self.scene
            .get_mut(&id)
            .map(|data| &mut data.attributes)
            .ok_or(TagError::NodeNotFound(id))
    }

    fn notify(&mut self, id: EntityId) {
        if let Some(observer) = self.observer.as_mut() {
            observer.node_changed(id);
        }
    }

    fn contract(&self, id: EntityId, reason: &'static str) -> TagError {
        TagError::CallerContract {
            node: self.scene.get(&id).map(|d| d.name.clone()).unwrap_or_default(),
            reason,
        }
    }

    /// Current tag of a node
    pub fn tag(&self, id: EntityId) -> Result<NodeTag, TagError> {
        self.view().tag(id)
    }

    /// Set or clear the tag, purging attributes owned by any other tag.
    ///
    /// Re-applying the current tag runs the same purge.
    pub fn set_tag(&mut self, id: EntityId, tag: NodeTag) -> Result<(), TagError> {
        let attrs = self.attributes_mut(id)?;
        match tag.as_attr() {
            Some(value) => attrs.set(AttrKey::Node, AttrValue::Str(value.to_string())),
            None => {
                attrs.remove(AttrKey::Node);
            }
        }
        for other in NodeTag::ALL.into_iter().filter(|t| *t != tag) {
            for key in other.exclusive_keys() {
                attrs.remove(*key);
            }
        }
        tracing::debug!("Tagged {:?} as {}", id, tag);
        self.notify(id);
        Ok(())
    }

    /// Rigidbody kind of a node; absence reads as `Static`
    pub fn rigidbody_kind(&self, id: EntityId) -> Result<RigidbodyKind, TagError> {
        self.view().rigidbody_kind(id)
    }

    /// Set the rigidbody kind. The node must be tagged as a rigidbody.
    ///
    /// `Static` always deletes the attribute, whatever was stored before.
    pub fn set_rigidbody_kind(&mut self, id: EntityId, kind: RigidbodyKind) -> Result<(), TagError> {
        if self.tag(id)? != NodeTag::Rigidbody {
            return Err(self.contract(id, "rigidbody type requires the rigidbody tag"));
        }
        let attrs = self.attributes_mut(id)?;
        match kind {
            RigidbodyKind::Static => {
                attrs.remove(AttrKey::Type);
            }
            _ => attrs.set(AttrKey::Type, AttrValue::Str(kind.as_str().to_string())),
        }
        self.notify(id);
        Ok(())
    }

    /// Effective value of a flag
    pub fn flag(&self, id: EntityId, flag: BoolFlag) -> Result<bool, TagError> {
        self.view().flag(id, flag)
    }

    /// Flip a flag between "absent" (the default) and "stored with the
    /// non-default value". Returns the new effective value.
    pub fn toggle_flag(&mut self, id: EntityId, flag: BoolFlag) -> Result<bool, TagError> {
        let view = self.view();
        let node = view.node(id)?;
        let tag = view.tag(id)?;
        if let Err(reason) = flag.check(node, tag) {
            return Err(self.contract(id, reason));
        }
        let current = stored_flag(node, flag)?.unwrap_or(flag.default_value());

        let next = !current;
        let attrs = self.attributes_mut(id)?;
        if next == flag.default_value() {
            attrs.remove(flag.key());
        } else {
            attrs.set(flag.key(), AttrValue::Bool(next));
        }
        self.notify(id);
        Ok(next)
    }

    /// Whether the node's parent is a LOD group
    pub fn is_lod_child(&self, id: EntityId) -> Result<bool, TagError> {
        self.view().is_lod_child(id)
    }

    /// LOD switch distance of a group child; 0 means unset
    pub fn max_distance(&self, id: EntityId) -> Result<u32, TagError> {
        self.view().max_distance(id)
    }

    /// Set the LOD switch distance of a group child. Zero deletes the attribute.
    pub fn set_max_distance(&mut self, id: EntityId, value: u32) -> Result<(), TagError> {
        if !self.is_lod_child(id)? {
            return Err(self.contract(id, "maxDistance requires a lod group parent"));
        }
        let attrs = self.attributes_mut(id)?;
        if value == 0 {
            attrs.remove(AttrKey::MaxDistance);
        } else {
            attrs.set(AttrKey::MaxDistance, AttrValue::Int(i64::from(value)));
        }
        self.notify(id);
        Ok(())
    }
}

/// Tag stored on a node; `None` if the stored value is not a known tag
fn tag_of(node: &EntityData) -> Option<NodeTag> {
    match node.attributes.get(AttrKey::Node) {
        None => Some(NodeTag::None),
        Some(AttrValue::Str(value)) => NodeTag::from_attr(value),
        Some(_) => None,
    }
}

fn stored_flag(node: &EntityData, flag: BoolFlag) -> Result<Option<bool>, TagError> {
    match node.attributes.get(flag.key()) {
        None => Ok(None),
        Some(AttrValue::Bool(v)) => Ok(Some(*v)),
        Some(_) => Err(TagError::InvalidAttribute {
            node: node.name.clone(),
            key: flag.key(),
        }),
    }
}

/// Display name of a node's role: its tag, or its kind when untagged
pub fn display_name(node: &EntityData) -> &'static str {
    tag_of(node)
        .and_then(|tag| tag.display_name())
        .unwrap_or_else(|| node.kind.untagged_name())
}

/// Whether a node is a mesh marked for splatmap export
pub fn is_splatmap(node: &EntityData) -> bool {
    node.kind == NodeKind::Mesh && node.attributes.get_bool(AttrKey::Splatmap) == Some(true)
}
