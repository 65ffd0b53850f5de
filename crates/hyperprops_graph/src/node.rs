// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for shader graphs.

use crate::port::{Port, PortValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to an image owned by the host.
///
/// Nodes only ever hold the handle, so copying a texture node shares the
/// underlying image instead of duplicating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Uuid);

impl ImageId {
    /// Create a new random image handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Input nodes (coordinates)
    Input,
    /// Output nodes
    Output,
    /// Shading models
    Shader,
    /// Texture sampling
    Texture,
    /// Vector operations (mapping, normal decoding)
    Vector,
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Default input ports
    pub inputs: Vec<Port>,
    /// Default output ports
    pub outputs: Vec<Port>,
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Display name
    pub name: String,
    /// User label, used to tag splatmap channels
    #[serde(default)]
    pub label: String,
    /// Image sampled by texture nodes
    #[serde(default)]
    pub image: Option<ImageId>,
    /// Position in the host's node editor
    pub position: [f32; 2],
    /// Input ports
    pub inputs: Vec<Port>,
    /// Output ports
    pub outputs: Vec<Port>,
}

impl Node {
    /// Create a new node from a type definition
    pub fn new(node_type: &NodeType) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.id.clone(),
            name: node_type.name.clone(),
            label: String::new(),
            image: None,
            position: [0.0, 0.0],
            inputs: node_type.inputs.iter().map(Port::instantiate).collect(),
            outputs: node_type.outputs.iter().map(Port::instantiate).collect(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the sampled image
    pub fn with_image(mut self, image: ImageId) -> Self {
        self.image = Some(image);
        self
    }

    /// Check the node's type ID
    pub fn is_type(&self, type_id: &str) -> bool {
        self.node_type == type_id
    }

    /// Get an input port by socket name
    pub fn input_named(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by socket name
    pub fn output_named(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Set the default value of a named input. Returns false if no such input exists.
    pub fn set_input_default(&mut self, name: &str, value: PortValue) -> bool {
        match self.inputs.iter_mut().find(|p| p.name == name) {
            Some(port) => {
                port.default_value = Some(value);
                true
            }
            None => false,
        }
    }

    /// Get a port by ID
    pub fn port(&self, port_id: &crate::port::PortId) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == *port_id)
            .or_else(|| self.outputs.iter().find(|p| p.id == *port_id))
    }
}

/// Registry of available node types
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    /// Registered node types by ID
    types: indexmap::IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: indexmap::IndexMap::new(),
        }
    }

    /// Register a node type
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str) -> Option<Node> {
        self.get(type_id).map(Node::new)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortType;

    fn texture_type() -> NodeType {
        NodeType {
            id: "tex".to_string(),
            name: "Texture".to_string(),
            category: NodeCategory::Texture,
            description: String::new(),
            inputs: vec![Port::input("Vector", PortType::Vector3)],
            outputs: vec![Port::output("Color", PortType::Color)],
        }
    }

    #[test]
    fn test_instances_get_distinct_port_ids() {
        let node_type = texture_type();
        let a = Node::new(&node_type);
        let b = Node::new(&node_type);
        assert_ne!(a.id, b.id);
        assert_ne!(a.inputs[0].id, b.inputs[0].id);
        assert_ne!(a.outputs[0].id, node_type.outputs[0].id);
    }

    #[test]
    fn test_named_lookup() {
        let mut node = Node::new(&texture_type());
        assert!(node.input_named("Vector").is_some());
        assert!(node.output_named("Vector").is_none());
        assert!(node.set_input_default("Vector", PortValue::Vector3([1.0, 2.0, 3.0])));
        assert!(!node.set_input_default("Missing", PortValue::Float(0.0)));
    }
}
