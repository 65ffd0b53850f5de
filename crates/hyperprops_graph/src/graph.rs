// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node graph: nodes plus the links between their sockets.

use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId};
use crate::port::PortId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A shader node graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Links between sockets
    links: IndexMap<LinkId, Link>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and every link touching it
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.links.retain(|_, l| !l.touches(node_id));
        self.nodes.shift_remove(&node_id)
    }

    /// Remove every node and link
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
    }

    /// Get all nodes of one type
    pub fn nodes_of_type<'a>(&'a self, type_id: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| n.is_type(type_id))
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Link an output port of `from_node` into an input port of `to_node`
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<LinkId, LinkError> {
        let source_node = self.nodes.get(&from_node)
            .ok_or(LinkError::NodeNotFound(from_node))?;
        let target_node = self.nodes.get(&to_node)
            .ok_or(LinkError::NodeNotFound(to_node))?;

        let source_port = source_node.port(&from_port)
            .ok_or(LinkError::PortNotFound(from_port))?;
        let target_port = target_node.port(&to_port)
            .ok_or(LinkError::PortNotFound(to_port))?;

        if !source_port.can_connect(target_port) {
            return Err(LinkError::IncompatiblePorts);
        }

        if !target_port.multi_connect && self.links.values().any(|l| l.to_port == to_port) {
            return Err(LinkError::PortAlreadyConnected(to_port));
        }

        if from_node == to_node {
            return Err(LinkError::SelfLoop);
        }

        let link = Link::between((from_node, from_port), (to_node, to_port));
        let id = link.id;
        self.links.insert(id, link);
        Ok(id)
    }

    /// Link two sockets addressed by name, `from_socket` being an output
    /// of `from_node` and `to_socket` an input of `to_node`.
    pub fn connect_named(
        &mut self,
        from_node: NodeId,
        from_socket: &str,
        to_node: NodeId,
        to_socket: &str,
    ) -> Result<LinkId, LinkError> {
        let from_port = self.nodes.get(&from_node)
            .ok_or(LinkError::NodeNotFound(from_node))?
            .output_named(from_socket)
            .ok_or_else(|| LinkError::SocketNotFound(from_socket.to_string()))?
            .id;
        let to_port = self.nodes.get(&to_node)
            .ok_or(LinkError::NodeNotFound(to_node))?
            .input_named(to_socket)
            .ok_or_else(|| LinkError::SocketNotFound(to_socket.to_string()))?
            .id;
        self.connect(from_node, from_port, to_node, to_port)
    }

    /// Links feeding an input port
    pub fn links_into(&self, port_id: PortId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.to_port == port_id)
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Nodes linked into any input of `node_id`, in input order
    pub fn upstream_nodes(&self, node_id: NodeId) -> Vec<&Node> {
        let Some(node) = self.nodes.get(&node_id) else {
            return Vec::new();
        };
        node.inputs
            .iter()
            .flat_map(|input| self.links_into(input.id))
            .filter_map(|l| self.nodes.get(&l.from_node))
            .collect()
    }

    /// Check whether an output socket of `from` feeds the named input of `to`
    pub fn is_linked(&self, from: NodeId, to: NodeId, to_socket: &str) -> bool {
        let Some(port) = self.nodes.get(&to).and_then(|n| n.input_named(to_socket)) else {
            return false;
        };
        self.links_into(port.id).any(|l| l.from_node == from)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when linking two sockets
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// No socket with the given name
    #[error("Socket not found: {0}")]
    SocketNotFound(String),

    /// Incompatible port types
    #[error("Incompatible port types")]
    IncompatiblePorts,

    /// Port is already connected
    #[error("Port already connected: {0:?}")]
    PortAlreadyConnected(PortId),

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,
}
