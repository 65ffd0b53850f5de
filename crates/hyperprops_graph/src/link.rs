// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket-to-socket links.

use crate::node::NodeId;
use crate::port::PortId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// An output socket of one node feeding an input socket of another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Link id
    pub id: LinkId,
    /// Node owning the output socket
    pub from_node: NodeId,
    /// Output socket
    pub from_port: PortId,
    /// Node owning the input socket
    pub to_node: NodeId,
    /// Input socket
    pub to_port: PortId,
}

impl Link {
    /// Link `from` (node, output) into `to` (node, input)
    pub fn between(from: (NodeId, PortId), to: (NodeId, PortId)) -> Self {
        Self {
            id: LinkId::new(),
            from_node: from.0,
            from_port: from.1,
            to_node: to.0,
            to_port: to.1,
        }
    }

    /// Whether either end sits on `node`
    pub fn touches(&self, node: NodeId) -> bool {
        self.from_node == node || self.to_node == node
    }
}
