// SPDX-License-Identifier: MIT OR Apache-2.0
//! Materials: a named shader graph registered with the scene.

use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub Uuid);

impl MaterialId {
    /// Create a new random material ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MaterialId {
    fn default() -> Self {
        Self::new()
    }
}

/// A material and its shader graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Unique material ID
    pub id: MaterialId,
    /// Material name
    pub name: String,
    /// Shader graph
    pub graph: Graph,
}

impl Material {
    /// Create a material with an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: MaterialId::new(),
            graph: Graph::new(name.clone()),
            name,
        }
    }

    /// Create a material around an existing graph
    pub fn with_graph(name: impl Into<String>, graph: Graph) -> Self {
        Self {
            id: MaterialId::new(),
            name: name.into(),
            graph,
        }
    }
}
