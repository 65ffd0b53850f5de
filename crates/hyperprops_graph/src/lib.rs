// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader graph model for `hyperprops`.
//!
//! This crate provides:
//! - A small node graph model (typed sockets, validated links)
//! - The registry of shader node types found in exported materials
//! - The splatmap transformer that rewrites a labelled splatmap material
//!   into an export-safe principled material

pub mod node;
pub mod port;
pub mod link;
pub mod graph;
pub mod material;
pub mod shader;
pub mod splatmap;

pub use node::{ImageId, Node, NodeId, NodeRegistry, NodeType};
pub use port::{Port, PortId, PortType, PortDirection, PortValue};
pub use link::{Link, LinkId};
pub use graph::{LinkError, Graph};
pub use material::{Material, MaterialId};
pub use splatmap::{
    SplatChannel, SplatChannelSet, SplatLabel, SplatmapTransformer, TransformError,
    TransformedMaterial, ValidationError,
};
