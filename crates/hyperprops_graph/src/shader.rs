// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node types understood by the export pipeline.
//!
//! Type IDs and socket names mirror the host's node editor so that graphs
//! read from a project can be scanned without translation.

use crate::node::{NodeCategory, NodeRegistry, NodeType};
use crate::port::{Port, PortType, PortValue};

/// Image texture sampler
pub const TEX_IMAGE: &str = "tex_image";
/// Texture coordinate source
pub const TEX_COORD: &str = "tex_coord";
/// Coordinate mapping (location/rotation/scale)
pub const MAPPING: &str = "mapping";
/// Principled PBR shading model
pub const BSDF_PRINCIPLED: &str = "bsdf_principled";
/// Tangent-space normal map decoder
pub const NORMAL_MAP: &str = "normal_map";
/// Material output
pub const OUTPUT_MATERIAL: &str = "output_material";

/// Socket names
pub mod socket {
    /// Coordinate input / mapped coordinate output
    pub const VECTOR: &str = "Vector";
    /// UV coordinate output
    pub const UV: &str = "UV";
    /// Mapping scale input
    pub const SCALE: &str = "Scale";
    /// Mapping location input
    pub const LOCATION: &str = "Location";
    /// Mapping rotation input
    pub const ROTATION: &str = "Rotation";
    /// Texture color output, normal map color input
    pub const COLOR: &str = "Color";
    /// Texture alpha output, shading alpha input
    pub const ALPHA: &str = "Alpha";
    /// Shading closure output
    pub const BSDF: &str = "BSDF";
    /// Material output surface input
    pub const SURFACE: &str = "Surface";
    /// Material output volume input
    pub const VOLUME: &str = "Volume";
    /// Material output displacement input
    pub const DISPLACEMENT: &str = "Displacement";
    /// Normal input / normal map output
    pub const NORMAL: &str = "Normal";
    /// Normal map strength
    pub const STRENGTH: &str = "Strength";
    /// Shading inputs
    pub const BASE_COLOR: &str = "Base Color";
    /// Shading input
    pub const METALLIC: &str = "Metallic";
    /// Shading input
    pub const ROUGHNESS: &str = "Roughness";
    /// Shading input
    pub const SPECULAR_IOR_LEVEL: &str = "Specular IOR Level";
    /// Shading input
    pub const EMISSION_COLOR: &str = "Emission Color";
    /// Shading input
    pub const TRANSMISSION_WEIGHT: &str = "Transmission Weight";
}

/// Create the shader node registry
pub fn create_shader_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(NodeType {
        id: OUTPUT_MATERIAL.to_string(),
        name: "Material Output".to_string(),
        category: NodeCategory::Output,
        description: "Final material output".to_string(),
        inputs: vec![
            Port::input(socket::SURFACE, PortType::Shader),
            Port::input(socket::VOLUME, PortType::Shader),
            Port::input(socket::DISPLACEMENT, PortType::Vector3),
        ],
        outputs: vec![],
    });

    registry.register(NodeType {
        id: BSDF_PRINCIPLED.to_string(),
        name: "Principled BSDF".to_string(),
        category: NodeCategory::Shader,
        description: "Physically based shading model".to_string(),
        inputs: vec![
            Port::input(socket::BASE_COLOR, PortType::Color).with_default(PortValue::Color([0.8, 0.8, 0.8, 1.0])),
            Port::input(socket::METALLIC, PortType::Float).with_default(PortValue::Float(0.0)),
            Port::input(socket::ROUGHNESS, PortType::Float).with_default(PortValue::Float(0.5)),
            Port::input(socket::ALPHA, PortType::Float).with_default(PortValue::Float(1.0)),
            Port::input(socket::NORMAL, PortType::Vector3),
            Port::input(socket::SPECULAR_IOR_LEVEL, PortType::Float).with_default(PortValue::Float(0.5)),
            Port::input(socket::TRANSMISSION_WEIGHT, PortType::Float).with_default(PortValue::Float(0.0)),
            Port::input(socket::EMISSION_COLOR, PortType::Color).with_default(PortValue::Color([0.0, 0.0, 0.0, 1.0])),
        ],
        outputs: vec![Port::output(socket::BSDF, PortType::Shader)],
    });

    registry.register(NodeType {
        id: TEX_IMAGE.to_string(),
        name: "Image Texture".to_string(),
        category: NodeCategory::Texture,
        description: "Sample an image".to_string(),
        inputs: vec![Port::input(socket::VECTOR, PortType::Vector3)],
        outputs: vec![
            Port::output(socket::COLOR, PortType::Color),
            Port::output(socket::ALPHA, PortType::Float),
        ],
    });

    registry.register(NodeType {
        id: TEX_COORD.to_string(),
        name: "Texture Coordinate".to_string(),
        category: NodeCategory::Input,
        description: "Mesh texture coordinates".to_string(),
        inputs: vec![],
        outputs: vec![Port::output(socket::UV, PortType::Vector3)],
    });

    registry.register(NodeType {
        id: MAPPING.to_string(),
        name: "Mapping".to_string(),
        category: NodeCategory::Vector,
        description: "Transform texture coordinates".to_string(),
        inputs: vec![
            Port::input(socket::VECTOR, PortType::Vector3),
            Port::input(socket::LOCATION, PortType::Vector3).with_default(PortValue::Vector3([0.0, 0.0, 0.0])),
            Port::input(socket::ROTATION, PortType::Vector3).with_default(PortValue::Vector3([0.0, 0.0, 0.0])),
            Port::input(socket::SCALE, PortType::Vector3).with_default(PortValue::Vector3([1.0, 1.0, 1.0])),
        ],
        outputs: vec![Port::output(socket::VECTOR, PortType::Vector3)],
    });

    registry.register(NodeType {
        id: NORMAL_MAP.to_string(),
        name: "Normal Map".to_string(),
        category: NodeCategory::Vector,
        description: "Decode a tangent-space normal map".to_string(),
        inputs: vec![
            Port::input(socket::STRENGTH, PortType::Float).with_default(PortValue::Float(1.0)),
            Port::input(socket::COLOR, PortType::Color).with_default(PortValue::Color([0.5, 0.5, 1.0, 1.0])),
        ],
        outputs: vec![Port::output(socket::NORMAL, PortType::Vector3)],
    });

    registry
}
