// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for shader node inputs/outputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input socket
    Input,
    /// Output socket
    Output,
}

/// Data type that can flow through a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortType {
    /// Scalar value
    Float,
    /// 3D vector (coordinates, normals, scale)
    Vector3,
    /// RGBA color
    Color,
    /// Closure produced by a shading node
    Shader,
}

impl PortType {
    /// Check if this type can feed a socket of another type
    pub fn can_connect_to(&self, other: &PortType) -> bool {
        if self == other {
            return true;
        }

        match (self, other) {
            // Shader closures only go into shader sockets
            (Self::Shader, _) | (_, Self::Shader) => false,
            // Implicit conversions between data sockets
            (Self::Color, Self::Float) | (Self::Float, Self::Color) => true,
            (Self::Color, Self::Vector3) | (Self::Vector3, Self::Color) => true,
            (Self::Float, Self::Vector3) | (Self::Vector3, Self::Float) => true,
            _ => false,
        }
    }
}

/// A socket on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Socket name, unique per direction on a node
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Data type
    pub port_type: PortType,
    /// Default value used when the input is unlinked
    pub default_value: Option<PortValue>,
    /// Whether multiple connections are allowed
    pub multi_connect: bool,
}

impl Port {
    /// Create a new input port
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Input,
            port_type,
            default_value: None,
            multi_connect: false,
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Output,
            port_type,
            default_value: None,
            multi_connect: true, // Outputs can have multiple connections by default
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: PortValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Copy of this port with a fresh ID, used when instancing a node type
    pub fn instantiate(&self) -> Self {
        Self {
            id: PortId::new(),
            ..self.clone()
        }
    }

    /// Check if a connection to another port is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        // Must be opposite directions
        if self.direction == other.direction {
            return false;
        }

        self.port_type.can_connect_to(&other.port_type)
    }
}

/// Value that can be stored in a socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    /// Float
    Float(f32),
    /// 3D vector
    Vector3([f32; 3]),
    /// Color
    Color([f32; 4]),
}

impl PortValue {
    /// Get the value as a 3D vector, if it is one
    pub fn as_vector3(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vector3(v) => Some(*v),
            _ => None,
        }
    }
}
