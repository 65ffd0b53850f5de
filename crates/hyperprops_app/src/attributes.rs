// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed custom attributes carried by scene nodes.
//!
//! Attribute names are the contract with the runtime that reads exported
//! files, so keys form a closed set with fixed on-disk spellings. An absent
//! key is a distinct state from any stored value: most flags encode their
//! default by absence.

use hyperprops_graph::SplatLabel;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known attribute keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AttrKey {
    /// Node tag (`node`)
    Node,
    /// Rigidbody kind (`type`)
    Type,
    /// Collider convexity (`convex`)
    Convex,
    /// Collider trigger (`trigger`)
    Trigger,
    /// LOD group scale awareness (`scaleAware`)
    ScaleAware,
    /// LOD child switch distance (`maxDistance`)
    MaxDistance,
    /// Mesh shadow casting (`castShadow`)
    CastShadow,
    /// Mesh shadow receiving (`receiveShadow`)
    ReceiveShadow,
    /// Splatmap export marker (`exp_splatmap`)
    Splatmap,
    /// Derived channel scale (`<label>_scale`), written on export clones
    ChannelScale(SplatLabel),
}

impl AttrKey {
    const FIXED: [AttrKey; 9] = [
        AttrKey::Node,
        AttrKey::Type,
        AttrKey::Convex,
        AttrKey::Trigger,
        AttrKey::ScaleAware,
        AttrKey::MaxDistance,
        AttrKey::CastShadow,
        AttrKey::ReceiveShadow,
        AttrKey::Splatmap,
    ];

    /// On-disk attribute name
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrKey::Node => "node",
            AttrKey::Type => "type",
            AttrKey::Convex => "convex",
            AttrKey::Trigger => "trigger",
            AttrKey::ScaleAware => "scaleAware",
            AttrKey::MaxDistance => "maxDistance",
            AttrKey::CastShadow => "castShadow",
            AttrKey::ReceiveShadow => "receiveShadow",
            AttrKey::Splatmap => "exp_splatmap",
            AttrKey::ChannelScale(label) => label.scale_attribute(),
        }
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute name outside the known set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown attribute: {0}")]
pub struct UnknownAttribute(pub String);

impl FromStr for AttrKey {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::FIXED
            .into_iter()
            .chain(SplatLabel::ALL.into_iter().map(AttrKey::ChannelScale))
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

impl TryFrom<String> for AttrKey {
    type Error = UnknownAttribute;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AttrKey> for String {
    fn from(key: AttrKey) -> Self {
        key.as_str().to_string()
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// String value
    Str(String),
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f32),
}

impl AttrValue {
    /// Convert to a JSON value for embedding as exported extras
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::Str(s) => serde_json::Value::from(s.as_str()),
            AttrValue::Bool(b) => serde_json::Value::from(*b),
            AttrValue::Int(i) => serde_json::Value::from(*i),
            AttrValue::Float(f) => serde_json::Value::from(*f),
        }
    }
}

/// Attribute container: key → typed value, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    map: IndexMap<AttrKey, AttrValue>,
}

impl Attributes {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous one
    pub fn set(&mut self, key: AttrKey, value: AttrValue) {
        self.map.insert(key, value);
    }

    /// Delete a key. Returns the previous value, if any.
    pub fn remove(&mut self, key: AttrKey) -> Option<AttrValue> {
        self.map.shift_remove(&key)
    }

    /// Check if a key is present
    pub fn contains(&self, key: AttrKey) -> bool {
        self.map.contains_key(&key)
    }

    /// Get a raw value
    pub fn get(&self, key: AttrKey) -> Option<&AttrValue> {
        self.map.get(&key)
    }

    /// Get a string value
    pub fn get_str(&self, key: AttrKey) -> Option<&str> {
        match self.map.get(&key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Get a boolean value
    pub fn get_bool(&self, key: AttrKey) -> Option<bool> {
        match self.map.get(&key) {
            Some(AttrValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Get an integer value
    pub fn get_int(&self, key: AttrKey) -> Option<i64> {
        match self.map.get(&key) {
            Some(AttrValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get a float value
    pub fn get_float(&self, key: AttrKey) -> Option<f32> {
        match self.map.get(&key) {
            Some(AttrValue::Float(f)) => Some(*f),
            _ => None,
        }
    }

    /// Iterate over stored attributes
    pub fn iter(&self) -> impl Iterator<Item = (&AttrKey, &AttrValue)> {
        self.map.iter()
    }

    /// Number of stored attributes
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no attribute is stored
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_are_stable() {
        assert_eq!(AttrKey::Splatmap.as_str(), "exp_splatmap");
        assert_eq!(AttrKey::ScaleAware.as_str(), "scaleAware");
        assert_eq!(AttrKey::ChannelScale(SplatLabel::Blue).as_str(), "blue_scale");
        assert_eq!("maxDistance".parse::<AttrKey>(), Ok(AttrKey::MaxDistance));
        assert_eq!("alpha_scale".parse::<AttrKey>(), Ok(AttrKey::ChannelScale(SplatLabel::Alpha)));
        assert!("castshadow".parse::<AttrKey>().is_err());
    }

    #[test]
    fn test_typed_getters() {
        let mut attrs = Attributes::new();
        assert!(attrs.is_empty());
        attrs.set(AttrKey::Node, AttrValue::Str("collider".to_string()));
        attrs.set(AttrKey::Convex, AttrValue::Bool(true));
        attrs.set(AttrKey::MaxDistance, AttrValue::Int(40));

        assert_eq!(attrs.get_str(AttrKey::Node), Some("collider"));
        assert_eq!(attrs.get_bool(AttrKey::Convex), Some(true));
        assert_eq!(attrs.get_int(AttrKey::MaxDistance), Some(40));
        assert_eq!(attrs.get_bool(AttrKey::Node), None);
        assert_eq!(attrs.remove(AttrKey::Convex), Some(AttrValue::Bool(true)));
        assert!(!attrs.contains(AttrKey::Convex));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_serializes_with_disk_names() {
        let mut attrs = Attributes::new();
        attrs.set(AttrKey::CastShadow, AttrValue::Bool(false));
        attrs.set(AttrKey::ChannelScale(SplatLabel::Red), AttrValue::Float(2.0));

        let ron_str = ron::to_string(&attrs).unwrap();
        assert!(ron_str.contains("\"castShadow\""));
        assert!(ron_str.contains("\"red_scale\""));
        let loaded: Attributes = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, attrs);
    }

    #[test]
    fn test_unknown_key_fails_to_load() {
        let result: Result<Attributes, _> = ron::from_str("{\"colour\": Bool(true)}");
        assert!(result.is_err());
    }
}
