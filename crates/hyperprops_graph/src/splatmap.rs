// SPDX-License-Identifier: MIT OR Apache-2.0
//! Splatmap material rewriting.
//!
//! A splatmap material keys its channel textures by node label
//! (`SPLAT`, `RED`, `GREEN`, `BLUE`, `ALPHA`). Exporters cannot follow
//! arbitrary blend trees, so the material is rebuilt as a single principled
//! shading node with each channel texture wired straight into a fixed input.
//! The runtime recovers the channel meaning from those inputs, and the tiling
//! of each channel from the derived `<label>_scale` values.

use crate::graph::{LinkError, Graph};
use crate::material::Material;
use crate::node::{ImageId, Node, NodeId, NodeRegistry};
use crate::shader::{self, socket};
use indexmap::IndexMap;
use std::fmt;

/// Channel label of a splatmap texture node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SplatLabel {
    /// Blend weights
    Splat,
    /// Red layer
    Red,
    /// Green layer
    Green,
    /// Blue layer, exported as a normal map
    Blue,
    /// Alpha layer
    Alpha,
}

impl SplatLabel {
    /// All labels in export order
    pub const ALL: [SplatLabel; 5] = [
        SplatLabel::Splat,
        SplatLabel::Red,
        SplatLabel::Green,
        SplatLabel::Blue,
        SplatLabel::Alpha,
    ];

    /// Node label as written in the host
    pub fn as_str(&self) -> &'static str {
        match self {
            SplatLabel::Splat => "SPLAT",
            SplatLabel::Red => "RED",
            SplatLabel::Green => "GREEN",
            SplatLabel::Blue => "BLUE",
            SplatLabel::Alpha => "ALPHA",
        }
    }

    /// Parse a node label. Matching is exact, like the host's.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == label)
    }

    /// Shading input the channel texture is wired into
    pub fn target_socket(&self) -> &'static str {
        match self {
            SplatLabel::Splat => socket::BASE_COLOR,
            SplatLabel::Red => socket::SPECULAR_IOR_LEVEL,
            SplatLabel::Green => socket::EMISSION_COLOR,
            SplatLabel::Blue => socket::NORMAL,
            SplatLabel::Alpha => socket::TRANSMISSION_WEIGHT,
        }
    }

    /// Name of the attribute carrying this channel's derived scale
    pub fn scale_attribute(&self) -> &'static str {
        match self {
            SplatLabel::Splat => "splat_scale",
            SplatLabel::Red => "red_scale",
            SplatLabel::Green => "green_scale",
            SplatLabel::Blue => "blue_scale",
            SplatLabel::Alpha => "alpha_scale",
        }
    }
}

impl fmt::Display for SplatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled texture found in a source graph
#[derive(Debug, Clone, PartialEq)]
pub struct SplatChannel {
    /// Texture node in the source graph
    pub texture: NodeId,
    /// Image sampled by the texture
    pub image: Option<ImageId>,
    /// Mean scale of the mapping node feeding the texture, if any
    pub scale: Option<f32>,
}

/// Labelled textures discovered in a source graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplatChannelSet {
    channels: IndexMap<SplatLabel, SplatChannel>,
}

impl SplatChannelSet {
    /// Scan a graph for labelled image-texture nodes.
    ///
    /// When two texture nodes carry the same label, the later one wins,
    /// except that a scale derived from an earlier node is kept if the later
    /// one has no mapping node.
    pub fn scan(graph: &Graph) -> Self {
        let mut channels: IndexMap<SplatLabel, SplatChannel> = IndexMap::new();
        for node in graph.nodes_of_type(shader::TEX_IMAGE) {
            let Some(label) = SplatLabel::from_label(&node.label) else {
                continue;
            };
            let scale = mapping_scale(graph, node).or_else(|| channels.get(&label).and_then(|c| c.scale));
            channels.insert(
                label,
                SplatChannel {
                    texture: node.id,
                    image: node.image,
                    scale,
                },
            );
        }
        Self { channels }
    }

    /// Get the channel for a label
    pub fn get(&self, label: SplatLabel) -> Option<&SplatChannel> {
        self.channels.get(&label)
    }

    /// Number of channels found
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if no channel was found
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Derived scale per label, for labels fed by a mapping node
    pub fn scale_by_label(&self) -> IndexMap<SplatLabel, f32> {
        SplatLabel::ALL
            .into_iter()
            .filter_map(|label| Some((label, self.channels.get(&label)?.scale?)))
            .collect()
    }
}

/// Arithmetic mean of the `Scale` of a mapping node linked into `texture`
fn mapping_scale(graph: &Graph, texture: &Node) -> Option<f32> {
    let mapping = graph
        .upstream_nodes(texture.id)
        .into_iter()
        .find(|n| n.is_type(shader::MAPPING))?;
    let [x, y, z] = mapping
        .input_named(socket::SCALE)?
        .default_value
        .as_ref()?
        .as_vector3()?;
    Some((x + y + z) / 3.0)
}

/// Precondition failure on the node being transformed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Node has no material
    #[error("Splatmap object '{owner}' has no materials")]
    NoMaterial {
        /// Name of the offending scene node
        owner: String,
    },

    /// Node has more than one material
    #[error("Splatmap object '{owner}' has more than one material ({count})")]
    MultipleMaterials {
        /// Name of the offending scene node
        owner: String,
        /// Number of material slots
        count: usize,
    },
}

/// Error while transforming a material
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Source failed validation; nothing was built
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Registry lacks a node type the export graph needs
    #[error("Shader node type not registered: {0}")]
    UnknownNodeType(String),

    /// Export graph could not be linked
    #[error("Failed to link export graph: {0}")]
    Link(#[from] LinkError),
}

/// Output of a successful transform
#[derive(Debug, Clone)]
pub struct TransformedMaterial {
    /// New export-safe material, not yet registered anywhere
    pub material: Material,
    /// Derived scale per channel label
    pub scale_by_label: IndexMap<SplatLabel, f32>,
}

/// Rebuilds splatmap materials into export-safe graphs
#[derive(Debug, Clone)]
pub struct SplatmapTransformer {
    registry: NodeRegistry,
}

impl SplatmapTransformer {
    /// Create a transformer over the standard shader registry
    pub fn new() -> Self {
        Self::with_registry(shader::create_shader_registry())
    }

    /// Create a transformer over a custom registry
    pub fn with_registry(registry: NodeRegistry) -> Self {
        Self { registry }
    }

    /// Check that the owner has exactly one material
    pub fn validate(owner: &str, material_count: usize) -> Result<(), ValidationError> {
        match material_count {
            0 => Err(ValidationError::NoMaterial { owner: owner.to_string() }),
            1 => Ok(()),
            count => Err(ValidationError::MultipleMaterials {
                owner: owner.to_string(),
                count,
            }),
        }
    }

    /// Transform the single material of `owner`.
    ///
    /// The source material is only read; on error nothing has been created.
    pub fn transform(
        &self,
        owner: &str,
        materials: &[&Material],
    ) -> Result<TransformedMaterial, TransformError> {
        Self::validate(owner, materials.len())?;
        let source = materials[0];

        let channels = SplatChannelSet::scan(&source.graph);
        let name = format!("{}_splatmap_converted", source.name);
        let graph = self.build_graph(&name, &channels)?;

        Ok(TransformedMaterial {
            material: Material::with_graph(name, graph),
            scale_by_label: channels.scale_by_label(),
        })
    }

    /// Build the export graph for a channel set
    pub fn build_graph(&self, name: &str, channels: &SplatChannelSet) -> Result<Graph, TransformError> {
        let mut graph = Graph::new(name);

        let principled = graph.add_node(self.create(shader::BSDF_PRINCIPLED)?);
        let output = graph.add_node(self.create(shader::OUTPUT_MATERIAL)?.with_position(300.0, 0.0));
        graph.connect_named(principled, socket::BSDF, output, socket::SURFACE)?;

        for (row, label) in SplatLabel::ALL.into_iter().enumerate() {
            let Some(channel) = channels.get(label) else {
                continue;
            };

            let y = row as f32 * -300.0;
            let mut texture = self.create(shader::TEX_IMAGE)?
                .with_label(label.as_str())
                .with_position(-600.0, y);
            texture.image = channel.image;
            let texture = graph.add_node(texture);

            if label == SplatLabel::Blue {
                let normal_map = graph.add_node(self.create(shader::NORMAL_MAP)?.with_position(-250.0, y));
                graph.connect_named(texture, socket::COLOR, normal_map, socket::COLOR)?;
                graph.connect_named(normal_map, socket::NORMAL, principled, socket::NORMAL)?;
            } else {
                graph.connect_named(texture, socket::COLOR, principled, label.target_socket())?;
            }
        }

        Ok(graph)
    }

    fn create(&self, type_id: &str) -> Result<Node, TransformError> {
        self.registry
            .create_node(type_id)
            .ok_or_else(|| TransformError::UnknownNodeType(type_id.to_string()))
    }
}

impl Default for SplatmapTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortValue;

    /// Source graph with labelled textures; `scaled` labels get a mapping node
    fn splat_material(labels: &[(SplatLabel, Option<[f32; 3]>)]) -> (Material, IndexMap<SplatLabel, ImageId>) {
        let registry = shader::create_shader_registry();
        let mut material = Material::new("Terrain");
        let mut images = IndexMap::new();
        let coords = material.graph.add_node(registry.create_node(shader::TEX_COORD).unwrap());

        for (label, scale) in labels {
            let image = ImageId::new();
            images.insert(*label, image);
            let tex = registry.create_node(shader::TEX_IMAGE).unwrap()
                .with_label(label.as_str())
                .with_image(image);
            let tex = material.graph.add_node(tex);

            if let Some(scale) = scale {
                let mut mapping = registry.create_node(shader::MAPPING).unwrap();
                mapping.set_input_default(socket::SCALE, PortValue::Vector3(*scale));
                let mapping = material.graph.add_node(mapping);
                material.graph.connect_named(coords, socket::UV, mapping, socket::VECTOR).unwrap();
                material.graph.connect_named(mapping, socket::VECTOR, tex, socket::VECTOR).unwrap();
            }
        }
        (material, images)
    }

    fn only<'a>(graph: &'a Graph, type_id: &'a str) -> &'a Node {
        let mut nodes = graph.nodes_of_type(type_id);
        let node = nodes.next().expect("node of type");
        assert!(nodes.next().is_none(), "more than one {type_id}");
        node
    }

    #[test]
    fn test_no_material_is_rejected() {
        let result = SplatmapTransformer::new().transform("Ground", &[]);
        assert!(matches!(
            result,
            Err(TransformError::Validation(ValidationError::NoMaterial { ref owner })) if owner == "Ground"
        ));
    }

    #[test]
    fn test_multiple_materials_leave_sources_untouched() {
        let (a, _) = splat_material(&[(SplatLabel::Splat, Some([1.0, 1.0, 1.0]))]);
        let (b, _) = splat_material(&[(SplatLabel::Red, None)]);
        let before = (a.clone(), b.clone());

        let result = SplatmapTransformer::new().transform("Ground", &[&a, &b]);
        assert!(matches!(
            result,
            Err(TransformError::Validation(ValidationError::MultipleMaterials { count: 2, .. }))
        ));
        assert_eq!(before, (a, b));
    }

    #[test]
    fn test_blue_routes_through_normal_map() {
        let (source, images) = splat_material(&[
            (SplatLabel::Splat, None),
            (SplatLabel::Blue, Some([2.0, 4.0, 6.0])),
        ]);
        let before = source.clone();

        let out = SplatmapTransformer::new().transform("Ground", &[&source]).unwrap();
        let graph = &out.material.graph;
        assert_eq!(source, before);
        assert_eq!(out.material.name, "Terrain_splatmap_converted");
        assert_ne!(out.material.id, source.id);

        let principled = only(graph, shader::BSDF_PRINCIPLED);
        let output = only(graph, shader::OUTPUT_MATERIAL);
        let normal_map = only(graph, shader::NORMAL_MAP);
        assert!(graph.is_linked(principled.id, output.id, socket::SURFACE));

        let blue = graph.nodes_of_type(shader::TEX_IMAGE).find(|n| n.label == "BLUE").unwrap();
        assert!(graph.is_linked(blue.id, normal_map.id, socket::COLOR));
        assert!(graph.is_linked(normal_map.id, principled.id, socket::NORMAL));
        assert!(!graph.is_linked(blue.id, principled.id, socket::NORMAL));
        assert_eq!(blue.image, Some(images[&SplatLabel::Blue]));

        let splat = graph.nodes_of_type(shader::TEX_IMAGE).find(|n| n.label == "SPLAT").unwrap();
        assert!(graph.is_linked(splat.id, principled.id, socket::BASE_COLOR));
        assert_eq!(splat.image, Some(images[&SplatLabel::Splat]));

        assert_eq!(out.scale_by_label.get(&SplatLabel::Blue), Some(&4.0));
        assert!(!out.scale_by_label.contains_key(&SplatLabel::Splat));
    }

    #[test]
    fn test_all_channels_wired_to_fixed_inputs() {
        let labels: Vec<_> = SplatLabel::ALL.iter().map(|l| (*l, None)).collect();
        let (source, _) = splat_material(&labels);

        let out = SplatmapTransformer::new().transform("Ground", &[&source]).unwrap();
        let graph = &out.material.graph;
        // shading + output + five textures + normal map
        assert_eq!(graph.node_count(), 8);
        // surface + four direct + two through the normal map
        assert_eq!(graph.link_count(), 7);

        let principled = only(graph, shader::BSDF_PRINCIPLED);
        for label in [SplatLabel::Splat, SplatLabel::Red, SplatLabel::Green, SplatLabel::Alpha] {
            let tex = graph.nodes_of_type(shader::TEX_IMAGE).find(|n| n.label == label.as_str()).unwrap();
            assert!(graph.is_linked(tex.id, principled.id, label.target_socket()), "{label}");
        }
        assert!(out.scale_by_label.is_empty());
    }

    #[test]
    fn test_unlabelled_and_foreign_nodes_are_ignored() {
        let registry = shader::create_shader_registry();
        let mut source = Material::new("Rock");
        source.graph.add_node(registry.create_node(shader::TEX_IMAGE).unwrap().with_label("DETAIL"));
        source.graph.add_node(registry.create_node(shader::TEX_IMAGE).unwrap());
        source.graph.add_node(registry.create_node(shader::MAPPING).unwrap().with_label("RED"));
        source.graph.add_node(registry.create_node(shader::TEX_IMAGE).unwrap().with_label("red"));

        let channels = SplatChannelSet::scan(&source.graph);
        assert!(channels.is_empty());

        let out = SplatmapTransformer::new().transform("Rock", &[&source]).unwrap();
        assert_eq!(out.material.graph.node_count(), 2);
        assert_eq!(out.material.graph.link_count(), 1);
    }

    #[test]
    fn test_duplicate_label_keeps_earlier_scale() {
        let (mut source, _) = splat_material(&[(SplatLabel::Splat, Some([2.0, 2.0, 2.0]))]);
        let registry = shader::create_shader_registry();
        let image = ImageId::new();
        let later = source.graph.add_node(
            registry.create_node(shader::TEX_IMAGE).unwrap()
                .with_label(SplatLabel::Splat.as_str())
                .with_image(image),
        );

        let channels = SplatChannelSet::scan(&source.graph);
        let splat = channels.get(SplatLabel::Splat).unwrap();
        assert_eq!(splat.texture, later);
        assert_eq!(splat.image, Some(image));
        assert_eq!(splat.scale, Some(2.0));

        let out = SplatmapTransformer::new().transform("Ground", &[&source]).unwrap();
        assert_eq!(out.scale_by_label.get(&SplatLabel::Splat), Some(&2.0));
    }

    #[test]
    fn test_missing_node_type_is_reported() {
        let (source, _) = splat_material(&[(SplatLabel::Splat, None)]);
        let transformer = SplatmapTransformer::with_registry(NodeRegistry::new());
        let result = transformer.transform("Ground", &[&source]);
        assert!(matches!(result, Err(TransformError::UnknownNodeType(_))));
    }

    #[test]
    fn test_label_round_trip() {
        for label in SplatLabel::ALL {
            assert_eq!(SplatLabel::from_label(label.as_str()), Some(label));
            assert_eq!(label.scale_attribute(), format!("{}_scale", label.as_str().to_lowercase()));
        }
        assert_eq!(SplatLabel::from_label("Splat"), None);
    }
}
