// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line front end.

use crate::export::{ExportError, ExportOrchestrator};
use crate::exporter::ManifestExporter;
use crate::settings::{ExportSettings, SettingsError};
use crate::state::{EntityId, SceneContext, SceneData, SceneIoError};
use crate::tags::{self, BoolFlag, NodeTag, RigidbodyKind, TagError, TagStore, TagView};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Node properties and splatmap-aware GLB export for scene files
#[derive(Parser, Debug)]
#[command(name = "hyperprops", author, version, about, long_about = None)]
pub struct Args {
    /// Scene file (RON)
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,

    /// Increase logging verbosity (default: info, -v: debug, -vv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operation to run on the scene
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the node hierarchy with tags and attributes
    Inspect,

    /// Set a node's tag (none, rigidbody, collider, lod, snap)
    SetTag {
        /// Node name
        node: String,
        /// New tag
        tag: NodeTag,
    },

    /// Set a rigidbody's type (static, kinematic, dynamic)
    SetRigidbody {
        /// Node name
        node: String,
        /// Rigidbody type
        kind: RigidbodyKind,
    },

    /// Flip a boolean attribute (convex, trigger, scaleAware, castShadow, receiveShadow, exp_splatmap)
    Toggle {
        /// Node name
        node: String,
        /// Attribute name
        flag: BoolFlag,
    },

    /// Show or set the LOD switch distance of a LOD group child; 0 clears it
    MaxDistance {
        /// Node name
        node: String,
        /// New distance
        value: Option<u32>,
    },

    /// Export the whole visible scene to one file
    ExportAll,

    /// Export every visible root node to its own file
    ExportIndividual,
}

/// Top-level failure
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Scene file could not be read or written
    #[error(transparent)]
    Scene(#[from] SceneIoError),

    /// Settings file could not be read
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Property edit rejected
    #[error(transparent)]
    Tag(#[from] TagError),

    /// Export failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// No node with the given name
    #[error("No node named '{0}'")]
    UnknownNode(String),
}

/// Execute one command against the scene file
pub fn run(args: Args) -> Result<(), AppError> {
    let mut ctx = SceneContext::load(&args.scene)?;

    match args.command {
        Command::Inspect => {
            for line in inspect(&ctx.scene)? {
                println!("{line}");
            }
        }
        Command::SetTag { node, tag } => {
            let id = find(&ctx.scene, &node)?;
            store(&mut ctx.scene, &node, |s| s.set_tag(id, tag))?;
            ctx.save_to_path(&args.scene)?;
        }
        Command::SetRigidbody { node, kind } => {
            let id = find(&ctx.scene, &node)?;
            store(&mut ctx.scene, &node, |s| s.set_rigidbody_kind(id, kind))?;
            ctx.save_to_path(&args.scene)?;
        }
        Command::Toggle { node, flag } => {
            let id = find(&ctx.scene, &node)?;
            let value = store(&mut ctx.scene, &node, |s| s.toggle_flag(id, flag))?;
            println!("{node}: {flag} = {value}");
            ctx.save_to_path(&args.scene)?;
        }
        Command::MaxDistance { node, value: None } => {
            let id = find(&ctx.scene, &node)?;
            let value = TagView::new(&ctx.scene).max_distance(id)?;
            println!("{node}: maxDistance = {value}");
        }
        Command::MaxDistance {
            node,
            value: Some(value),
        } => {
            let id = find(&ctx.scene, &node)?;
            store(&mut ctx.scene, &node, |s| s.set_max_distance(id, value))?;
            ctx.save_to_path(&args.scene)?;
        }
        Command::ExportAll => {
            let settings = ExportSettings::load_or_default(ctx.project_path.as_deref())?;
            let report = ExportOrchestrator::new(settings)
                .export_all(&mut ctx, &mut ManifestExporter::default())?;
            println!("{report}");
        }
        Command::ExportIndividual => {
            let settings = ExportSettings::load_or_default(ctx.project_path.as_deref())?;
            let report = ExportOrchestrator::new(settings)
                .export_individual(&mut ctx, &mut ManifestExporter::default())?;
            println!("{report}");
            for failure in &report.failures {
                println!("  {}: {}", failure.root, failure.error);
            }
        }
    }

    Ok(())
}

fn find(scene: &SceneData, name: &str) -> Result<EntityId, AppError> {
    scene
        .find_by_name(name)
        .ok_or_else(|| AppError::UnknownNode(name.to_string()))
}

/// Run one edit through a tag store that logs every change
fn store<T>(
    scene: &mut SceneData,
    name: &str,
    edit: impl FnOnce(&mut TagStore<'_>) -> Result<T, TagError>,
) -> Result<T, TagError> {
    let mut log = |_: EntityId| tracing::info!("Updated '{}'", name);
    let mut store = TagStore::new(scene).with_observer(&mut log);
    edit(&mut store)
}

/// One line per node, indented by depth
fn inspect(scene: &SceneData) -> Result<Vec<String>, TagError> {
    let view = TagView::new(scene);
    let mut order = Vec::new();
    for root in scene.root_entities() {
        order.push((root, 0));
        walk(scene, root, 1, &mut order);
    }

    let mut lines = Vec::with_capacity(order.len());
    for (id, depth) in order {
        let Some(node) = scene.get(&id) else {
            continue;
        };
        let mut line = format!("{}{} [{}]", "  ".repeat(depth), node.name, tags::display_name(node));
        if !node.visible {
            line.push_str(" (hidden)");
        }
        for (key, value) in node.attributes.iter() {
            line.push_str(&format!(" {key}={}", value.to_json()));
        }
        let offered: Vec<String> = NodeTag::offered_for(node.kind).iter().map(|t| t.to_string()).collect();
        line.push_str(&format!("  tags: {}", offered.join("|")));
        if view.is_lod_child(id)? {
            line.push_str("  lod child");
        }
        lines.push(line);
    }
    Ok(lines)
}

fn walk(scene: &SceneData, id: EntityId, depth: usize, out: &mut Vec<(EntityId, usize)>) {
    let Some(node) = scene.get(&id) else {
        return;
    };
    for child in &node.children {
        out.push((*child, depth));
        walk(scene, *child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EntityData;

    #[test]
    fn test_parse_commands() {
        let args = Args::try_parse_from(["hyperprops", "level.ron", "set-tag", "Crate", "rigidbody"]).unwrap();
        assert!(matches!(args.command, Command::SetTag { ref node, tag: NodeTag::Rigidbody } if node == "Crate"));

        let args = Args::try_parse_from(["hyperprops", "level.ron", "toggle", "Ground", "exp_splatmap"]).unwrap();
        assert!(matches!(args.command, Command::Toggle { flag: BoolFlag::Splatmap, .. }));

        let args = Args::try_parse_from(["hyperprops", "-v", "level.ron", "max-distance", "LOD0"]).unwrap();
        assert_eq!(args.verbosity, 1);
        assert!(matches!(args.command, Command::MaxDistance { value: None, .. }));

        assert!(Args::try_parse_from(["hyperprops", "level.ron", "set-tag", "Crate", "group"]).is_err());
    }

    #[test]
    fn test_inspect_lists_hierarchy() {
        let mut scene = SceneData::new();
        let group = scene.add_entity(EntityData::new("Trees"));
        TagStore::new(&mut scene).set_tag(group, NodeTag::LodGroup).unwrap();
        let near = scene.add_mesh_object("Near", Some(group), Vec::new());
        TagStore::new(&mut scene).set_max_distance(near, 25).unwrap();

        let lines = inspect(&scene).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Trees [LOD] node=\"lod\""));
        assert!(lines[1].starts_with("  Near [Mesh] maxDistance=25"));
        assert!(lines[1].ends_with("tags: none|collider  lod child"));
    }

    #[test]
    fn test_run_edits_and_saves() {
        let dir = std::env::temp_dir().join(format!("hyperprops-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("level.ron");
        let mut scene = SceneData::new();
        scene.add_entity(EntityData::new("Crate"));
        SceneContext::new(scene).save_to_path(&path).unwrap();

        let path_arg = path.to_string_lossy().to_string();
        run(Args::try_parse_from(["hyperprops", &path_arg, "set-tag", "Crate", "rigidbody"]).unwrap()).unwrap();
        run(Args::try_parse_from(["hyperprops", &path_arg, "set-rigidbody", "Crate", "dynamic"]).unwrap()).unwrap();

        let mut ctx = SceneContext::load(&path).unwrap();
        let id = ctx.scene.find_by_name("Crate").unwrap();
        let store = TagStore::new(&mut ctx.scene);
        assert_eq!(store.tag(id).unwrap(), NodeTag::Rigidbody);
        assert_eq!(store.rigidbody_kind(id).unwrap(), RigidbodyKind::Dynamic);

        let missing = run(Args::try_parse_from(["hyperprops", &path_arg, "toggle", "Barrel", "convex"]).unwrap());
        assert!(matches!(missing, Err(AppError::UnknownNode(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_export_writes_manifest() {
        let dir = std::env::temp_dir().join(format!("hyperprops-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("level.ron");
        let mut scene = SceneData::new();
        scene.add_entity(EntityData::new("Crate"));
        SceneContext::new(scene).save_to_path(&path).unwrap();

        let path_arg = path.to_string_lossy().to_string();
        run(Args::try_parse_from(["hyperprops", &path_arg, "export-individual"]).unwrap()).unwrap();

        let manifest = ManifestExporter::manifest_path(&dir.join("exported_glbs").join("Crate.glb"));
        assert!(manifest.is_file());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
