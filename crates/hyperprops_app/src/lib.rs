// SPDX-License-Identifier: MIT OR Apache-2.0
//! hyperprops - node properties and splatmap-aware GLB export
//!
//! Edits the custom attributes a game runtime reads from exported scenes
//! (node tags, rigidbody and collider settings, LOD distances, shadow flags)
//! and drives the exporter:
//! - Whole-scene export to one file
//! - One file per root node, centred at the origin
//! - Splatmap materials rewritten into export-safe graphs on temporary clones
//!
//! ## Architecture
//!
//! Material graphs live in the `hyperprops_graph` crate. This crate holds
//! the scene model, the attribute state machine and the export pipeline,
//! with the GLB encoder behind the [`exporter::Exporter`] trait.

pub mod attributes;
pub mod cli;
pub mod clone;
pub mod export;
pub mod exporter;
pub mod settings;
pub mod state;
pub mod tags;
