//! Core modules of the engine.
//!
//! [`reconcile`] is the only part with real invariants; everything around it
//! loads, scaffolds, persists and renders.

pub mod assets;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod generate;
pub mod mcp_server;
pub mod output;
pub mod reconcile;
pub mod scaffold;
pub mod settings;
pub mod state_file;
