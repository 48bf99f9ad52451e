//! Command-line interface module.
//!
//! Every command loads the owner manager from the archive, runs one
//! operation and writes back what the operation asks to persist.

mod args;
pub mod edit;
pub mod show;

pub use args::{Cli, Commands, ShowLayer};

use anyhow::{Context, Result};

use crate::archive::DirArchive;
use crate::config::ProjectConfig;
use crate::manager::MapManager;

/// Open the project archive and rebuild the manager from it.
fn open(config: &ProjectConfig) -> Result<(MapManager, DirArchive)> {
    let archive = DirArchive::new(config.archive_dir());
    let manager = MapManager::load(config.project.mode, &archive)
        .with_context(|| format!("failed to load id map from {}", archive.root().display()))?
        .with_origin(config.project.origin.clone());
    Ok((manager, archive))
}
