//! Durable archive: the storage collaborator holding persisted layers.
//!
//! The map manager never touches storage itself. Operations return
//! [`Persist`] payloads, and whoever owns the manager writes them here
//! under their well-known keys (`id-map`, `id-map-base`).

mod dir;
mod memory;

use std::path::PathBuf;

use thiserror::Error;

use crate::debug;
use crate::manager::Persist;

pub use dir::DirArchive;
pub use memory::MemoryArchive;

/// Archive access errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("archive entry `{key}` is not a valid id map")]
    Parse {
        key: String,
        source: serde_json::Error,
    },

    #[error("invalid archive key `{0}`")]
    InvalidKey(String),
}

/// Blob store keyed by name.
pub trait Archive {
    /// Read a blob; `None` if it was never written.
    fn read_blob(&self, key: &str) -> Result<Option<String>, ArchiveError>;

    fn write_blob(&mut self, key: &str, data: &str) -> Result<(), ArchiveError>;
}

/// Write every payload an operation returned.
pub fn write_persists(archive: &mut dyn Archive, persists: &[Persist]) -> Result<(), ArchiveError> {
    for persist in persists {
        archive.write_blob(persist.key, &persist.data)?;
        debug!("archive"; "wrote {} ({} bytes)", persist.key, persist.data.len());
    }
    Ok(())
}

/// Keys become file names, so they must be plain names.
fn check_key(key: &str) -> Result<(), ArchiveError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(ArchiveError::InvalidKey(key.to_string()))
    }
}
