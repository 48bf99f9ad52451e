//! In-memory archive.

use rustc_hash::FxHashMap;

use super::{Archive, ArchiveError};

/// Archive kept in memory (tests, ephemeral projects).
#[derive(Debug, Default, Clone)]
pub struct MemoryArchive {
    blobs: FxHashMap<String, String>,
}

impl Archive for MemoryArchive {
    fn read_blob(&self, key: &str) -> Result<Option<String>, ArchiveError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write_blob(&mut self, key: &str, data: &str) -> Result<(), ArchiveError> {
        self.blobs.insert(key.to_string(), data.to_string());
        Ok(())
    }
}
