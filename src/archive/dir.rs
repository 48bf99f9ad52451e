//! Directory archive: one `<key>.json` file per blob.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Archive, ArchiveError, check_key};
use crate::debug;

/// Archive stored as files under a project directory.
#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    pub fn path(&self, key: &str) -> Result<PathBuf, ArchiveError> {
        check_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

/// Check if file content is the same as new content
fn file_content_matches(path: &Path, content: &str) -> bool {
    path.exists() && fs::read_to_string(path).is_ok_and(|existing| existing == content)
}

impl Archive for DirArchive {
    fn read_blob(&self, key: &str) -> Result<Option<String>, ArchiveError> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ArchiveError::Io(path, e)),
        }
    }

    fn write_blob(&mut self, key: &str, data: &str) -> Result<(), ArchiveError> {
        let path = self.path(key)?;
        if file_content_matches(&path, data) {
            debug!("archive"; "{} unchanged, skipping write", key);
            return Ok(());
        }

        fs::create_dir_all(&self.root).map_err(|e| ArchiveError::Io(self.root.clone(), e))?;

        // Write beside the target, then rename over it.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, data).map_err(|e| ArchiveError::Io(staging.clone(), e))?;
        fs::rename(&staging, &path).map_err(|e| ArchiveError::Io(path, e))
    }
}
