//! `[project]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [project]
//! mode = "remote"        # "local" (self-authoritative) or "remote"
//! archive = ".teimap"    # Durable archive directory, relative to teimap.toml
//! origin = "main"        # Prefix of correlation ids sent by this process
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::manager::Mode;

/// Project-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Who is authoritative for the base layer.
    pub mode: Mode,

    /// Directory holding the persisted layers.
    pub archive: PathBuf,

    /// Correlation-id prefix for broadcasts this process originates.
    pub origin: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            mode: Mode::Local,
            archive: PathBuf::from(".teimap"),
            origin: "main".to_string(),
        }
    }
}

impl ProjectSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.archive.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "[project] archive must not be empty".into(),
            ));
        }
        if self.origin.trim().is_empty() {
            return Err(ConfigError::Validation(
                "[project] origin must not be empty".into(),
            ));
        }
        Ok(())
    }
}
