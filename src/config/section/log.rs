//! `[log]` section configuration.
//!
//! ```toml
//! [log]
//! verbose = true    # Same as --verbose
//! ```

use serde::{Deserialize, Serialize};

/// Terminal logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Show debug output (map mutations, broadcasts, archive writes).
    pub verbose: bool,
}
