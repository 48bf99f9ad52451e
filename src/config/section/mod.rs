//! Configuration section definitions.
//!
//! | Section     | File         |
//! |-------------|--------------|
//! | `[project]` | `project.rs` |
//! | `[log]`     | `log.rs`     |

mod log;
mod project;

pub use log::LogSection;
pub use project::ProjectSection;
