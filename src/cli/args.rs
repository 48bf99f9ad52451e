//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::manager::Mode;
use crate::resource::ResourceKind;

/// Identifier-map store for TEI document projects
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: teimap.toml)
    #[arg(short = 'C', long, default_value = "teimap.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Override `[project] mode` (local, remote)
    #[arg(long, global = true, value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// Show map mutations, broadcasts and archive writes
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print a layer (or the merged view) as JSON
    #[command(visible_alias = "s")]
    Show {
        /// Layer to print
        #[arg(short, long, value_enum, default_value = "merged")]
        layer: ShowLayer,
    },

    /// Print the address of a resource id (or the id a reference names)
    #[command(visible_alias = "r")]
    Resolve {
        /// Resource id, or `parent/local#anchor` with --reference
        target: String,

        /// Treat TARGET as a reference instead of a resource id
        #[arg(long)]
        reference: bool,
    },

    /// Add a resource to the durable layer
    #[command(visible_alias = "a")]
    Add {
        /// Local id of the new resource
        local_id: String,

        /// Resource kind (teidoc, text, header, facsimile, source-document, standoff, image)
        #[arg(short, long, value_parser = parse_kind)]
        kind: ResourceKind,

        /// Container to add into (root when omitted)
        #[arg(short, long)]
        parent: Option<String>,

        /// Resource id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Remove resources (tombstoned until check-in in remote mode)
    #[command(visible_alias = "rm")]
    Remove {
        #[arg(required = true, value_name = "RESOURCE_ID")]
        ids: Vec<String>,
    },

    /// Undo a pending removal (remote mode)
    Recover {
        #[arg(required = true, value_name = "RESOURCE_ID")]
        ids: Vec<String>,
    },

    /// Change the local id of a resource within its container
    #[command(visible_alias = "mv-id")]
    Rename {
        old: String,
        new: String,

        /// Container holding the resource (root when omitted)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Move a resource to another container
    #[command(visible_alias = "mv")]
    Move {
        local_id: String,

        /// Destination container
        #[arg(long)]
        to: String,

        /// Current container (root when omitted)
        #[arg(long)]
        from: Option<String>,

        /// New local id at the destination
        #[arg(long = "as", value_name = "LOCAL_ID")]
        rename: Option<String>,
    },

    /// Copy authority entries into the staged layer (remote mode)
    #[command(visible_alias = "co")]
    Checkout {
        #[arg(required = true, value_name = "RESOURCE_ID")]
        ids: Vec<String>,
    },

    /// Accept staged entries into base (remote mode)
    #[command(visible_alias = "ci")]
    Checkin {
        #[arg(required = true, value_name = "RESOURCE_ID")]
        ids: Vec<String>,

        /// The authority accepted these as deletions
        #[arg(long)]
        deleted: bool,
    },

    /// Replace the base layer with an authority snapshot (remote mode)
    Pull {
        /// JSON id map as served by the authority
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Report resource ids placed at more than one address
    Check,
}

/// Layer selector for `show`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowLayer {
    Base,
    Staged,
    Next,
    Merged,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    Mode::parse(s).ok_or_else(|| format!("unknown mode `{s}` (expected local or remote)"))
}

fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    ResourceKind::parse(s).ok_or_else(|| {
        let known: Vec<_> = ResourceKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown kind `{s}` (expected one of: {})", known.join(", "))
    })
}
