//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use texhub_core::analysis::SortOrder;
use texhub_core::model::Category;

#[derive(Debug, Parser)]
#[command(name = "texhub", version, about = "Incremental texture catalog for material-driven project trees")]
pub struct Cli {
    /// Project root (contains `Assets/` and optionally `texhub.toml`).
    #[arg(long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Log at DEBUG instead of INFO.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a full scan and prune records that were not seen.
    Scan {
        /// Clear the catalog before scanning.
        #[arg(long)]
        rebuild: bool,
    },

    /// Rescan specific materials after they changed. Never prunes.
    /// Relative paths are resolved against the project root.
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the records of one category.
    List {
        category: Category,

        #[arg(long, default_value_t = SortOrder::Name)]
        sort: SortOrder,

        /// Case-insensitive substring of the location.
        #[arg(long)]
        search: Option<String>,

        /// Show ignored textures too.
        #[arg(long)]
        include_ignored: bool,

        /// Show every record instead of one per content hash.
        #[arg(long)]
        all_duplicates: bool,
    },

    /// Report textures with identical content.
    Duplicates,

    /// Manage the ignore list.
    Ignore {
        #[command(subcommand)]
        action: IgnoreAction,
    },

    /// Copy textures (or folders of textures) into a category folder, then scan.
    /// Relative paths are resolved against the project root.
    Add {
        category: Category,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Write the catalog as CSV.
    Export {
        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Create every category folder.
    Folders,
}

#[derive(Debug, Subcommand)]
pub enum IgnoreAction {
    Add { identity: String },
    Remove { identity: String },
    List,
}
