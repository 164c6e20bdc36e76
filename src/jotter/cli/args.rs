use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jotter")]
#[command(about = "Hierarchical journal with version history", long_about = None)]
#[command(version = crate::cli::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $JOTTER_HOME, then the OS data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data: Option<PathBuf>,

    /// Verbose output (debug logging to stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "n")]
    Create {
        /// Title of the note
        title: String,

        /// Initial content
        #[arg(default_value = "")]
        content: String,

        /// Parent note id or id prefix
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Show the note tree
    #[command(alias = "ls")]
    List,

    /// Print a note
    #[command(alias = "v")]
    View {
        /// Note id or id prefix (defaults to the selected note)
        id: Option<String>,
    },

    /// Commit new content as the next version
    #[command(alias = "e")]
    Edit {
        /// Note id or id prefix
        id: String,

        /// New content
        content: String,
    },

    /// Change a note's title
    Rename {
        /// Note id or id prefix
        id: String,

        /// New title (empty uses the placeholder title)
        title: String,
    },

    /// Move a note under another note, or to the top level
    Mv {
        /// Note id or id prefix
        id: String,

        /// New parent id or prefix (omit to move to the top level)
        parent: Option<String>,
    },

    /// Reposition a note among its siblings
    Order {
        /// Note id or id prefix
        id: String,

        /// Zero-based position among siblings
        index: usize,
    },

    /// Delete a note (its children move up one level)
    #[command(alias = "delete")]
    Rm {
        /// Note id or id prefix
        id: String,
    },

    /// Print the breadcrumb path to a note
    Path {
        /// Note id or id prefix (defaults to the selected note)
        id: Option<String>,
    },

    /// List a note's versions
    History {
        /// Note id or id prefix (defaults to the selected note)
        id: Option<String>,
    },

    /// Append an earlier version as the newest one
    Restore {
        /// Note id or id prefix
        id: String,

        /// Version number to restore
        version: u64,
    },

    /// Select a note for `write`, or clear the selection
    Select {
        /// Note id or id prefix
        #[arg(required_unless_present = "none")]
        id: Option<String>,

        /// Clear the selection
        #[arg(long, conflicts_with = "id")]
        none: bool,
    },

    /// Show selection and save status
    Status,

    /// Repair broken parent links and a stale selection
    Doctor,

    /// Stream stdin into the selected note through autosave
    Write,
}
