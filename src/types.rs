//! Shared result alias and the CLI command surface for the daybook
//! application.
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::{DaybookError, Mood};

/// A specialized Result type for daybook operations.
pub type Result<T> = std::result::Result<T, DaybookError>;

/// Available subcommands for the daybook application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new journal entry
    New {
        /// Entry content, can be markdown formatted
        #[clap(short, long)]
        content: Option<String>,

        /// Path to a file containing the entry's content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Do not open the editor when no content is given
        #[clap(long)]
        no_editor: bool,
    },

    /// Show a single entry by ID
    Show {
        /// ID of the entry to show
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// List entries, newest first
    List(ListEntriesOptions),

    /// Search entries by content or summary
    Search {
        /// Search query text
        query: String,

        /// Limit the number of search results (0 means no limit)
        #[clap(short = 'n', long, default_value_t = 0)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing entry
    Edit(EditEntryOptions),

    /// Delete an entry by ID
    Delete {
        /// ID of the entry to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Show how many entries are stored
    Count,

    /// List entries created inside a date range
    Range {
        /// Range start: epoch milliseconds or YYYY-MM-DD
        start: String,

        /// Range end: epoch milliseconds or YYYY-MM-DD (inclusive)
        end: String,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },
}

/// Options for the `list` subcommand
#[derive(Args)]
pub struct ListEntriesOptions {
    /// Limit the number of entries returned
    #[clap(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Return every entry, ignoring --limit
    #[clap(long)]
    pub all: bool,

    /// Format output as JSON
    #[clap(short, long)]
    pub json: bool,

    /// Only show entry IDs and dates
    #[clap(short, long)]
    pub brief: bool,
}

/// Options for the `edit` subcommand
#[derive(Args)]
pub struct EditEntryOptions {
    /// ID of the entry to edit
    pub id: String,

    /// New content for the entry
    #[clap(short, long)]
    pub content: Option<String>,

    /// Path to a file containing the new entry content
    #[clap(short, long)]
    pub file: Option<PathBuf>,

    /// Open the current content in the editor
    #[clap(short, long)]
    pub edit: bool,

    /// Mood tag to attach (positive, neutral, negative)
    #[clap(long)]
    pub mood: Option<Mood>,

    /// Confidence for the mood tag, in [0, 1]
    #[clap(long)]
    pub mood_score: Option<f64>,

    /// Derived summary text to attach
    #[clap(long)]
    pub summary: Option<String>,
}
