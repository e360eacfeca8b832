use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database root directory
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Maximum wait for a table lock in milliseconds (0 = forever)
    #[arg(long, default_value_t = 5000)]
    pub lock_timeout_ms: u64,

    /// Reclaim lock markers older than this many milliseconds
    #[arg(long)]
    pub stale_lock_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tables
    Tables,

    /// Print a table's schema as JSON
    Show {
        table: String,
    },

    /// Create a table if it does not exist
    CreateTable {
        table: String,

        /// Column as NAME:TYPE (text, integer, float, boolean); repeatable
        #[arg(short, long = "column", required = true)]
        columns: Vec<String>,

        /// Unique column name; repeatable
        #[arg(short, long)]
        unique: Vec<String>,
    },

    /// Insert one row given as a JSON object
    Insert {
        table: String,
        data: String,
    },

    /// Print matching rows as JSON lines
    Select {
        table: String,

        /// Equality filter as a JSON object
        #[arg(short = 'w', long = "where")]
        filter: Option<String>,

        /// Columns to print (comma-separated)
        #[arg(long)]
        fields: Option<String>,

        /// Maximum rows to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Merge a JSON object into matching rows
    Update {
        table: String,

        /// Equality filter as a JSON object
        #[arg(short = 'w', long = "where")]
        filter: Option<String>,

        /// Values to set as a JSON object
        #[arg(short, long)]
        set: String,

        /// Allow a missing filter to match every row
        #[arg(long)]
        all: bool,
    },

    /// Delete matching rows
    Delete {
        table: String,

        /// Equality filter as a JSON object
        #[arg(short = 'w', long = "where")]
        filter: Option<String>,

        /// Allow a missing filter to match every row
        #[arg(long)]
        all: bool,
    },
}
