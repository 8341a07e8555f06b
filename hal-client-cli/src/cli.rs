use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "halc", about = "Navigate HAL+JSON APIs", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all log output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to a TOML transport config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Accept header sent with every request
    #[arg(long, global = true, env = "HALC_ACCEPT")]
    pub accept: Option<String>,

    /// Whole-request timeout in milliseconds
    #[arg(long, global = true, env = "HALC_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a document, optionally following relations, and print it
    Get {
        /// URL of the starting document
        url: String,

        /// Relation to follow (repeatable, applied in order)
        #[arg(long = "follow", short = 'f', value_name = "REL")]
        follow: Vec<String>,

        /// URI template variable as name=value (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Print only this property of each result
        #[arg(long)]
        property: Option<String>,
    },

    /// List every link of a document
    Links {
        /// URL of the document
        url: String,
    },

    /// Walk a paged collection and print item locations
    Items {
        /// URL of the first page
        url: String,

        /// Stop after this many items
        #[arg(long)]
        limit: Option<usize>,
    },
}
