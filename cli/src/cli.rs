//! Command-line interface for recdiff

use clap::{Args, Parser, Subcommand};
use recdiff_core::config::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recdiff")]
#[command(about = "Field-level change detection between two tabular snapshots")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this config file instead of recdiff.toml / ~/.recdiff/global.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two CSV files cell by cell
    Compare(CompareArgs),

    /// Track field changes of continuing records, matched by a noise-tolerant identity
    Track(TrackArgs),

    /// Show or initialise recdiff settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Options shared by every command that reads two sources
#[derive(Args, Clone, Default)]
pub struct SourceArgs {
    /// Path to the old CSV file
    pub old: PathBuf,

    /// Path to the new CSV file
    pub new: PathBuf,

    /// Encoding label for the old file (default: UTF-8, falling back to Windows-1252)
    #[arg(long)]
    pub encoding1: Option<String>,

    /// Encoding label for the new file (default: UTF-8, falling back to Windows-1252)
    #[arg(long)]
    pub encoding2: Option<String>,

    /// Field delimiter (default: sniffed from the file)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Output file path, or '-' for stdout
    #[arg(long, default_value = "-")]
    pub output: String,

    /// Limit number of records printed per section
    #[arg(long)]
    pub max_print_rows: Option<usize>,

    /// Apply the tolerant classifier: drop changes that only differ in case, punctuation or spacing
    #[arg(long)]
    pub tolerant: bool,

    /// Do not show the progress spinner
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args, Clone, Default)]
pub struct CompareArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Comma-separated column names to use as primary key
    #[arg(long, value_delimiter = ',', conflicts_with = "identity")]
    pub key: Option<Vec<String>>,

    /// Compare rows by index order (takes precedence over --key)
    #[arg(long)]
    pub ordered: bool,

    /// Column whose normalized value identifies a record
    #[arg(long)]
    pub identity: Option<String>,

    /// Column that tells apart records with the same identity (used verbatim)
    #[arg(long, requires = "identity")]
    pub identity_secondary: Option<String>,

    /// Comma-separated columns to compare (default: all)
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Append a unified raw text diff of the file contents
    #[arg(long)]
    pub include_raw_diff: bool,
}

#[derive(Args, Clone, Default)]
pub struct TrackArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Column whose normalized value identifies a person or entity
    #[arg(long)]
    pub identity: String,

    /// Column that tells apart records with the same identity (used verbatim)
    #[arg(long)]
    pub identity_secondary: Option<String>,

    /// Comma-separated fields to track (default: all)
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Write a default global configuration (~/.recdiff/global.toml)
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Text,
    Markdown,
    Json,
    Summary,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Summary => OutputFormat::Summary,
        }
    }
}
