//! CLI definition for the formstate command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formstate_fields::Operation;

/// formstate - form state materialization
///
/// Loads collection schemas from a fields directory and turns documents into
/// the flat, path-keyed state an edit form renders from.
#[derive(Parser, Debug)]
#[command(name = "formstate")]
#[command(version)]
#[command(about = "Materialize form state from collection schemas")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Directory holding formstate.{toml,yaml,yml,json}; defaults to the current directory
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Materialize a document's form state and print it as JSON
    Materialize(MaterializeArgs),
    /// List the collections found in a fields directory
    Collections {
        /// Fields directory containing collections/*.yaml
        #[arg(long, value_name = "DIR")]
        fields: PathBuf,
        /// Fail on invalid collection files instead of skipping them
        #[arg(long)]
        strict: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct MaterializeArgs {
    /// Fields directory containing collections/*.yaml
    #[arg(long, value_name = "DIR")]
    pub fields: PathBuf,

    /// Slug of the collection the document belongs to
    #[arg(long)]
    pub collection: String,

    /// Document to materialize (JSON, or YAML by extension)
    #[arg(long, value_name = "FILE")]
    pub document: PathBuf,

    /// Stored UI preferences (collapsed rows per container path)
    #[arg(long, value_name = "FILE")]
    pub preferences: Option<PathBuf>,

    /// Authenticated user editing the document
    #[arg(long, value_name = "FILE")]
    pub user: Option<PathBuf>,

    /// Precomputed visibility per path; paths not listed are visible
    #[arg(long, value_name = "FILE")]
    pub visibility: Option<PathBuf>,

    /// Document id; omit for a new document
    #[arg(long)]
    pub id: Option<String>,

    /// Locale handed to hooks
    #[arg(long, default_value = "en")]
    pub locale: String,

    /// Kind of edit the form is built for
    #[arg(long, default_value = "update")]
    pub operation: Operation,

    /// Write minted row ids back into the document file
    #[arg(long)]
    pub write_back: bool,

    /// Fail on invalid collection files instead of skipping them
    #[arg(long)]
    pub strict: bool,
}
