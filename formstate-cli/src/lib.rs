//! formstate command-line interface.
//!
//! ```text
//! formstate materialize --fields ./fields --collection pages --document page.json
//! formstate collections --fields ./fields
//! ```

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, MaterializeArgs};
pub use commands::{run_collections, run_materialize, CliError};
