//! CLI argument parsing for the catalog wrapper.
//!
//! The CLI is thin: each command maps onto one catalog operation and prints
//! its result as JSON.
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "simdb",
    version,
    about = "Content-addressed catalog of simulation inputs and outputs",
    after_help = "Parameter sets are JSON objects, given inline or as @file.\n\nExamples:\n  simdb --directory data --filetype nc --executable ./execute.sh create '{\"n\": 3, \"Nx\": 20}'\n  simdb --config simdb.json create @params.json -n 1\n  simdb --config simdb.json count @params.json\n  simdb --config simdb.json table --where '{\"Nx\": 20}'",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Raise log verbosity (-v debug, -vv trace); SIMDB_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Catalog configuration; flags override values from `--config`.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// JSON file with directory, filetype and executable
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Folder holding the input/output pairs
    #[arg(long, value_name = "DIR", global = true)]
    pub directory: Option<PathBuf>,

    /// Extension of the output files
    #[arg(long, value_name = "EXT", global = true)]
    pub filetype: Option<String>,

    /// Program (or command line) that turns an input into an output
    #[arg(long, value_name = "CMD", global = true)]
    pub executable: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the executable unless the output already exists
    Create(IndexedArgs),
    /// Delete the pair and run the executable again
    Recreate(IndexedArgs),
    /// Print the output path, or null if it does not exist (exit 1)
    Select(IndexedArgs),
    /// Check whether the output exists
    Exists(IndexedArgs),
    /// Count contiguous restart outputs starting at 0
    Count(ParamsArgs),
    /// Print the fingerprint of a parameter set
    Fingerprint(ParamsArgs),
    /// List every known parameter set
    Table(TableArgs),
    /// List every materialized input/output pair
    Files,
    /// Delete one pair, or the whole restart chain without -n
    Delete(DeleteArgs),
    /// Delete the catalog directory and everything in it
    DeleteAll,
}

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Parameter set as JSON, or @path to a JSON file
    #[arg(value_name = "PARAMS")]
    pub params: String,
}

#[derive(Args, Debug)]
pub struct IndexedArgs {
    #[command(flatten)]
    pub params: ParamsArgs,

    /// Restart sequence index
    #[arg(short = 'n', long = "index", value_name = "N", default_value_t = 0)]
    pub index: u32,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub params: ParamsArgs,

    /// Restart sequence index; omit to delete every index
    #[arg(short = 'n', long = "index", value_name = "N")]
    pub index: Option<u32>,
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Only list parameter sets containing these key/value pairs
    #[arg(long = "where", value_name = "PARAMS")]
    pub filter: Option<String>,

    /// Also report input files that failed the fingerprint check
    #[arg(long)]
    pub inconsistent: bool,
}
