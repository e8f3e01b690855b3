use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imagery", bin_name = "imagery", version, disable_help_subcommand = true)]
#[command(about = "Store image uploads and their resized variants", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Read configuration from this file
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Artifact root directory (overrides storage.root)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub root: Option<PathBuf>,

    /// Skip all writes and deletes, reporting success
    #[arg(long, global = true, help_heading = "Options")]
    pub fake: bool,

    /// Print JSON instead of text
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store an image and derive its variants
    Save(SaveArgs),

    /// Delete every artifact of a resource
    #[command(alias = "rm")]
    Delete {
        prefix: String,
        id: String,
    },

    /// Print the URL of an artifact
    Url {
        prefix: String,

        /// Identity; omitted gives the "missing" URL
        id: Option<String>,

        /// Variant name
        #[arg(long, default_value = "original")]
        variant: String,
    },

    /// List the artifacts of a resource on disk
    Ls {
        prefix: String,
        id: String,
    },

    /// Check whether a file is an image the converter accepts
    Identify {
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Resource prefix, e.g. avatar
    pub prefix: String,

    /// Image file to upload
    pub file: PathBuf,

    /// Identity the resource currently has
    #[arg(long, value_name = "ID")]
    pub current: Option<String>,

    /// Save under this identity
    #[arg(long, value_name = "ID", conflicts_with = "fresh")]
    pub id: Option<String>,

    /// Save under a newly generated identity
    #[arg(long)]
    pub fresh: bool,
}
