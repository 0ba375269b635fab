use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quill_types::CredentialKind;

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Quill: inspect the note client's local store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the store file and store.toml
    #[arg(long, global = true, default_value = ".quill")]
    pub config_dir: PathBuf,

    /// Override the idle timeout before the store file is closed
    #[arg(long, global = true)]
    pub idle_timeout_ms: Option<u64>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the store file, schema version, and record counts
    Info,
    /// Show saved settings
    Settings,
    /// Manage stored credentials
    Credential(CredentialArgs),
    /// Show cached data
    Cache(CacheArgs),
}

#[derive(Args)]
pub struct CredentialArgs {
    #[command(subcommand)]
    pub action: CredentialAction,
}

#[derive(Subcommand)]
pub enum CredentialAction {
    /// List credentials with masked secrets
    List,
    /// Show one credential by index
    Show { index: usize },
    /// Add a credential
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        secret: String,
        /// oauth, sandbox, or dev_token
        #[arg(long, default_value = "oauth")]
        kind: CredentialKind,
    },
    /// Remove the credential at an index
    Remove { index: usize },
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub kind: CacheKind,
}

#[derive(Subcommand)]
pub enum CacheKind {
    /// Cached notebook listing
    Notebooks,
    /// Result of the last search
    Search,
    /// Draft saved after a failed upload
    Recovery,
}
