use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anvil_manifest_lib::draft::NetworkRefId;

mod cmd;
mod files;
mod output;

/// anvil-manifest - build and check Anvil install manifests
#[derive(Parser)]
#[command(name = "anvil-manifest")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the synthesizer config file
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create the starting draft for a new or existing manifest
  Draft {
    /// Manifest template (known fences, UPSes, suggested identity)
    #[arg(long)]
    template: PathBuf,

    /// Directory of already-provisioned hosts
    #[arg(long)]
    hosts: PathBuf,

    /// Stored manifest to edit
    #[arg(long)]
    record: Option<PathBuf>,

    /// Where to write the draft (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Add or remove networks in a draft
  Network {
    #[command(subcommand)]
    action: NetworkCommand,
  },

  /// Fill untouched network fields from already-provisioned hosts
  Guess {
    /// Draft file, updated in place
    draft: PathBuf,

    /// Directory of already-provisioned hosts
    #[arg(long)]
    hosts: PathBuf,

    /// Field path the user has set (repeatable)
    #[arg(long = "touched")]
    touched: Vec<String>,
  },

  /// Build the request body for submitting a draft
  Build {
    draft: PathBuf,

    #[arg(long)]
    template: PathBuf,

    /// Where to write the body (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Validate a draft and show the pre-submit summary
  Check {
    draft: PathBuf,

    #[arg(long)]
    template: PathBuf,

    /// Name of an existing manifest (repeatable)
    #[arg(long = "existing")]
    existing: Vec<String>,

    /// Name of the manifest being edited
    #[arg(long)]
    editing: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

#[derive(Subcommand)]
enum NetworkCommand {
  /// Add the next network
  Add {
    /// Draft file, updated in place
    draft: PathBuf,
  },

  /// Remove a network by id
  Remove {
    /// Draft file, updated in place
    draft: PathBuf,

    id: NetworkRefId,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = cli.config.as_deref();

  match cli.command {
    Commands::Draft {
      template,
      hosts,
      record,
      output,
    } => cmd::cmd_draft(&template, &hosts, record.as_deref(), output.as_deref(), config),
    Commands::Network { action } => match action {
      NetworkCommand::Add { draft } => cmd::cmd_network_add(&draft, config),
      NetworkCommand::Remove { draft, id } => cmd::cmd_network_remove(&draft, id),
    },
    Commands::Guess { draft, hosts, touched } => cmd::cmd_guess(&draft, &hosts, touched),
    Commands::Build {
      draft,
      template,
      output,
    } => cmd::cmd_build(&draft, &template, output.as_deref()),
    Commands::Check {
      draft,
      template,
      existing,
      editing,
      json,
    } => cmd::cmd_check(&draft, &template, &existing, editing.as_deref(), json),
  }
}
