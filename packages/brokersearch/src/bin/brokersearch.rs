//! brokersearch CLI
//!
//! Inspect deployment profiles and dry-run the document mapping.
//!
//! # Usage
//!
//! ```bash
//! # List built-in profiles (or those of a YAML file)
//! brokersearch profiles [--config profiles.yaml]
//!
//! # Show the filter verdict and the document a run record would produce
//! brokersearch transform --profile xpd run.json
//!
//! # Validate a profile file
//! brokersearch check-config profiles.yaml
//!
//! # Print the built-in profiles as YAML v1
//! brokersearch export
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use brokersearch::{InMemoryIndex, IndexSynchronizer, ProfileRegistry, RunRecord};

#[derive(Parser)]
#[command(name = "brokersearch")]
#[command(about = "Run metadata to search index mapping tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List deployment profiles
    Profiles {
        /// Profile file (YAML v1); built-in profiles when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Map one run record without contacting an index
    Transform {
        /// Profile name
        #[arg(short, long)]
        profile: String,

        /// Profile file (YAML v1); built-in profiles when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run record as a JSON object; `-` reads stdin
        record: PathBuf,
    },

    /// Load and validate a profile file
    CheckConfig {
        file: PathBuf,
    },

    /// Print the built-in profiles as YAML
    Export,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profiles { config } => list_profiles(config.as_deref())?,
        Commands::Transform {
            profile,
            config,
            record,
        } => transform(&profile, config.as_deref(), &record)?,
        Commands::CheckConfig { file } => check_config(&file)?,
        Commands::Export => print!("{}", ProfileRegistry::builtin()?.to_yaml()?),
    }

    Ok(())
}

fn load_registry(config: Option<&Path>) -> anyhow::Result<ProfileRegistry> {
    let registry = match config {
        Some(path) => ProfileRegistry::from_yaml(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProfileRegistry::builtin()?,
    };
    Ok(registry)
}

fn list_profiles(config: Option<&Path>) -> anyhow::Result<()> {
    let registry = load_registry(config)?;

    println!("{:<12} {:<20} {:<10} {:>8}  filter", "profile", "index", "id field", "entries");
    for profile in registry.iter() {
        println!(
            "{:<12} {:<20} {:<10} {:>8}  {}",
            profile.beamline(),
            profile.index(),
            profile.id_target(),
            profile.document_map().len(),
            if profile.filter().is_accept_all() {
                "accept all"
            } else {
                "custom"
            }
        );
    }
    Ok(())
}

fn transform(profile_name: &str, config: Option<&Path>, record_path: &Path) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    let profile = registry.get(profile_name)?;

    let raw = if record_path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(record_path)
            .with_context(|| format!("reading {}", record_path.display()))?
    };
    let value: serde_json::Value = serde_json::from_str(&raw).context("parsing run record")?;
    let Some(record) = RunRecord::from_value(value) else {
        bail!("run record must be a JSON object");
    };

    // The in-memory index is never called by prepare; it only fixes the client type
    let index = InMemoryIndex::new();
    match IndexSynchronizer::new(profile, &index).prepare(&record)? {
        Some(action) => {
            info!(profile = profile_name, id = %action.id, "record accepted");
            println!("{}", serde_json::to_string_pretty(&action.to_bulk_value())?);
        }
        None => {
            warn!(profile = profile_name, "record rejected by inclusion filter");
            println!("rejected");
        }
    }
    Ok(())
}

fn check_config(file: &Path) -> anyhow::Result<()> {
    let registry = ProfileRegistry::from_yaml(file)
        .with_context(|| format!("loading {}", file.display()))?;
    println!(
        "{}: {} profile(s) OK ({})",
        file.display(),
        registry.len(),
        registry.names().join(", ")
    );
    Ok(())
}
