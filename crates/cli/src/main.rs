//! KeyGate CLI - Main entry point

use clap::{Parser, Subcommand};
use keygate_cli::{commands, Scenario};
use keygate_engine::EngineConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keygate")]
#[command(about = "KeyGate - key-based execution authorization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new Ed25519 key
    Keygen {
        /// Output file for the hex seed
        #[arg(long, default_value = "keygate.key")]
        output: PathBuf,
    },

    /// Print the key id of a hex-encoded Ed25519 public key
    KeyId {
        /// Public key (64 hex characters)
        public_key: String,
    },

    /// Replay a scenario file against a fresh engine
    Run {
        /// Scenario JSON file
        scenario: PathBuf,
        /// Engine config JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides the configured audit directory
        #[arg(long)]
        audit_dir: Option<PathBuf>,
    },

    /// Verify that no execution in the audit log was dispatched twice
    Audit {
        /// Audit log directory
        #[arg(long, default_value = "./data/audit")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { output } => {
            commands::keygen(&output)?;
        }

        Commands::KeyId { public_key } => {
            let key_id = commands::key_id(&public_key)?;
            println!("{}", key_id);
        }

        Commands::Run {
            scenario,
            config,
            audit_dir,
        } => {
            let mut config = match config {
                Some(path) => EngineConfig::from_file(&path)?,
                None => EngineConfig::default(),
            };
            if let Some(dir) = audit_dir {
                config.audit_dir = dir;
            }

            let scenario = Scenario::from_file(&scenario)?;
            commands::run(&scenario, &config).await?;
        }

        Commands::Audit { dir } => {
            commands::audit(&dir)?;
        }
    }

    Ok(())
}
