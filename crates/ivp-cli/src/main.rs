use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ivp")]
#[command(about = "Intraday volume profile CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Build the N-day per-slot profile from a history CSV
    Profile {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// CSV with columns instrument,timestamp,amount
        #[arg(long)]
        csv: String,
    },

    /// Print today's series as of a given exchange-local time
    Live {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// CSV with today's samples
        #[arg(long)]
        csv: String,

        /// Trading day label (YYYYMMDD)
        #[arg(long)]
        day: String,

        /// Exchange-local clock (HH:MM or HH:MM:SS)
        #[arg(long)]
        now: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = ivp_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Profile { config_paths, csv } => {
            commands::profile::run(&config_paths, &csv)?;
        }

        Commands::Live {
            config_paths,
            csv,
            day,
            now,
        } => {
            commands::live::run(&config_paths, &csv, &day, &now)?;
        }
    }

    Ok(())
}

// Logs go to stderr; stdout carries only command output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
