//! ClinicChat CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP chat gateway
//! - `ask`: Send one message to the medical assistant
//! - `init`: Write a default config file
//! - `status`: Show the effective configuration
//! - `doctor`: Diagnose configuration and provider reachability

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "clinicchat",
    about = "ClinicChat — medical assistant gateway for clinic booking",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of ~/.clinicchat/config.toml
    #[arg(short, long, global = true, env = "CLINICCHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the medical assistant a single question
    Ask {
        /// The question to send
        #[arg(short, long)]
        message: String,

        /// JSON file holding prior turns: [{"role":"user","content":"..."}]
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Status,

    /// Diagnose configuration and provider reachability
    Doctor,
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask { message, history } => {
            commands::ask::run(config_path, message, history).await?
        }
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
