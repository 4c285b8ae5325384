//! Voluntar CLI
//!
//! Command-line interface for the Voluntar service.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "voluntar")]
#[command(about = "Voluntar volunteering board CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(
        long,
        env = "VOLUNTAR_SERVER_URL",
        default_value = "http://localhost:4000"
    )]
    server: String,

    /// Access token (print one with `voluntar login`)
    #[arg(long, env = "VOLUNTAR_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server,
        token: cli.token,
    };

    handle_command(cli.command, &config).await
}
