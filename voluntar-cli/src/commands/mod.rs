//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod listing;
mod session;
mod user;
mod watch;

pub use listing::ListingCommands;
pub use user::UserCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Log in and print an access token
    Login {
        email: String,
        password: String,
    },
    /// User management
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Listing management
    Listings {
        #[command(subcommand)]
        command: ListingCommands,
    },
    /// Print listing changes as they happen
    Watch,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Login { email, password } => session::login(config, &email, &password).await,
        Commands::Users { command } => user::handle_user_command(command, config).await,
        Commands::Listings { command } => listing::handle_listing_command(command, config).await,
        Commands::Watch => watch::watch(config).await,
    }
}
