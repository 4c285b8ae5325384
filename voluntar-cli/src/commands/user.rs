//! User command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use voluntar_core::domain::user::{Role, User};
use voluntar_core::dto::user::CreateUser;

use crate::config::Config;

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// List the users you can see
    List,
    /// Register a user
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// admin or user (creating an admin needs an admin token)
        #[arg(long)]
        role: Option<Role>,
    },
    /// Delete a user (admin only)
    Delete {
        email: String,
    },
}

pub async fn handle_user_command(command: UserCommands, config: &Config) -> Result<()> {
    let client = config.client().await;

    match command {
        UserCommands::List => {
            let users = client.users().await?;

            if users.is_empty() {
                println!("{}", "No users found.".yellow());
            } else {
                println!("{}", format!("Found {} user(s):", users.len()).bold());
                println!();
                for user in users {
                    print_user(&user);
                }
            }
        }
        UserCommands::Create {
            name,
            email,
            password,
            role,
        } => {
            let user = client
                .create_user(CreateUser {
                    name,
                    email,
                    password,
                    role,
                })
                .await?;

            println!("{}", "✓ User created successfully!".green().bold());
            print_user(&user);
        }
        UserCommands::Delete { email } => {
            let message = client.delete_user(&email).await?;
            println!("{}", format!("✓ {}", message).green().bold());
        }
    }

    Ok(())
}

fn print_user(user: &User) {
    let role = match user.role {
        Role::Admin => user.role.to_string().magenta(),
        Role::User => user.role.to_string().normal(),
    };

    println!(
        "  {:>4}  {}  {}  [{}]",
        user.id.to_string().cyan(),
        user.name.bold(),
        user.email,
        role
    );
}
