//! Login command

use anyhow::Result;
use colored::*;

use crate::config::Config;

pub async fn login(config: &Config, email: &str, password: &str) -> Result<()> {
    let client = config.client().await;

    let response = client.login(email, password).await?;

    println!("{}", "✓ Logged in".green().bold());
    println!("  User:  {} ({})", response.user.name.bold(), response.user.email);
    println!("  Role:  {}", response.user.role.to_string().cyan());
    println!();
    println!("{}", "Export the token to use it in later commands:".dimmed());
    println!("  export VOLUNTAR_TOKEN={}", response.token);

    Ok(())
}
