//! Listing command handlers

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use voluntar_core::domain::listing::{Listing, ListingKind};
use voluntar_core::dto::listing::{CreateListing, UpdateListing};

use crate::config::Config;

/// Listing subcommands
#[derive(Subcommand)]
pub enum ListingCommands {
    /// List listings (yours, or all of them with an admin token)
    List {
        /// Read the public board instead; no token needed
        #[arg(long)]
        board: bool,

        /// Only offers or only requests
        #[arg(long)]
        kind: Option<ListingKind>,
    },
    /// Show one listing
    Get {
        id: i64,
    },
    /// Create a listing
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        date: String,

        #[arg(long)]
        description: String,

        /// offer or request
        #[arg(long)]
        kind: ListingKind,

        /// Owner email (admins only; defaults to you)
        #[arg(long)]
        owner: Option<String>,
    },
    /// Change fields of a listing
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        kind: Option<ListingKind>,

        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete a listing
    Delete {
        id: i64,
    },
}

pub async fn handle_listing_command(command: ListingCommands, config: &Config) -> Result<()> {
    let client = config.client().await;

    match command {
        ListingCommands::List { board, kind } => {
            let listings = match (board, kind) {
                (true, Some(kind)) => client.board_by_kind(kind).await?,
                (true, None) => client.board().await?,
                (false, Some(kind)) => client.listings_by_kind(kind).await?,
                (false, None) => client.listings().await?,
            };

            if listings.is_empty() {
                println!("{}", "No listings found.".yellow());
            } else {
                println!("{}", format!("Found {} listing(s):", listings.len()).bold());
                println!();
                for listing in &listings {
                    print_listing_summary(listing);
                }
            }
        }
        ListingCommands::Get { id } => {
            let listing = client.listing(id).await?;
            print_listing_details(&listing);
        }
        ListingCommands::Create {
            title,
            date,
            description,
            kind,
            owner,
        } => {
            let listing = client
                .create_listing(CreateListing {
                    title,
                    owner_email: owner,
                    date,
                    description,
                    kind,
                })
                .await?;

            println!("{}", "✓ Listing created successfully!".green().bold());
            print_listing_details(&listing);
        }
        ListingCommands::Update {
            id,
            title,
            date,
            description,
            kind,
            owner,
        } => {
            let changes = UpdateListing {
                title,
                owner_email: owner,
                date,
                description,
                kind,
            };

            if changes.is_empty() {
                bail!("nothing to update; pass at least one of --title, --date, --description, --kind, --owner");
            }

            let listing = client.update_listing(id, changes).await?;

            println!("{}", "✓ Listing updated successfully!".green().bold());
            print_listing_details(&listing);
        }
        ListingCommands::Delete { id } => {
            let message = client.delete_listing(id).await?;
            println!("{}", format!("✓ {}", message).green().bold());
        }
    }

    Ok(())
}

pub(crate) fn colored_kind(kind: ListingKind) -> ColoredString {
    match kind {
        ListingKind::Offer => kind.to_string().green(),
        ListingKind::Request => kind.to_string().yellow(),
    }
}

pub(crate) fn print_listing_summary(listing: &Listing) {
    println!(
        "  {:>4}  {:<8}  {}  {}  {}",
        listing.id.to_string().cyan(),
        colored_kind(listing.kind),
        listing.date.dimmed(),
        listing.title.bold(),
        listing.owner_email.dimmed()
    );
}

fn print_listing_details(listing: &Listing) {
    println!("  ID:          {}", listing.id.to_string().cyan());
    println!("  Title:       {}", listing.title.bold());
    println!("  Kind:        {}", colored_kind(listing.kind));
    println!("  Date:        {}", listing.date);
    println!("  Owner:       {}", listing.owner_email);
    println!("  Description: {}", listing.description);
    println!(
        "  Created:     {}",
        listing
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
}
