//! Live event feed

use anyhow::Result;
use colored::*;
use voluntar_core::domain::event::ListingEvent;

use super::listing::print_listing_summary;
use crate::config::Config;

pub async fn watch(config: &Config) -> Result<()> {
    let client = config.client().await;
    let mut events = client.subscribe_events();

    println!(
        "{}",
        format!("Watching {} for listing changes (Ctrl-C to stop)", config.server_url).bold()
    );

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => print_event(&event),
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                return Ok(());
            }
        }
    }
}

fn print_event(event: &ListingEvent) {
    match event {
        ListingEvent::Welcome { connection_id, .. } => {
            println!("{} {}", "● connected".green(), connection_id.dimmed());
        }
        ListingEvent::ListingCreated(listing) => {
            println!("{}", "+ created".green().bold());
            print_listing_summary(listing);
        }
        ListingEvent::ListingUpdated(listing) => {
            println!("{}", "~ updated".yellow().bold());
            print_listing_summary(listing);
        }
        ListingEvent::ListingDeleted { id } => {
            println!("{} {}", "- deleted".red().bold(), id.to_string().cyan());
        }
    }
}
