//! GraphQL subscriptions over the listing event bus

use async_graphql::{Context, Result, Subscription};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use super::app_state;
use super::types::ListingEventPayload;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Every listing created, updated or deleted from now on
    async fn listing_events(
        &self,
        ctx: &Context<'_>,
    ) -> Result<impl Stream<Item = ListingEventPayload>> {
        let receiver = app_state(ctx)?.events.subscribe();

        let stream = BroadcastStream::new(receiver).filter_map(|item| async move {
            match item {
                Ok(event) => ListingEventPayload::from_event(event),
                Err(err) => {
                    tracing::warn!("GraphQL subscriber lagged: {}", err);
                    None
                }
            }
        });

        Ok(stream)
    }
}
