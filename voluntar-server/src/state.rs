//! Shared application state handed to every handler and resolver.

use crate::realtime::EventBus;
use crate::repository::Store;
use crate::service::auth::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: TokenService,
    pub events: EventBus,
}

impl AppState {
    pub fn new(store: Store, tokens: TokenService, events: EventBus) -> Self {
        Self {
            store,
            tokens,
            events,
        }
    }
}
