//! Live listing events
//!
//! Subscribes to the server's `/ws` feed on a background task. Events are
//! delivered over a channel, and every listing change drops the cached
//! listing list. A lost connection is retried at a fixed interval.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use voluntar_core::domain::event::ListingEvent;

use crate::VoluntarClient;
use crate::cache::TtlCache;
use crate::error::{ClientError, Result};

/// How a lost event connection is re-established
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Consecutive failed attempts before giving up
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(2),
        }
    }
}

/// A running event subscription; dropping it stops the background task
#[derive(Debug)]
pub struct EventSubscription {
    receiver: mpsc::Receiver<Result<ListingEvent>>,
    task: JoinHandle<()>,
}

impl EventSubscription {
    /// Next event, an error once reconnecting has failed, or `None` when closed
    pub async fn next(&mut self) -> Option<Result<ListingEvent>> {
        self.receiver.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// `http://host` becomes `ws://host/ws`
pub fn socket_url(base_url: &str) -> String {
    let base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base_url.to_string()
    };

    format!("{}/ws", base.trim_end_matches('/'))
}

impl VoluntarClient {
    pub fn subscribe_events(&self) -> EventSubscription {
        self.subscribe_events_with(ReconnectPolicy::default())
    }

    pub fn subscribe_events_with(&self, policy: ReconnectPolicy) -> EventSubscription {
        let (sender, receiver) = mpsc::channel(64);
        let url = socket_url(&self.base_url);
        let cache = self.cache.clone();

        let task = tokio::spawn(run_subscriber(url, cache, sender, policy));

        EventSubscription { receiver, task }
    }
}

async fn run_subscriber(
    url: String,
    cache: Arc<Mutex<TtlCache>>,
    sender: mpsc::Sender<Result<ListingEvent>>,
    policy: ReconnectPolicy,
) {
    let mut failed_attempts = 0;
    let mut connected_before = false;

    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                failed_attempts = 0;
                tracing::info!("Connected to event stream at {}", url);

                // Anything cached may have changed while we were away
                if connected_before {
                    cache.lock().await.invalidate("listings");
                }
                connected_before = true;

                let (mut write, mut read) = socket.split();
                if let Err(err) = write.send(Message::Text("join".into())).await {
                    tracing::warn!("Failed to join event stream: {}", err);
                }

                while let Some(message) = read.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            match serde_json::from_str::<ListingEvent>(text.as_str()) {
                                Ok(event) => {
                                    if event.touches_listings() {
                                        cache.lock().await.invalidate("listings");
                                    }
                                    if sender.send(Ok(event)).await.is_err() {
                                        return;
                                    }
                                }
                                Err(err) => tracing::warn!("Ignoring unknown event: {}", err),
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(err) => {
                            tracing::warn!("Event stream error: {}", err);
                            break;
                        }
                    }
                }

                tracing::warn!("Event stream disconnected");
            }
            Err(err) => {
                failed_attempts += 1;
                tracing::warn!(
                    "Failed to connect to event stream ({}/{}): {}",
                    failed_attempts,
                    policy.max_attempts,
                    err
                );

                if failed_attempts >= policy.max_attempts {
                    let _ = sender
                        .send(Err(ClientError::ReconnectFailed(policy.max_attempts)))
                        .await;
                    return;
                }
            }
        }

        if sender.is_closed() {
            return;
        }

        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts,
            interval: Duration::from_millis(200),
        }
    }

    async fn serve_once(listener: &TcpListener, frames: &[ListingEvent]) {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();
        for frame in frames {
            let text = serde_json::to_string(frame).unwrap();
            socket.send(Message::Text(text.into())).await.unwrap();
        }
        socket.close(None).await.ok();
    }

    fn welcome(id: &str) -> ListingEvent {
        ListingEvent::Welcome {
            message: "welcome".to_string(),
            connection_id: id.to_string(),
        }
    }

    #[test]
    fn test_socket_url() {
        assert_eq!(socket_url("http://localhost:4000"), "ws://localhost:4000/ws");
        assert_eq!(socket_url("https://example.org/"), "wss://example.org/ws");
    }

    #[tokio::test]
    async fn test_events_are_forwarded_and_invalidate_listings() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = VoluntarClient::new(format!("http://{}", addr));
        client.cache.lock().await.set("listings_list", json!([]));
        client.cache.lock().await.set("users_list", json!([]));

        let server = tokio::spawn(async move {
            serve_once(&listener, &[welcome("a"), ListingEvent::ListingDeleted { id: 3 }]).await;
            serve_once(&listener, &[welcome("b")]).await;
        });

        let mut events = client.subscribe_events_with(fast_policy(5));

        assert_eq!(events.next().await.unwrap().unwrap(), welcome("a"));
        assert_eq!(
            events.next().await.unwrap().unwrap(),
            ListingEvent::ListingDeleted { id: 3 }
        );
        assert!(client.cache.lock().await.get("listings_list").is_none());
        assert!(client.cache.lock().await.get("users_list").is_some());

        // Filled again before the reconnect lands
        client.cache.lock().await.set("listings_list", json!([]));

        assert_eq!(events.next().await.unwrap().unwrap(), welcome("b"));
        assert!(client.cache.lock().await.get("listings_list").is_none());

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = VoluntarClient::new(format!("http://{}", addr));
        let mut events = client.subscribe_events_with(ReconnectPolicy {
            max_attempts: 2,
            interval: Duration::from_millis(10),
        });

        assert!(matches!(
            events.next().await,
            Some(Err(ClientError::ReconnectFailed(2)))
        ));
    }
}
