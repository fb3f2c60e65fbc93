use crate::bridge::RealtimeSession;
use crate::error::{Result, SlackFeedError};
use crate::slack::{RawMessage, SlackClient};
use dashmap::DashMap;
use slack_morphism::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// How long a delivered event is remembered for deduplication
const DEDUP_WINDOW: Duration = Duration::from_secs(3600);

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}

#[derive(Clone)]
struct ListenerState {
    events: broadcast::Sender<RawMessage>,
    processed_events: Arc<DashMap<String, Instant>>,
}

impl ListenerState {
    /// Publish a message unless this exact delivery was already seen
    fn publish(&self, raw: RawMessage) -> bool {
        let event_key = raw.event_key();
        if let Some(last_seen) = self.processed_events.get(&event_key) {
            tracing::debug!(
                event_key = %event_key,
                last_seen_ago = format_duration(last_seen.elapsed()),
                "Duplicate event detected, skipping"
            );
            return false;
        }
        self.processed_events.insert(event_key.clone(), Instant::now());

        match self.events.send(raw) {
            Ok(receivers) => {
                tracing::debug!(event_key = %event_key, receivers, "Message event published");
            }
            Err(_) => {
                tracing::debug!(event_key = %event_key, "No subscribers for message event");
            }
        }
        true
    }

    /// Forget deliveries older than the deduplication window
    fn cleanup_old_events(&self) {
        let mut removed = 0;

        self.processed_events.retain(|_key, instant| {
            let keep = instant.elapsed() < DEDUP_WINDOW;
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            tracing::debug!(removed_count = removed, "Cleaned up old events from cache");
        }
    }
}

/// Convert a Slack message event into its wire representation
fn raw_message(event: &SlackMessageEvent) -> Result<RawMessage> {
    let value = serde_json::to_value(event)?;
    Ok(serde_json::from_value(value)?)
}

/// Realtime session over Slack Socket Mode
///
/// Every `open` builds a fresh listener; message events from all listeners
/// land on the same broadcast channel.
pub struct SocketModeSession {
    slack_client: Arc<SlackClient>,
    state: ListenerState,
    listener: Option<SlackClientSocketModeListener<SlackClientHyperHttpsConnector>>,
}

impl SocketModeSession {
    pub fn new(slack_client: Arc<SlackClient>, events: broadcast::Sender<RawMessage>) -> Self {
        Self {
            slack_client,
            state: ListenerState {
                events,
                processed_events: Arc::new(DashMap::new()),
            },
            listener: None,
        }
    }

    async fn handle_push_event(
        event: SlackPushEventCallback,
        _client: Arc<SlackHyperClient>,
        user_state: SlackClientEventsUserState,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let state: ListenerState = {
            let storage = user_state.read().await;
            storage
                .get_user_state::<ListenerState>()
                .ok_or_else(|| SlackFeedError::Internal("listener state not set".to_string()))?
                .clone()
        };

        state.cleanup_old_events();

        match event.event {
            SlackEventCallbackBody::Message(message) => {
                tracing::debug!(
                    channel = ?message.origin.channel,
                    user = ?message.sender.user,
                    subtype = ?message.subtype,
                    "Message event received"
                );

                match raw_message(&message) {
                    Ok(raw) => {
                        state.publish(raw);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not decode message event");
                    }
                }
            }
            _ => {
                tracing::debug!("Unhandled event type");
            }
        }

        Ok(())
    }

    fn error_handler(
        err: Box<dyn std::error::Error + Send + Sync>,
        _client: Arc<SlackHyperClient>,
        _states: SlackClientEventsUserState,
    ) -> HttpStatusCode {
        tracing::error!(
            error = %err,
            error_kind = std::any::type_name_of_val(&*err),
            "Slack event error"
        );
        HttpStatusCode::OK
    }
}

impl RealtimeSession for SocketModeSession {
    async fn open(&mut self) -> Result<()> {
        tracing::debug!("Creating listener environment");
        let listener_environment = Arc::new(
            SlackClientEventsListenerEnvironment::new(self.slack_client.get_client())
                .with_error_handler(Self::error_handler)
                .with_user_state(self.state.clone()),
        );

        let callbacks =
            SlackSocketModeListenerCallbacks::new().with_push_events(Self::handle_push_event);

        let listener = SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment,
            callbacks,
        );

        tracing::info!("Connecting to Slack via Socket Mode");
        listener
            .listen_for(self.slack_client.get_app_token())
            .await
            .map_err(|e| SlackFeedError::Session(e.to_string()))?;

        listener.start().await;
        self.listener = Some(listener);

        tracing::info!("Connected to Slack Socket Mode");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| SlackFeedError::Session("session is not open".to_string()))?;

        listener.shutdown().await;
        tracing::info!("Socket Mode listener shut down");
        Ok(())
    }
}
