//! Host-facing bridge between Slack message events and dashboard widgets
//!
//! The host obtains a [`SlackBridge`], probes the credentials with
//! [`SlackBridge::test`] and registers one or more sinks with
//! [`SlackBridge::message`]. [`SlackBridge::run`] warms the directory cache
//! and keeps the realtime session alive until shutdown.

mod connection;
mod enrich;
mod types;

pub use connection::{ConnectionManager, DEFAULT_RECONNECT_INTERVAL, RealtimeSession};
pub use enrich::Enricher;
pub use types::{EnrichedMessage, MessageParams};

use crate::directory::DirectoryCache;
use crate::error::{Result, SlackFeedError};
use crate::logging::log_error;
use crate::slack::{AuthIdentity, FileDownloader, RawMessage, SlackApi};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Messages enriched concurrently per subscription
const ENRICH_CONCURRENCY: usize = 8;

/// Host callback receiving enriched messages
pub trait MessageSink: Send + Sync + 'static {
    fn send(&self, message: EnrichedMessage);
}

impl<F> MessageSink for F
where
    F: Fn(EnrichedMessage) + Send + Sync + 'static,
{
    fn send(&self, message: EnrichedMessage) {
        self(message)
    }
}

pub struct SlackBridge<A> {
    api: Arc<A>,
    directory: Arc<DirectoryCache<A>>,
    enricher: Arc<Enricher<A>>,
    events: broadcast::Sender<RawMessage>,
}

impl<A: SlackApi> SlackBridge<A> {
    pub fn new(
        api: Arc<A>,
        downloader: Option<FileDownloader>,
        events: broadcast::Sender<RawMessage>,
    ) -> Self {
        let directory = Arc::new(DirectoryCache::new(api.clone()));
        let enricher = Arc::new(Enricher::new(
            directory.clone(),
            downloader.map(Arc::new),
        ));

        Self {
            api,
            directory,
            enricher,
            events,
        }
    }

    pub fn directory(&self) -> &Arc<DirectoryCache<A>> {
        &self.directory
    }

    /// Check the credentials against `auth.test`
    pub async fn test(&self) -> Result<AuthIdentity> {
        let identity = self.api.auth_test().await?;
        tracing::info!(
            user_id = %identity.user_id,
            team_id = %identity.team_id,
            user = ?identity.user,
            team = ?identity.team,
            "Slack credentials verified"
        );
        Ok(identity)
    }

    /// Forward every enriched message matching `params` to `sink`
    ///
    /// Each call creates an independent subscription; messages reach the sink
    /// in the order Slack delivered them.
    pub fn message<K: MessageSink>(&self, sink: K, params: MessageParams) -> JoinHandle<()> {
        let receiver = self.events.subscribe();
        let enricher = self.enricher.clone();
        let params = params.normalized();

        tracing::info!(channel = ?params.channel, "Registered message subscription");

        tokio::spawn(async move {
            let events = futures::stream::unfold(receiver, |mut receiver| async move {
                loop {
                    match receiver.recv().await {
                        Ok(raw) => return Some((raw, receiver)),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Subscription lagged behind, events skipped");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            });

            let enriched = events
                .map(|raw| {
                    let enricher = enricher.clone();
                    let params = params.clone();
                    async move { enricher.enrich(raw, &params).await }
                })
                .buffered(ENRICH_CONCURRENCY);
            tokio::pin!(enriched);

            while let Some(result) = enriched.next().await {
                match result {
                    Ok(Some(message)) => sink.send(message),
                    Ok(None) => {}
                    Err(e) => log_error("enrich_message", &e),
                }
            }

            tracing::info!("Message subscription closed");
        })
    }

    /// Load channels then users so the first messages resolve quickly
    ///
    /// Failures are logged; lookups fetch again on demand.
    pub async fn preload_directory(&self) {
        let result = async {
            let channels = self.directory.channels().await?;
            tracing::info!(count = channels.len(), "Loaded Slack channels");

            let users = self.directory.users().await?;
            tracing::info!(count = users.len(), "Loaded Slack users");

            Ok::<_, SlackFeedError>(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failure while initiating Slack data");
        }
    }

    /// Preload the directory, then keep `session` open until `shutdown`
    pub async fn run<R, F>(&self, session: R, interval: Duration, shutdown: F) -> R
    where
        R: RealtimeSession,
        F: Future<Output = ()>,
    {
        self.preload_directory().await;

        let session = ConnectionManager::new(session, interval).run(shutdown).await;

        self.directory.log_stats().await;
        session
    }
}
