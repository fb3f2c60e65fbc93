use crate::bridge::{EnrichedMessage, MessageParams};
use crate::directory::{DirectoryCache, DirectoryQuery, DirectorySource};
use crate::error::Result;
use crate::logging::Timer;
use crate::slack::{FileDownloader, RawMessage};
use crate::text::{FormatRemover, replace_emojis};
use std::path::PathBuf;
use std::sync::Arc;

/// Turns raw message events into host-ready messages
pub struct Enricher<S> {
    directory: Arc<DirectoryCache<S>>,
    downloader: Option<Arc<FileDownloader>>,
}

impl<S: DirectorySource> Enricher<S> {
    pub fn new(
        directory: Arc<DirectoryCache<S>>,
        downloader: Option<Arc<FileDownloader>>,
    ) -> Self {
        Self {
            directory,
            downloader,
        }
    }

    /// Resolve references, fetch the attachment and clean up the text
    ///
    /// Returns `Ok(None)` when the message must not reach the host: its user
    /// or channel is unknown, or it belongs to a channel the subscription
    /// filters out.
    pub async fn enrich(
        &self,
        raw: RawMessage,
        params: &MessageParams,
    ) -> Result<Option<EnrichedMessage>> {
        let _timer = Timer::new("enrich_message");

        let user_query = raw.user.as_ref().map(|u| DirectoryQuery::id(u.as_str()));
        let channel_query = raw
            .channel
            .as_ref()
            .map(|c| DirectoryQuery::id(c.as_str()));

        let (user, channel, file) = tokio::try_join!(
            async {
                match &user_query {
                    Some(query) => self.directory.find_user(query).await,
                    None => Ok(None),
                }
            },
            async {
                match &channel_query {
                    Some(query) => self.directory.find_channel(query).await,
                    None => Ok(None),
                }
            },
            self.fetch_file(&raw),
        )?;

        let (Some(user), Some(channel)) = (user, channel) else {
            tracing::warn!(
                ts = %raw.ts.as_str(),
                user_id = ?raw.user.as_ref().map(|u| u.as_str()),
                channel_id = ?raw.channel.as_ref().map(|c| c.as_str()),
                "User and/or channel not found. Message from private channel?"
            );
            return Ok(None);
        };

        if !params.accepts(&channel) {
            tracing::trace!(
                channel = %channel.name,
                wanted = ?params.channel,
                "Skipping message from filtered channel"
            );
            return Ok(None);
        }

        let users = self.directory.users().await?;
        let channels = self.directory.channels().await?;
        let remover = FormatRemover::new(&users, &channels);

        let text = replace_emojis(&remover.remove(raw.text.as_deref().unwrap_or_default()));

        tracing::debug!(
            ts = %raw.ts.as_str(),
            channel = %channel.display_name(),
            user = %user.display_name_with_at(),
            has_file = file.is_some(),
            "Message enriched"
        );

        Ok(Some(EnrichedMessage::new(raw, text, user, channel, file)))
    }

    async fn fetch_file(&self, raw: &RawMessage) -> Result<Option<PathBuf>> {
        let (Some(file), Some(downloader)) = (raw.attachment(), self.downloader.as_ref()) else {
            return Ok(None);
        };

        downloader.fetch_attachment(file).await.map(Some)
    }
}
