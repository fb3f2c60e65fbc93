use crate::directory::{ChannelRecord, UserRecord};
use crate::slack::{FileAttachment, MessageTs, RawMessage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Subscription parameters supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageParams {
    /// Only forward messages from this channel (name, `#` optional)
    #[serde(default)]
    pub channel: Option<String>,
}

impl MessageParams {
    pub fn for_channel(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
        }
        .normalized()
    }

    /// Drop the leading `#` from the channel filter
    pub fn normalized(self) -> Self {
        Self {
            channel: self
                .channel
                .map(|c| c.trim().trim_start_matches('#').to_string())
                .filter(|c| !c.is_empty()),
        }
    }

    pub fn accepts(&self, channel: &ChannelRecord) -> bool {
        self.channel
            .as_deref()
            .is_none_or(|wanted| wanted == channel.name)
    }
}

/// A message event with references resolved and text cleaned up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedMessage {
    pub ts: MessageTs,
    pub text: String,
    pub user: UserRecord,
    pub channel: ChannelRecord,
    /// Local path of the downloaded attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Attachment metadata as Slack sent it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAttachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<MessageTs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnrichedMessage {
    pub fn new(
        raw: RawMessage,
        text: String,
        user: UserRecord,
        channel: ChannelRecord,
        file: Option<PathBuf>,
    ) -> Self {
        Self {
            ts: raw.ts,
            text,
            user,
            channel,
            file,
            files: raw.files,
            thread_ts: raw.thread_ts,
            subtype: raw.subtype,
            extra: raw.extra,
        }
    }
}
