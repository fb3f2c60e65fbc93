use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTs(pub String);

impl MessageTs {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// File shared with a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub filetype: Option<String>,
    #[serde(default)]
    pub url_private_download: Option<String>,
    #[serde(default)]
    pub url_private: Option<String>,
}

impl FileAttachment {
    /// Authenticated download URL, preferring the forced-download variant
    pub fn download_url(&self) -> Option<&str> {
        self.url_private_download
            .as_deref()
            .or(self.url_private.as_deref())
    }

    /// File extension used for the local copy
    pub fn extension(&self) -> &str {
        self.filetype
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| {
                self.name
                    .as_deref()
                    .and_then(|n| n.rsplit_once('.'))
                    .map(|(_, ext)| ext)
            })
            .unwrap_or("bin")
    }

    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("file")
    }
}

/// A `message` event as delivered by Slack
///
/// Fields the bridge does not interpret are preserved in `extra` and passed
/// through to the host untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub ts: MessageTs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<MessageTs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Legacy single-file payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAttachment>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawMessage {
    /// The attachment to download, if any
    pub fn attachment(&self) -> Option<&FileAttachment> {
        self.file
            .as_ref()
            .or_else(|| self.files.as_ref().and_then(|files| files.first()))
    }

    /// Key identifying a delivery of this message, for deduplication
    pub fn event_key(&self) -> String {
        format!(
            "message:{}:{}",
            self.channel.as_ref().map(|c| c.as_str()).unwrap_or("-"),
            self.ts.as_str()
        )
    }
}

/// Identity reported by `auth.test`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub user_id: String,
    pub team_id: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}
