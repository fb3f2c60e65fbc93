//! Directory record types

use serde::{Deserialize, Serialize};

/// Exact-match lookup key for directory records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryQuery {
    Id(String),
    Name(String),
}

impl DirectoryQuery {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

/// Common accessors used for lookups
pub trait DirectoryEntry {
    fn id(&self) -> &str;
    fn name(&self) -> &str;

    fn matches(&self, query: &DirectoryQuery) -> bool {
        match query {
            DirectoryQuery::Id(id) => self.id() == id,
            DirectoryQuery::Name(name) => self.name() == name,
        }
    }
}

/// Channel directory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Channel ID (e.g., C09NU1KFXHT)
    pub id: String,

    /// Channel name without # (e.g., "engineering", "general")
    pub name: String,

    pub channel_type: ChannelType,

    pub is_private: bool,

    /// Whether the bot is a member of this channel
    pub is_member: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_members: Option<u64>,
}

/// Channel type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    PublicChannel,
    PrivateChannel,
    DirectMessage,
    MultiPartyDirectMessage,
}

impl ChannelRecord {
    /// Get display name with # prefix for channels
    pub fn display_name(&self) -> String {
        match self.channel_type {
            ChannelType::PublicChannel | ChannelType::PrivateChannel => {
                format!("#{}", self.name)
            }
            _ => self.name.clone(),
        }
    }
}

impl DirectoryEntry for ChannelRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// User directory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User ID (e.g., U09JDBT2MCM)
    pub id: String,

    /// Username/handle (e.g., "john.doe")
    pub name: String,

    /// Real name (e.g., "John Doe")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,

    /// Display name (what shows in Slack)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub is_bot: bool,
}

impl UserRecord {
    /// Get best available name for display
    pub fn best_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.real_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or(&self.name)
    }

    /// Get display name with @ prefix
    pub fn display_name_with_at(&self) -> String {
        format!("@{}", self.best_name())
    }
}

impl DirectoryEntry for UserRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engineering() -> ChannelRecord {
        ChannelRecord {
            id: "C123".to_string(),
            name: "engineering".to_string(),
            channel_type: ChannelType::PublicChannel,
            is_private: false,
            is_member: true,
            topic: None,
            num_members: Some(42),
        }
    }

    #[test]
    fn test_channel_display_name() {
        assert_eq!(engineering().display_name(), "#engineering");
    }

    #[test]
    fn test_dm_display_name() {
        let channel = ChannelRecord {
            id: "D123".to_string(),
            name: "john.doe".to_string(),
            channel_type: ChannelType::DirectMessage,
            is_private: true,
            is_member: true,
            topic: None,
            num_members: Some(2),
        };

        assert_eq!(channel.display_name(), "john.doe");
    }

    #[test]
    fn test_user_best_name() {
        let user = UserRecord {
            id: "U123".to_string(),
            name: "john.doe".to_string(),
            real_name: Some("John Doe".to_string()),
            display_name: Some("Johnny".to_string()),
            is_bot: false,
        };

        assert_eq!(user.best_name(), "Johnny");
        assert_eq!(user.display_name_with_at(), "@Johnny");
    }

    #[test]
    fn test_user_fallback_name() {
        // Slack sends an empty display name for users that never set one
        let user = UserRecord {
            id: "U123".to_string(),
            name: "john.doe".to_string(),
            real_name: None,
            display_name: Some(String::new()),
            is_bot: false,
        };

        assert_eq!(user.best_name(), "john.doe");
    }

    #[test]
    fn test_matches_by_id_or_name() {
        let channel = engineering();

        assert!(channel.matches(&DirectoryQuery::id("C123")));
        assert!(channel.matches(&DirectoryQuery::name("engineering")));
        assert!(!channel.matches(&DirectoryQuery::name("#engineering")));
        assert!(!channel.matches(&DirectoryQuery::id("engineering")));
    }
}
