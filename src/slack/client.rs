use crate::config::SlackConfig;
use crate::directory::{ChannelRecord, ChannelType, DirectorySource, UserRecord};
use crate::error::{Result, SlackFeedError};
use crate::slack::AuthIdentity;
use slack_morphism::prelude::*;
use std::future::Future;
use std::sync::Arc;

const PAGE_SIZE: u16 = 200;

/// Web API calls the bridge needs besides the directory lists
pub trait SlackApi: DirectorySource {
    fn auth_test(&self) -> impl Future<Output = Result<AuthIdentity>> + Send;
}

pub struct SlackClient {
    client: Arc<SlackHyperClient>,
    token: SlackApiToken,
    app_token: SlackApiToken,
}

impl SlackClient {
    pub fn new(config: SlackConfig) -> Result<Self> {
        let connector = SlackClientHyperConnector::new()
            .map_err(|e| SlackFeedError::SlackApi(e.to_string()))?;

        let client = Arc::new(slack_morphism::SlackClient::new(connector));
        let token = SlackApiToken::new(config.bot_token.into());
        let app_token = SlackApiToken::new(config.app_token.into());

        Ok(Self {
            client,
            token,
            app_token,
        })
    }

    pub fn get_client(&self) -> Arc<SlackHyperClient> {
        self.client.clone()
    }

    /// App-level token used to open Socket Mode connections
    pub fn get_app_token(&self) -> &SlackApiToken {
        &self.app_token
    }

    pub fn get_token(&self) -> &SlackApiToken {
        &self.token
    }

    /// Check the bot token and report who we are
    pub async fn test_auth(&self) -> Result<AuthIdentity> {
        let session = self.client.open_session(&self.token);

        let response = session
            .auth_test()
            .await
            .map_err(|e| SlackFeedError::SlackApi(e.to_string()))?;

        Ok(auth_identity(response))
    }

    /// Get every workspace member, following pagination cursors
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        tracing::debug!("📋 Fetching user list from Slack API...");
        let session = self.client.open_session(&self.token);

        let mut users = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        loop {
            let mut request = SlackApiUsersListRequest::new().with_limit(PAGE_SIZE);
            if let Some(next) = cursor.take() {
                request = request.with_cursor(next);
            }

            let response = session
                .users_list(&request)
                .await
                .map_err(|e| SlackFeedError::SlackApi(e.to_string()))?;

            tracing::debug!("Received page of {} users", response.members.len());
            users.extend(response.members.into_iter().map(user_record));

            cursor = next_cursor(response.response_metadata);
            if cursor.is_none() {
                break;
            }
        }

        Ok(users)
    }

    /// Get every public and private conversation visible to the bot
    pub async fn list_channels(&self) -> Result<Vec<ChannelRecord>> {
        tracing::debug!("📋 Fetching channel list from Slack API...");
        let session = self.client.open_session(&self.token);

        let mut channels = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        loop {
            let mut request = SlackApiConversationsListRequest::new()
                .with_types(vec![
                    SlackConversationType::Public,
                    SlackConversationType::Private,
                ])
                .with_limit(PAGE_SIZE);
            if let Some(next) = cursor.take() {
                request = request.with_cursor(next);
            }

            let response = session
                .conversations_list(&request)
                .await
                .map_err(|e| SlackFeedError::SlackApi(e.to_string()))?;

            tracing::debug!("Received page of {} channels", response.channels.len());
            channels.extend(response.channels.into_iter().map(channel_record));

            cursor = next_cursor(response.response_metadata);
            if cursor.is_none() {
                break;
            }
        }

        tracing::info!(
            "Found {} channels ({} with bot membership)",
            channels.len(),
            channels.iter().filter(|c| c.is_member).count()
        );

        Ok(channels)
    }
}

impl DirectorySource for SlackClient {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>> {
        self.list_users().await
    }

    async fn fetch_channels(&self) -> Result<Vec<ChannelRecord>> {
        self.list_channels().await
    }
}

impl SlackApi for SlackClient {
    async fn auth_test(&self) -> Result<AuthIdentity> {
        self.test_auth().await
    }
}

fn next_cursor(metadata: Option<SlackResponseMetadata>) -> Option<SlackCursorId> {
    metadata
        .and_then(|m| m.next_cursor)
        .filter(|c| !c.0.is_empty())
}

fn auth_identity(response: SlackApiAuthTestResponse) -> AuthIdentity {
    AuthIdentity {
        user_id: response.user_id.to_string(),
        team_id: response.team_id.to_string(),
        user: response.user,
        team: Some(response.team),
        bot_id: response.bot_id.map(|b| b.to_string()),
    }
}

fn user_record(user: SlackUser) -> UserRecord {
    let id = user.id.to_string();

    UserRecord {
        name: user.name.unwrap_or_else(|| id.clone()),
        real_name: user.real_name,
        display_name: user.profile.as_ref().and_then(|p| p.display_name.clone()),
        is_bot: user.flags.is_bot.unwrap_or(false),
        id,
    }
}

fn channel_record(channel: SlackChannelInfo) -> ChannelRecord {
    let id = channel.id.to_string();

    // Determine channel type
    let channel_type = if channel.flags.is_channel.unwrap_or(false) {
        if channel.flags.is_private.unwrap_or(false) {
            ChannelType::PrivateChannel
        } else {
            ChannelType::PublicChannel
        }
    } else if channel.flags.is_im.unwrap_or(false) {
        ChannelType::DirectMessage
    } else if channel.flags.is_mpim.unwrap_or(false) {
        ChannelType::MultiPartyDirectMessage
    } else if channel.flags.is_private.unwrap_or(false) {
        ChannelType::PrivateChannel
    } else {
        ChannelType::PublicChannel
    };

    ChannelRecord {
        name: channel.name.unwrap_or_else(|| id.clone()),
        channel_type,
        is_private: channel.flags.is_private.unwrap_or(false),
        is_member: channel.flags.is_member.unwrap_or(false),
        topic: channel.topic.map(|t| t.value).filter(|t| !t.is_empty()),
        num_members: channel.num_members.map(|n| n as u64),
        id,
    }
}
