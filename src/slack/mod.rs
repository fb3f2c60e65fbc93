mod client;
mod download;
mod events;
mod types;

pub use client::{SlackApi, SlackClient};
pub use download::FileDownloader;
pub use events::SocketModeSession;
pub use types::{AuthIdentity, ChannelId, FileAttachment, MessageTs, RawMessage, UserId};
