pub mod bridge;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod slack;
pub mod storage;
pub mod text;

pub use bridge::{EnrichedMessage, MessageParams, MessageSink, SlackBridge};
pub use error::{Result, SlackFeedError};
