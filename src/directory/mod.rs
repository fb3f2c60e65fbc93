//! Directory of Slack users and channels
//!
//! The lists are fetched in full on first access and served from memory for
//! the rest of the process lifetime:
//! - One fetch per list: concurrent first callers share the in-flight request
//! - No eviction or refresh: data persists until restart
//! - A failed fetch is not cached, so the next lookup tries again

mod cache;
mod types;

pub use cache::{CacheStats, DirectoryCache, DirectorySource};
pub use types::{ChannelRecord, ChannelType, DirectoryEntry, DirectoryQuery, UserRecord};
