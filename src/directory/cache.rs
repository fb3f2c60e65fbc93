//! Directory cache backed by full user/channel list fetches

use crate::directory::types::{ChannelRecord, DirectoryEntry, DirectoryQuery, UserRecord};
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

/// Where the directory lists come from
///
/// Implemented by the Slack Web API client in production and by in-memory
/// fakes in tests.
pub trait DirectorySource: Send + Sync + 'static {
    fn fetch_users(&self) -> impl Future<Output = Result<Vec<UserRecord>>> + Send;
    fn fetch_channels(&self) -> impl Future<Output = Result<Vec<ChannelRecord>>> + Send;
}

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub user_hits: u64,
    pub channel_hits: u64,
    pub user_fetches: u64,
    pub channel_fetches: u64,
    pub fetch_errors: u64,
}

/// Lazily-populated, never-evicted directory of users and channels
pub struct DirectoryCache<S> {
    source: Arc<S>,
    users: OnceCell<Arc<Vec<UserRecord>>>,
    channels: OnceCell<Arc<Vec<ChannelRecord>>>,
    stats: RwLock<CacheStats>,
}

impl<S: DirectorySource> DirectoryCache<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            users: OnceCell::new(),
            channels: OnceCell::new(),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Full user list, fetched on first call
    pub async fn users(&self) -> Result<Arc<Vec<UserRecord>>> {
        if let Some(users) = self.users.get() {
            self.stats.write().await.user_hits += 1;
            return Ok(users.clone());
        }

        let users = self
            .users
            .get_or_try_init(|| async {
                self.stats.write().await.user_fetches += 1;
                tracing::debug!("User directory not loaded, fetching from Slack API");

                match self.source.fetch_users().await {
                    Ok(users) => {
                        tracing::info!(count = users.len(), "Fetched and cached user directory");
                        Ok(Arc::new(users))
                    }
                    Err(e) => {
                        self.stats.write().await.fetch_errors += 1;
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(users.clone())
    }

    /// Full channel list, fetched on first call
    pub async fn channels(&self) -> Result<Arc<Vec<ChannelRecord>>> {
        if let Some(channels) = self.channels.get() {
            self.stats.write().await.channel_hits += 1;
            return Ok(channels.clone());
        }

        let channels = self
            .channels
            .get_or_try_init(|| async {
                self.stats.write().await.channel_fetches += 1;
                tracing::debug!("Channel directory not loaded, fetching from Slack API");

                match self.source.fetch_channels().await {
                    Ok(channels) => {
                        tracing::info!(
                            count = channels.len(),
                            "Fetched and cached channel directory"
                        );
                        Ok(Arc::new(channels))
                    }
                    Err(e) => {
                        self.stats.write().await.fetch_errors += 1;
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(channels.clone())
    }

    pub async fn find_user(&self, query: &DirectoryQuery) -> Result<Option<UserRecord>> {
        let users = self.users().await?;
        let found = find(&users, query);

        tracing::trace!(query = ?query, found = found.is_some(), "User lookup");
        Ok(found)
    }

    pub async fn find_channel(&self, query: &DirectoryQuery) -> Result<Option<ChannelRecord>> {
        let channels = self.channels().await?;
        let found = find(&channels, query);

        tracing::trace!(query = ?query, found = found.is_some(), "Channel lookup");
        Ok(found)
    }

    /// Loaded list sizes as (channels, users); `None` while not loaded
    pub fn cache_sizes(&self) -> (Option<usize>, Option<usize>) {
        (
            self.channels.get().map(|c| c.len()),
            self.users.get().map(|u| u.len()),
        )
    }

    pub async fn get_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Log cache statistics (for periodic monitoring)
    pub async fn log_stats(&self) {
        let stats = self.get_stats().await;
        let (channel_count, user_count) = self.cache_sizes();

        tracing::info!(
            channels_cached = ?channel_count,
            users_cached = ?user_count,
            channel_hits = stats.channel_hits,
            user_hits = stats.user_hits,
            channel_fetches = stats.channel_fetches,
            user_fetches = stats.user_fetches,
            fetch_errors = stats.fetch_errors,
            "Directory cache statistics"
        );
    }
}

fn find<T: DirectoryEntry + Clone>(records: &[T], query: &DirectoryQuery) -> Option<T> {
    records.iter().find(|r| r.matches(query)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::testing::{StaticDirectory, channel, user};
    use std::sync::atomic::Ordering;

    fn directory() -> Arc<StaticDirectory> {
        Arc::new(StaticDirectory::new(
            vec![user("U1", "alice"), user("U2", "bob")],
            vec![channel("C1", "general"), channel("C2", "random")],
        ))
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_name() {
        let cache = DirectoryCache::new(directory());

        let bob = cache.find_user(&DirectoryQuery::id("U2")).await.unwrap();
        assert_eq!(bob.map(|u| u.name), Some("bob".to_string()));

        let random = cache
            .find_channel(&DirectoryQuery::name("random"))
            .await
            .unwrap();
        assert_eq!(random.map(|c| c.id), Some("C2".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_miss_returns_none() {
        let cache = DirectoryCache::new(directory());

        assert!(
            cache
                .find_user(&DirectoryQuery::id("U404"))
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            cache
                .find_channel(&DirectoryQuery::name("C1"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_lists_fetched_once() {
        let source = directory();
        let cache = DirectoryCache::new(source.clone());

        for _ in 0..3 {
            cache.find_user(&DirectoryQuery::id("U1")).await.unwrap();
            cache.find_channel(&DirectoryQuery::id("C1")).await.unwrap();
        }

        assert_eq!(source.user_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(source.channel_fetches.load(Ordering::SeqCst), 1);

        let stats = cache.get_stats().await;
        assert_eq!(stats.user_fetches, 1);
        assert_eq!(stats.user_hits, 2);
        assert_eq!(cache.cache_sizes(), (Some(2), Some(2)));
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_fetch() {
        let source = directory();
        let cache = Arc::new(DirectoryCache::new(source.clone()));

        let lookups = (0..8).map(|_| {
            let cache = cache.clone();
            async move { cache.find_user(&DirectoryQuery::id("U1")).await }
        });
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));
        assert_eq!(source.user_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_retried() {
        let source = directory();
        source.fail_next.store(true, Ordering::SeqCst);
        let cache = DirectoryCache::new(source.clone());

        assert!(cache.users().await.is_err());
        assert_eq!(cache.cache_sizes().1, None);

        let users = cache.users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(source.user_fetches.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get_stats().await.fetch_errors, 1);
    }
}
