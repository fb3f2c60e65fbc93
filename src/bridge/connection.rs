//! Supervised reconnect loop for the realtime session

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Default interval between unconditional reconnects
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// A long-lived connection delivering live events
pub trait RealtimeSession {
    fn open(&mut self) -> impl Future<Output = Result<()>>;
    fn close(&mut self) -> impl Future<Output = Result<()>>;
}

pub struct ConnectionManager<R> {
    session: R,
    interval: Duration,
    reconnects: u64,
}

impl<R: RealtimeSession> ConnectionManager<R> {
    pub fn new(session: R, interval: Duration) -> Self {
        Self {
            session,
            interval,
            reconnects: 0,
        }
    }

    /// Number of successful (re)opens so far
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Close the session, ignoring close errors, and open it again
    pub async fn reopen(&mut self) -> Result<()> {
        if let Err(e) = self.session.close().await {
            // Closing failed or the session was never opened
            tracing::debug!(error = %e, "Ignoring error while closing session");
        }

        self.session.open().await?;
        self.reconnects += 1;
        tracing::info!(reconnects = self.reconnects, "Started listening Slack events");
        Ok(())
    }

    /// Reopen the session now and on every interval tick until `shutdown` resolves
    pub async fn run<F>(mut self, shutdown: F) -> R
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Starting realtime session supervisor"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping session supervisor");
                    break;
                }
                _ = ticker.tick() => {
                    // An open can hang on the network; shutdown must still win
                    tokio::select! {
                        _ = &mut shutdown => {
                            tracing::info!("Shutdown requested while opening session");
                            break;
                        }
                        result = self.reopen() => {
                            if let Err(e) = result {
                                tracing::warn!(
                                    error = %e,
                                    retry_in_secs = self.interval.as_secs(),
                                    "Failed to open realtime session"
                                );
                            }
                        }
                    }
                }
            }
        }

        if let Err(e) = self.session.close().await {
            tracing::debug!(error = %e, "Ignoring error while closing session");
        }

        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlackFeedError;

    #[derive(Default)]
    struct FakeSession {
        open: bool,
        opens: usize,
        closes: usize,
        close_errors: usize,
        fail_opens: usize,
        hang_opens: bool,
    }

    impl RealtimeSession for FakeSession {
        async fn open(&mut self) -> Result<()> {
            self.opens += 1;
            if self.hang_opens {
                std::future::pending::<()>().await;
            }
            if self.fail_opens > 0 {
                self.fail_opens -= 1;
                return Err(SlackFeedError::Session("connection refused".to_string()));
            }
            self.open = true;
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            self.closes += 1;
            if !self.open {
                self.close_errors += 1;
                return Err(SlackFeedError::Session("not open".to_string()));
            }
            self.open = false;
            Ok(())
        }
    }

    const INTERVAL: Duration = Duration::from_secs(1800);

    #[tokio::test]
    async fn test_reopen_swallows_close_error() {
        let mut manager = ConnectionManager::new(FakeSession::default(), INTERVAL);

        manager.reopen().await.unwrap();
        manager.reopen().await.unwrap();

        assert_eq!(manager.reconnects(), 2);
        assert_eq!(manager.session.close_errors, 1);
        assert!(manager.session.open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopens_on_every_tick() {
        let manager = ConnectionManager::new(FakeSession::default(), INTERVAL);

        let session = manager
            .run(tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)))
            .await;

        // Ticks at 0, T and 2T, then the final close on shutdown
        assert_eq!(session.opens, 3);
        assert_eq!(session.closes, 4);
        assert_eq!(session.close_errors, 1);
        assert!(!session.open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_open_retried_on_next_tick() {
        let session = FakeSession {
            fail_opens: 1,
            ..Default::default()
        };
        let manager = ConnectionManager::new(session, INTERVAL);

        let session = manager
            .run(tokio::time::sleep(INTERVAL + Duration::from_secs(1)))
            .await;

        assert_eq!(session.opens, 2);
        assert_eq!(session.close_errors, 2);
        assert!(!session.open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_hanging_open() {
        let session = FakeSession {
            hang_opens: true,
            ..Default::default()
        };
        let manager = ConnectionManager::new(session, INTERVAL);

        let session = manager
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;

        assert_eq!(session.opens, 1);
        assert_eq!(session.closes, 2);
        assert!(!session.open);
    }

    #[test]
    fn test_default_interval_is_thirty_minutes() {
        assert_eq!(DEFAULT_RECONNECT_INTERVAL.as_secs(), 1800);
    }
}
