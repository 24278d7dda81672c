//! Background ingestion service

use std::sync::Arc;
use std::time::Duration;

use common::models::RepoRef;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::ingest::{Ingestor, TickReport};

/// Configuration for the sync service
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Interval between ingestion ticks
    pub interval: Duration,
    /// Pause after a tick in which a repository failed
    pub backoff: Duration,
    pub repos: Vec<RepoRef>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            backoff: Duration::from_secs(30),
            repos: Vec::new(),
        }
    }
}

/// Periodically runs an ingestion tick over all tracked repos
pub struct SyncService {
    ingestor: Arc<Ingestor>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(ingestor: Arc<Ingestor>, config: SyncConfig) -> Self {
        Self { ingestor, config }
    }

    /// Start the background sync loop
    pub async fn run(self) {
        info!(
            "Starting sync service (interval: {:?}, {} repos)",
            self.config.interval,
            self.config.repos.len()
        );

        let mut ticker = interval(self.config.interval);
        // Ticks missed during a pause collapse into one
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Some(pause) = self.sync_once().await {
                tokio::time::sleep(pause).await;
            }
        }
    }

    /// Run a single tick. Returns how long to pause before the next one.
    pub async fn sync_once(&self) -> Option<Duration> {
        if self.config.repos.is_empty() {
            info!("No tracked repos to sync");
            return None;
        }

        info!("Syncing {} tracked repos", self.config.repos.len());
        let (reports, retry_after) = self.ingestor.tick(&self.config.repos).await;
        pause_after(&reports, retry_after, self.config.backoff)
    }
}

fn pause_after(
    reports: &[TickReport],
    retry_after: Option<u64>,
    backoff: Duration,
) -> Option<Duration> {
    if let Some(secs) = retry_after {
        warn!("Pausing sync for {} seconds after rate limit", secs);
        return Some(Duration::from_secs(secs));
    }
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        warn!("{} repos failed, backing off for {:?}", failed, backoff);
        return Some(backoff);
    }
    info!("Sync complete");
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use common::models::WorkItemId;
    use common::{CalendarConfig, LatencyPolicy};
    use github::{ClientError, MergedPr, Timeline};
    use tokio::time::Instant;

    use super::*;
    use crate::calendar::Calendar;
    use crate::memory::MemoryStore;
    use crate::store::ReviewSource;

    /// Rate limits the first listing, then reports an empty repository
    struct RateLimitedOnce {
        start: Instant,
        calls: AtomicU32,
        seen_at: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl ReviewSource for RateLimitedOnce {
        async fn merged_pull_requests(
            &self,
            _repo: &RepoRef,
            _after: Option<&str>,
            _count: u32,
        ) -> Result<Vec<MergedPr>, ClientError> {
            self.seen_at.lock().unwrap().push(self.start.elapsed().as_secs());
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ClientError::RateLimited { retry_after: 3600 });
            }
            Ok(vec![])
        }

        async fn timeline(&self, id: &WorkItemId) -> Result<Timeline, ClientError> {
            Err(ClientError::NotFound(id.to_string()))
        }
    }

    fn report(error: Option<&str>) -> TickReport {
        TickReport {
            repo: "acme/widgets".to_string(),
            error: error.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_tick_has_no_pause() {
        let reports = vec![report(None), report(None)];
        assert_eq!(pause_after(&reports, None, Duration::from_secs(30)), None);
    }

    #[test]
    fn test_failure_uses_fixed_backoff() {
        let reports = vec![report(Some("boom")), report(None)];
        assert_eq!(
            pause_after(&reports, None, Duration::from_secs(30)),
            Some(Duration::from_secs(30))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_does_not_burst_missed_ticks() {
        let source = Arc::new(RateLimitedOnce {
            start: Instant::now(),
            calls: AtomicU32::new(0),
            seen_at: Mutex::new(Vec::new()),
        });
        let ingestor = Arc::new(Ingestor::new(
            source.clone(),
            Arc::new(MemoryStore::new()),
            Calendar::new(CalendarConfig::default()),
            LatencyPolicy::default(),
        ));
        let service = SyncService::new(
            ingestor,
            SyncConfig {
                interval: Duration::from_secs(600),
                backoff: Duration::from_secs(30),
                repos: vec![RepoRef::new("acme", "widgets")],
            },
        );

        let handle = tokio::spawn(service.run());
        tokio::time::sleep(Duration::from_secs(4201)).await;
        handle.abort();

        // One retry right after the pause, then back on the interval
        assert_eq!(*source.seen_at.lock().unwrap(), vec![0, 3600, 4200]);
    }

    #[test]
    fn test_rate_limit_wins() {
        let reports = vec![report(Some("rate limited"))];
        assert_eq!(
            pause_after(&reports, Some(120), Duration::from_secs(30)),
            Some(Duration::from_secs(120))
        );
    }
}
