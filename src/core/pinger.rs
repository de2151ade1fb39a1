use crate::config::PingerConfig;
use crate::core::{Monitor, MonitorStatus, MonitorStore, Prober};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

#[derive(Debug, Clone)]
pub struct PingerSettings {
    pub poll_interval: Duration,
    pub concurrent_requests: usize,
}

impl Default for PingerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            concurrent_requests: 5,
        }
    }
}

impl From<&PingerConfig> for PingerSettings {
    fn from(config: &PingerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            concurrent_requests: config.concurrent_requests,
        }
    }
}

/// 單次巡檢的統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub due: usize,
    pub checked: usize,
    pub up: usize,
    pub down: usize,
    /// 沒有網址或檢查期間已被刪除
    pub skipped: usize,
    pub failed: usize,
}

struct CheckOutcome {
    monitor: Monitor,
    status: MonitorStatus,
    recorded: Result<bool>,
}

/// 背景巡檢：找出到期的監控項目並逐一檢查
pub struct Pinger<P: Prober + 'static> {
    store: Arc<dyn MonitorStore>,
    prober: Arc<P>,
    settings: PingerSettings,
}

impl<P: Prober + 'static> Pinger<P> {
    pub fn new(store: Arc<dyn MonitorStore>, prober: P, settings: PingerSettings) -> Self {
        Self {
            store,
            prober: Arc::new(prober),
            settings,
        }
    }

    /// Selects due monitors from one snapshot, then checks them.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let due: Vec<Monitor> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|m| m.is_due(now))
            .collect();

        let mut report = CycleReport {
            due: due.len(),
            ..CycleReport::default()
        };
        if due.is_empty() {
            return Ok(report);
        }

        tracing::debug!("{} monitors due for a check", due.len());

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrent_requests.max(1)));
        let mut tasks = JoinSet::new();

        for monitor in due {
            if monitor.url.trim().is_empty() {
                report.skipped += 1;
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let store = Arc::clone(&self.store);
            let prober = Arc::clone(&self.prober);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let status = prober.probe(&monitor.url).await;
                let recorded = store
                    .record_check(&monitor.uid, &monitor.id, status, Utc::now())
                    .await;
                CheckOutcome {
                    monitor,
                    status,
                    recorded,
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Check task failed: {}", e);
                    report.failed += 1;
                    continue;
                }
            };

            match outcome.recorded {
                Ok(true) => {
                    tracing::info!("Pinged {}. Status: {}", outcome.monitor.url, outcome.status);
                    report.checked += 1;
                    match outcome.status {
                        MonitorStatus::Up => report.up += 1,
                        _ => report.down += 1,
                    }
                }
                Ok(false) => {
                    tracing::warn!(
                        "Monitor {} was removed before its result could be saved",
                        outcome.monitor.id
                    );
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to save result for monitor {}: {}",
                        outcome.monitor.id,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Runs cycles until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Pinger worker started.");

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.run_cycle(Utc::now()).await {
                Ok(report) if report.due > 0 => tracing::debug!(?report, "Pinger cycle finished"),
                Ok(_) => {}
                Err(e) => tracing::error!(
                    "An error occurred in the pinger loop: {} (Category: {:?})",
                    e,
                    e.category()
                ),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Pinger worker stopped.");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::core::NewMonitor;
    use crate::utils::error::SitePulseError;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockProber {
        statuses: HashMap<String, MonitorStatus>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockProber {
        fn with(mut self, url: &str, status: MonitorStatus) -> Self {
            self.statuses.insert(url.to_string(), status);
            self
        }
    }

    #[async_trait]
    impl Prober for MockProber {
        async fn probe(&self, url: &str) -> MonitorStatus {
            self.calls.lock().unwrap().push(url.to_string());
            self.statuses
                .get(url)
                .copied()
                .unwrap_or(MonitorStatus::Down)
        }
    }

    /// 讀取成功但第一次 list_all 失敗
    struct FlakyStore {
        inner: MemoryStore,
        list_calls: AtomicUsize,
    }

    #[async_trait]
    impl MonitorStore for FlakyStore {
        async fn insert(&self, uid: &str, new: NewMonitor) -> Result<Monitor> {
            self.inner.insert(uid, new).await
        }
        async fn get(&self, uid: &str, id: &str) -> Result<Option<Monitor>> {
            self.inner.get(uid, id).await
        }
        async fn list_for_user(&self, uid: &str) -> Result<Vec<Monitor>> {
            self.inner.list_for_user(uid).await
        }
        async fn list_all(&self) -> Result<Vec<Monitor>> {
            if self.list_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(SitePulseError::store("backend hiccup"));
            }
            self.inner.list_all().await
        }
        async fn delete(&self, uid: &str, id: &str) -> Result<bool> {
            self.inner.delete(uid, id).await
        }
        async fn record_check(
            &self,
            uid: &str,
            id: &str,
            status: MonitorStatus,
            checked_at: DateTime<Utc>,
        ) -> Result<bool> {
            self.inner.record_check(uid, id, status, checked_at).await
        }
    }

    fn new_monitor(url: &str, interval: u64) -> NewMonitor {
        NewMonitor {
            name: url.to_string(),
            url: url.to_string(),
            interval,
        }
    }

    #[tokio::test]
    async fn test_cycle_checks_due_monitors_and_records_status() {
        let store = Arc::new(MemoryStore::new());
        let up = store
            .insert("alice", new_monitor("https://up.example.com", 60))
            .await
            .unwrap();
        let down = store
            .insert("bob", new_monitor("https://down.example.com", 60))
            .await
            .unwrap();

        let prober = MockProber::default().with("https://up.example.com", MonitorStatus::Up);
        let pinger = Pinger::new(store.clone(), prober, PingerSettings::default());

        let report = pinger.run_cycle(Utc::now()).await.unwrap();
        assert_eq!(report.due, 2);
        assert_eq!(report.checked, 2);
        assert_eq!(report.up, 1);
        assert_eq!(report.down, 1);

        let up = store.get("alice", &up.id).await.unwrap().unwrap();
        let down = store.get("bob", &down.id).await.unwrap().unwrap();
        assert_eq!(up.status, MonitorStatus::Up);
        assert_eq!(down.status, MonitorStatus::Down);
        assert!(up.last_checked.is_some());
    }

    #[tokio::test]
    async fn test_cycle_skips_monitors_within_interval() {
        let store = Arc::new(MemoryStore::new());
        let recent = store
            .insert("alice", new_monitor("https://recent.example.com", 300))
            .await
            .unwrap();
        store
            .record_check("alice", &recent.id, MonitorStatus::Up, Utc::now())
            .await
            .unwrap();
        let stale = store
            .insert("alice", new_monitor("https://stale.example.com", 30))
            .await
            .unwrap();
        store
            .record_check(
                "alice",
                &stale.id,
                MonitorStatus::Up,
                Utc::now() - ChronoDuration::seconds(120),
            )
            .await
            .unwrap();

        let prober = MockProber::default();
        let calls = prober.calls.clone();
        let pinger = Pinger::new(store.clone(), prober, PingerSettings::default());

        let report = pinger.run_cycle(Utc::now()).await.unwrap();
        assert_eq!(report.due, 1);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["https://stale.example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_cycle_skips_empty_urls() {
        let store = Arc::new(MemoryStore::new());
        store.insert("alice", new_monitor("", 60)).await.unwrap();

        let prober = MockProber::default();
        let calls = prober.calls.clone();
        let pinger = Pinger::new(store, prober, PingerSettings::default());

        let report = pinger.run_cycle(Utc::now()).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.checked, 0);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_survives_cycle_error_and_stops_on_shutdown() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            list_calls: AtomicUsize::new(0),
        });
        let monitor = store
            .insert("alice", new_monitor("https://up.example.com", 60))
            .await
            .unwrap();

        let prober = MockProber::default().with("https://up.example.com", MonitorStatus::Up);
        let settings = PingerSettings {
            poll_interval: Duration::from_millis(20),
            concurrent_requests: 2,
        };
        let (tx, rx) = watch::channel(false);
        let handle = Pinger::new(store.clone(), prober, settings).spawn(rx);

        let mut checked = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let current = store.get("alice", &monitor.id).await.unwrap().unwrap();
            if current.status == MonitorStatus::Up {
                checked = true;
                break;
            }
        }
        assert!(checked, "pinger should recover after a failed cycle");

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("pinger should stop after shutdown")
            .unwrap();
    }
}
