use crate::config::{StoreBackend, StoreConfig};
use crate::domain::model::{Monitor, MonitorStatus, NewMonitor};
use crate::domain::ports::MonitorStore;
use crate::utils::error::{Result, SitePulseError};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// uid -> monitors in creation order
#[derive(Debug, Clone, Default)]
struct MonitorMap {
    users: BTreeMap<String, Vec<Monitor>>,
}

impl MonitorMap {
    fn from_monitors(monitors: Vec<Monitor>) -> Self {
        let mut map = Self::default();
        for monitor in monitors {
            map.users.entry(monitor.uid.clone()).or_default().push(monitor);
        }
        map
    }

    fn insert(&mut self, uid: &str, new: NewMonitor) -> Monitor {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let monitor = Monitor::new(id, uid.to_string(), new, Utc::now());
        self.users
            .entry(uid.to_string())
            .or_default()
            .push(monitor.clone());
        monitor
    }

    fn get(&self, uid: &str, id: &str) -> Option<Monitor> {
        self.users
            .get(uid)
            .and_then(|monitors| monitors.iter().find(|m| m.id == id))
            .cloned()
    }

    fn list_for_user(&self, uid: &str) -> Vec<Monitor> {
        self.users.get(uid).cloned().unwrap_or_default()
    }

    fn list_all(&self) -> Vec<Monitor> {
        self.users.values().flatten().cloned().collect()
    }

    fn delete(&mut self, uid: &str, id: &str) -> bool {
        let Some(monitors) = self.users.get_mut(uid) else {
            return false;
        };
        let before = monitors.len();
        monitors.retain(|m| m.id != id);
        let removed = monitors.len() != before;
        if monitors.is_empty() {
            self.users.remove(uid);
        }
        removed
    }

    fn record_check(
        &mut self,
        uid: &str,
        id: &str,
        status: MonitorStatus,
        checked_at: DateTime<Utc>,
    ) -> bool {
        let monitor = self
            .users
            .get_mut(uid)
            .and_then(|monitors| monitors.iter_mut().find(|m| m.id == id));
        match monitor {
            Some(monitor) => {
                monitor.status = status;
                monitor.last_checked = Some(checked_at);
                true
            }
            None => false,
        }
    }
}

/// 記憶體內的存儲實現，重啟後資料不保留
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MonitorMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MonitorStore for MemoryStore {
    async fn insert(&self, uid: &str, new: NewMonitor) -> Result<Monitor> {
        Ok(self.inner.write().await.insert(uid, new))
    }

    async fn get(&self, uid: &str, id: &str) -> Result<Option<Monitor>> {
        Ok(self.inner.read().await.get(uid, id))
    }

    async fn list_for_user(&self, uid: &str) -> Result<Vec<Monitor>> {
        Ok(self.inner.read().await.list_for_user(uid))
    }

    async fn list_all(&self) -> Result<Vec<Monitor>> {
        Ok(self.inner.read().await.list_all())
    }

    async fn delete(&self, uid: &str, id: &str) -> Result<bool> {
        Ok(self.inner.write().await.delete(uid, id))
    }

    async fn record_check(
        &self,
        uid: &str,
        id: &str,
        status: MonitorStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self
            .inner
            .write()
            .await
            .record_check(uid, id, status, checked_at))
    }
}

/// JSON 快照存儲：每次變更後整份重寫（先寫暫存檔再 rename）
///
/// A change is applied to a copy of the map and only becomes visible once the
/// snapshot is on disk. Writers are serialized by `write_lock`; readers are not
/// blocked while a snapshot is being written.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: RwLock<MonitorMap>,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// 檔案不存在時以空資料開始；檔案內容損壞則回傳錯誤
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let map = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let monitors: Vec<Monitor> = serde_json::from_slice(&bytes).map_err(|e| {
                    SitePulseError::store(format!(
                        "corrupt monitor snapshot {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                tracing::debug!("Loaded {} monitors from {}", monitors.len(), path.display());
                MonitorMap::from_monitors(monitors)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No snapshot at {}, starting empty", path.display());
                MonitorMap::default()
            }
            Err(e) => return Err(SitePulseError::IoError(e)),
        };

        Ok(Self {
            path,
            inner: RwLock::new(map),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, map: &MonitorMap) -> Result<()> {
        let data = serde_json::to_vec(&map.list_all())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!(
            "Wrote monitor snapshot ({} bytes) to {}",
            data.len(),
            self.path.display()
        );
        Ok(())
    }

    /// 在副本上套用變更，寫檔成功後才替換記憶體中的資料
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut MonitorMap) -> (T, bool) + Send,
    ) -> Result<T> {
        let _writer = self.write_lock.lock().await;

        let mut draft = self.inner.read().await.clone();
        let (value, changed) = change(&mut draft);
        if changed {
            self.persist(&draft).await?;
            *self.inner.write().await = draft;
        }
        Ok(value)
    }
}

#[async_trait]
impl MonitorStore for JsonFileStore {
    async fn insert(&self, uid: &str, new: NewMonitor) -> Result<Monitor> {
        self.commit(|map| (map.insert(uid, new), true)).await
    }

    async fn get(&self, uid: &str, id: &str) -> Result<Option<Monitor>> {
        Ok(self.inner.read().await.get(uid, id))
    }

    async fn list_for_user(&self, uid: &str) -> Result<Vec<Monitor>> {
        Ok(self.inner.read().await.list_for_user(uid))
    }

    async fn list_all(&self) -> Result<Vec<Monitor>> {
        Ok(self.inner.read().await.list_all())
    }

    async fn delete(&self, uid: &str, id: &str) -> Result<bool> {
        self.commit(|map| {
            let removed = map.delete(uid, id);
            (removed, removed)
        })
        .await
    }

    async fn record_check(
        &self,
        uid: &str,
        id: &str,
        status: MonitorStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.commit(|map| {
            let updated = map.record_check(uid, id, status, checked_at);
            (updated, updated)
        })
        .await
    }
}

/// 依配置建立存儲後端
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn MonitorStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory monitor store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::File => {
            let path = validate_required_field("store.path", &config.path)?;
            let store = JsonFileStore::open(path).await?;
            tracing::info!("Using file monitor store at {}", store.path().display());
            Ok(Arc::new(store))
        }
    }
}
