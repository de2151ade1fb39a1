use crate::domain::model::{Monitor, MonitorStatus, NewMonitor};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Monitors are stored per user, keyed `users/{uid}/monitors/{id}`.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    async fn insert(&self, uid: &str, new: NewMonitor) -> Result<Monitor>;
    async fn get(&self, uid: &str, id: &str) -> Result<Option<Monitor>>;
    async fn list_for_user(&self, uid: &str) -> Result<Vec<Monitor>>;
    async fn list_all(&self) -> Result<Vec<Monitor>>;
    async fn delete(&self, uid: &str, id: &str) -> Result<bool>;
    /// Updates only `status` and `last_checked`. Returns false if the monitor is gone.
    async fn record_check(
        &self,
        uid: &str,
        id: &str,
        status: MonitorStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<bool>;
}

#[async_trait]
pub trait Prober: Send + Sync {
    /// Never fails: any transport error is reported as `Down`.
    async fn probe(&self, url: &str) -> MonitorStatus;
}
