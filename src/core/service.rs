use crate::core::{Monitor, MonitorStore, NewMonitor};
use crate::utils::error::{Result, SitePulseError};
use crate::utils::validation::validate_url;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub const MISSING_FIELDS: &str = "Missing required fields.";
pub const UID_REQUIRED: &str = "User ID is required.";
pub const INVALID_INTERVAL: &str = "Interval must be a positive whole number of seconds.";
pub const INVALID_URL: &str = "URL must be a valid http(s) address.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddMonitorRequest {
    pub uid: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    /// 整數或數字字串，缺省時使用預設間隔
    pub interval: Option<Value>,
}

/// 監控項目的管理規則，存儲細節由 `MonitorStore` 負責
#[derive(Clone)]
pub struct MonitorService {
    store: Arc<dyn MonitorStore>,
    default_interval: u64,
}

impl MonitorService {
    pub fn new(store: Arc<dyn MonitorStore>, default_interval: u64) -> Self {
        Self {
            store,
            default_interval,
        }
    }

    pub fn store(&self) -> Arc<dyn MonitorStore> {
        Arc::clone(&self.store)
    }

    pub async fn add_monitor(&self, request: AddMonitorRequest) -> Result<Monitor> {
        let (Some(uid), Some(url), Some(name)) = (
            present(request.uid.as_deref()),
            present(request.url.as_deref()),
            present(request.name.as_deref()),
        ) else {
            return Err(SitePulseError::validation(MISSING_FIELDS));
        };

        validate_url("url", url).map_err(|_| SitePulseError::validation(INVALID_URL))?;
        let interval = parse_interval(request.interval.as_ref(), self.default_interval)?;

        let monitor = self
            .store
            .insert(
                uid,
                NewMonitor {
                    name: name.to_string(),
                    url: url.to_string(),
                    interval,
                },
            )
            .await?;

        tracing::info!(
            "Added monitor {} for user {} ({} every {}s)",
            monitor.id,
            uid,
            monitor.url,
            monitor.interval
        );
        Ok(monitor)
    }

    /// Deleting an absent monitor is not an error.
    pub async fn delete_monitor(&self, uid: Option<&str>, id: &str) -> Result<()> {
        let uid = present(uid).ok_or_else(|| SitePulseError::validation(UID_REQUIRED))?;

        if self.store.delete(uid, id).await? {
            tracing::info!("Deleted monitor {} for user {}", id, uid);
        } else {
            tracing::debug!("Delete of unknown monitor {} for user {}", id, uid);
        }
        Ok(())
    }

    pub async fn list_monitors(&self, uid: Option<&str>) -> Result<Vec<Monitor>> {
        let uid = present(uid).ok_or_else(|| SitePulseError::validation(UID_REQUIRED))?;
        self.store.list_for_user(uid).await
    }

    pub async fn get_monitor(&self, uid: Option<&str>, id: &str) -> Result<Monitor> {
        let uid = present(uid).ok_or_else(|| SitePulseError::validation(UID_REQUIRED))?;
        self.store
            .get(uid, id)
            .await?
            .ok_or_else(|| SitePulseError::NotFound { id: id.to_string() })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_interval(value: Option<&Value>, default: u64) -> Result<u64> {
    let interval = match value {
        None | Some(Value::Null) => Some(default),
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    match interval {
        Some(secs) if secs >= 1 => Ok(secs),
        _ => Err(SitePulseError::validation(INVALID_INTERVAL)),
    }
}
