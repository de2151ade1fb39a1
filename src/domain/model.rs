use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Pending,
    Up,
    Down,
}

impl MonitorStatus {
    /// 最終回應狀態碼小於 400 視為 up
    pub fn from_http_status(code: u16) -> Self {
        if code < 400 {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: String,
    pub uid: String,
    pub name: String,
    pub url: String,
    /// 檢查間隔（秒）
    pub interval: u64,
    pub status: MonitorStatus,
    pub created_at: DateTime<Utc>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Monitor {
    pub fn new(id: String, uid: String, new: NewMonitor, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            uid,
            name: new.name,
            url: new.url,
            interval: new.interval,
            status: MonitorStatus::Pending,
            created_at,
            last_checked: None,
        }
    }

    /// Never-checked monitors are always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_checked {
            None => true,
            Some(last) => match i64::try_from(self.interval)
                .ok()
                .and_then(Duration::try_seconds)
            {
                Some(interval) => now.signed_duration_since(last) > interval,
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMonitor {
    pub name: String,
    pub url: String,
    pub interval: u64,
}
