pub mod pinger;
pub mod service;

pub use crate::domain::model::{Monitor, MonitorStatus, NewMonitor};
pub use crate::domain::ports::{MonitorStore, Prober};
pub use crate::utils::error::Result;
