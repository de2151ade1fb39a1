pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{open_store, HttpProber, JsonFileStore, MemoryStore};
pub use api::{build_router, serve, AppState};
pub use crate::core::{
    pinger::{Pinger, PingerSettings},
    service::MonitorService,
};
pub use domain::model::{Monitor, MonitorStatus, NewMonitor};
pub use domain::ports::{MonitorStore, Prober};
pub use utils::error::{Result, SitePulseError};
