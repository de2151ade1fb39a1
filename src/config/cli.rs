use crate::config::toml_config::{LogFormat, StoreBackend, TomlConfig};
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "site-pulse")]
#[command(about = "Uptime monitoring backend: HTTP API plus a background pinger")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Address to bind the API server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the API server to
    #[arg(long)]
    pub port: Option<u16>,

    /// Persist monitors to this JSON file instead of keeping them in memory
    #[arg(long)]
    pub store_path: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Do not start the background pinger
    #[arg(long)]
    pub no_pinger: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = &self.store_path {
            config.store.backend = StoreBackend::File;
            config.store.path = Some(path.clone());
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if self.no_pinger {
            config.pinger.enabled = false;
        }
    }
}
