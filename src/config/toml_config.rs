use crate::utils::error::{Result, SitePulseError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "SitePulse/1.0 (+https://your-frontend-url.netlify.app)";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub pinger: PingerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PingerConfig {
    pub enabled: bool,
    pub poll_interval_seconds: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub concurrent_requests: usize,
    pub default_interval_seconds: u64,
}

impl Default for PingerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_seconds: 5,
            timeout_seconds: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrent_requests: 5,
            default_interval_seconds: 60,
        }
    }
}

impl PingerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SitePulseError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SitePulseError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SITEPULSE_STORE_PATH})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SitePulseError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_positive_number("server.port", u64::from(self.server.port), 1)?;

        if self.store.backend == StoreBackend::File {
            let path = validation::validate_required_field("store.path", &self.store.path)?;
            validation::validate_path("store.path", path)?;
        }

        validation::validate_positive_number(
            "pinger.poll_interval_seconds",
            self.pinger.poll_interval_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "pinger.timeout_seconds",
            self.pinger.timeout_seconds,
            1,
        )?;
        validation::validate_range(
            "pinger.concurrent_requests",
            self.pinger.concurrent_requests,
            1,
            256,
        )?;
        validation::validate_positive_number(
            "pinger.default_interval_seconds",
            self.pinger.default_interval_seconds,
            1,
        )?;
        validation::validate_non_empty_string("pinger.user_agent", &self.pinger.user_agent)?;

        if let Some(level) = &self.logging.level {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level.as_str()) {
                return Err(SitePulseError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }

    /// 取得監聽位址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_container_contract() {
        let config = TomlConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.pinger.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.pinger.timeout(), Duration::from_secs(10));
        assert_eq!(config.pinger.default_interval_seconds, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080

[store]
backend = "file"
path = "./data/monitors.json"

[pinger]
poll_interval_seconds = 2
concurrent_requests = 10

[logging]
format = "json"
level = "debug"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.path.as_deref(), Some("./data/monitors.json"));
        assert_eq!(config.pinger.poll_interval_seconds, 2);
        assert_eq!(config.pinger.concurrent_requests, 10);
        assert_eq!(config.pinger.timeout_seconds, 10);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SITEPULSE_TEST_STORE_PATH", "/tmp/sitepulse-monitors.json");

        let toml_content = r#"
[store]
backend = "file"
path = "${SITEPULSE_TEST_STORE_PATH}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.store.path.as_deref(),
            Some("/tmp/sitepulse-monitors.json")
        );

        std::env::remove_var("SITEPULSE_TEST_STORE_PATH");
    }

    #[test]
    fn test_config_validation() {
        let missing_path = TomlConfig::from_toml_str("[store]\nbackend = \"file\"\n").unwrap();
        assert!(matches!(
            missing_path.validate(),
            Err(SitePulseError::MissingConfigError { .. })
        ));

        let zero_port = TomlConfig::from_toml_str("[server]\nport = 0\n").unwrap();
        assert!(zero_port.validate().is_err());

        let bad_level = TomlConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(bad_level.validate().is_err());

        let no_workers =
            TomlConfig::from_toml_str("[pinger]\nconcurrent_requests = 0\n").unwrap();
        assert!(no_workers.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = TomlConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, SitePulseError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[server]
port = 5050

[pinger]
enabled = false
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 5050);
        assert!(!config.pinger.enabled);
    }
}
