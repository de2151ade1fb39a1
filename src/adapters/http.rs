use crate::config::PingerConfig;
use crate::domain::model::MonitorStatus;
use crate::domain::ports::Prober;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::time::Duration;

const MAX_REDIRECTS: usize = 10;

/// 以 HTTP GET 檢查網址狀態
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &PingerConfig) -> Result<Self> {
        Self::new(config.timeout(), &config.user_agent)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> MonitorStatus {
        match self.client.get(url).send().await {
            Ok(response) => {
                tracing::debug!("GET {} -> {}", url, response.status());
                MonitorStatus::from_http_status(response.status().as_u16())
            }
            Err(e) => {
                tracing::debug!("GET {} failed: {}", url, e);
                MonitorStatus::Down
            }
        }
    }
}
