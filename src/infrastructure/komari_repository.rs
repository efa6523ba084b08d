// Komari backend repository implementation
use crate::application::ping_repository::{PingHistory, PingRepository, PublicInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("backend reported {status}: {message}")]
    Api { status: String, message: String },
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    fn into_data(self) -> Result<Option<T>, BackendError> {
        if self.status != "success" {
            return Err(BackendError::Api {
                status: self.status,
                message: self.message,
            });
        }
        Ok(self.data)
    }
}

#[derive(Debug, Clone)]
pub struct KomariRepository {
    base_url: String,
    client: reqwest::Client,
}

impl KomariRepository {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn ping_url(&self, uuid: &str, hours: u32) -> String {
        format!(
            "{}/api/records/ping?uuid={}&hours={}",
            self.base_url,
            urlencoding::encode(uuid),
            hours
        )
    }

    fn public_url(&self) -> String {
        format!("{}/api/public", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to Komari backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body }.into());
        }

        let envelope = response
            .json::<ApiEnvelope<T>>()
            .await
            .context("Failed to parse Komari backend response")?;

        Ok(envelope.into_data()?)
    }
}

#[async_trait]
impl PingRepository for KomariRepository {
    async fn fetch_ping_history(&self, uuid: &str, hours: u32) -> Result<PingHistory> {
        let history = self
            .get_json::<PingHistory>(&self.ping_url(uuid, hours))
            .await?
            .unwrap_or_default();

        tracing::debug!(
            "Got {} ping records and {} tasks for {}",
            history.records.len(),
            history.tasks.len(),
            uuid
        );
        Ok(history)
    }

    async fn fetch_public_info(&self) -> Result<PublicInfo> {
        Ok(self
            .get_json::<PublicInfo>(&self.public_url())
            .await?
            .unwrap_or_default())
    }
}
