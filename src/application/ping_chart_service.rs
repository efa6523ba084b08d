// Ping chart service - Use case for building normalized ping charts
use crate::application::ping_repository::PingRepository;
use crate::domain::chart::{build_chart, ChartRequest, NormalizeOptions, PingChart};
use crate::domain::ping::samples_from_records;
use crate::domain::views::{available_views, default_view};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewList {
    pub views: Vec<u32>,
    pub default: u32,
}

#[derive(Clone)]
pub struct PingChartService {
    repository: Arc<dyn PingRepository>,
    options: NormalizeOptions,
}

impl PingChartService {
    pub fn new(repository: Arc<dyn PingRepository>, options: NormalizeOptions) -> Self {
        Self { repository, options }
    }

    pub async fn get_chart(&self, uuid: &str, request: ChartRequest) -> anyhow::Result<PingChart> {
        self.get_chart_at(uuid, request, chrono::Utc::now().timestamp_millis())
            .await
    }

    async fn get_chart_at(
        &self,
        uuid: &str,
        mut request: ChartRequest,
        now_ms: i64,
    ) -> anyhow::Result<PingChart> {
        request.hours = self.options.clamp_hours(request.hours);

        let history = self
            .repository
            .fetch_ping_history(uuid, request.hours)
            .await
            .with_context(|| format!("Failed to fetch ping history for {}", uuid))?;

        let samples = samples_from_records(&history.records);
        tracing::debug!(
            "Fetched {} ping records ({} usable) and {} tasks for {}",
            history.records.len(),
            samples.len(),
            history.tasks.len(),
            uuid
        );

        Ok(build_chart(
            uuid,
            &samples,
            &history.tasks,
            &request,
            &self.options,
            now_ms,
        ))
    }

    pub async fn list_views(&self) -> anyhow::Result<ViewList> {
        let info = self
            .repository
            .fetch_public_info()
            .await
            .context("Failed to fetch public info")?;

        let views = available_views(info.ping_record_preserve_time);
        let default = default_view(&views);
        Ok(ViewList { views, default })
    }
}
