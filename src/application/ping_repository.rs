// Repository trait for ping history access
use crate::domain::ping::{lenient_number, RawPingRecord, TaskDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

/// Ping records and the tasks that produced them for one node
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PingHistory {
    #[serde(default)]
    pub records: Vec<RawPingRecord>,
    #[serde(default)]
    pub tasks: Vec<TaskDescriptor>,
}

/// Subset of the backend's public settings the charts depend on
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicInfo {
    /// Hours of ping history the backend keeps, zero when unknown
    #[serde(default, deserialize_with = "preserve_hours")]
    pub ping_record_preserve_time: u32,
}

/// Whole hours from any JSON number, zero for anything non-positive or non-numeric
fn preserve_hours<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let hours = lenient_number(deserializer)?;
    Ok(if hours > 0.0 {
        hours.min(f64::from(u32::MAX)) as u32
    } else {
        0
    })
}

#[async_trait]
pub trait PingRepository: Send + Sync {
    /// Fetch ping records for a node covering the last `hours`
    async fn fetch_ping_history(&self, uuid: &str, hours: u32) -> anyhow::Result<PingHistory>;

    async fn fetch_public_info(&self) -> anyhow::Result<PublicInfo>;
}
