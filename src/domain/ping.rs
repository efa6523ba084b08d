// Ping domain models - raw backend records, parsed samples and task descriptors
use serde::{Deserialize, Deserializer, Serialize};

pub type TaskId = u64;

/// Interval used when a task reports no usable cadence.
pub const DEFAULT_INTERVAL_SECONDS: f64 = 60.0;

/// One record as returned by the monitoring backend.
///
/// `task_id`, `time` and `value` stay loosely typed so that a single bad
/// record is dropped instead of failing the whole payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPingRecord {
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub task_id: serde_json::Value,
    #[serde(default)]
    pub time: serde_json::Value,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub task_id: TaskId,
    pub time_ms: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(task_id: TaskId, time_ms: i64, value: f64) -> Self {
        Self {
            task_id,
            time_ms,
            value,
        }
    }

    /// Parse a backend record, returning `None` when any field is unusable
    pub fn from_record(record: &RawPingRecord) -> Option<Self> {
        let task_id = record.task_id.as_u64()?;
        let time = record.time.as_str()?;
        let time_ms = chrono::DateTime::parse_from_rfc3339(time)
            .ok()?
            .timestamp_millis();
        let value = record.value.as_f64().filter(|v| v.is_finite())?;

        Some(Self::new(task_id, time_ms, value))
    }
}

/// Parse records into samples sorted ascending by time.
///
/// Malformed records are dropped. The sort is stable so samples sharing a
/// timestamp keep their backend order.
pub fn samples_from_records(records: &[RawPingRecord]) -> Vec<Sample> {
    let mut samples: Vec<Sample> = records.iter().filter_map(Sample::from_record).collect();

    let dropped = records.len() - samples.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} malformed ping records of {}", dropped, records.len());
    }

    samples.sort_by_key(|s| s.time_ms);
    samples
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskDescriptor {
    pub id: TaskId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Zero when the backend sends none, see `effective_interval`
    #[serde(default, rename = "interval", deserialize_with = "lenient_number")]
    pub interval_seconds: f64,
}

/// Read any JSON value as a number, zero when it is not one
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

impl TaskDescriptor {
    pub fn new(id: TaskId, name: impl Into<String>, interval_seconds: f64) -> Self {
        Self {
            id,
            name: name.into(),
            interval_seconds,
        }
    }

    pub fn effective_interval(&self, default_seconds: f64) -> f64 {
        effective_interval(Some(self.interval_seconds), default_seconds)
    }
}

/// Resolve a configured interval, falling back when it is zero, negative or not finite
pub fn effective_interval(interval_seconds: Option<f64>, default_seconds: f64) -> f64 {
    match interval_seconds {
        Some(i) if i.is_finite() && i > 0.0 => i,
        _ if default_seconds.is_finite() && default_seconds > 0.0 => default_seconds,
        _ => DEFAULT_INTERVAL_SECONDS,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestValue {
    pub task_id: TaskId,
    pub value: Option<f64>,
    pub time_ms: Option<i64>,
}

/// Most recent sample for each task, in task order
pub fn latest_values(samples: &[Sample], tasks: &[TaskDescriptor]) -> Vec<LatestValue> {
    tasks
        .iter()
        .map(|task| {
            let latest = samples.iter().rev().find(|s| s.task_id == task.id);
            LatestValue {
                task_id: task.id,
                value: latest.map(|s| s.value),
                time_ms: latest.map(|s| s.time_ms),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(
        task_id: serde_json::Value,
        time: serde_json::Value,
        value: serde_json::Value,
    ) -> RawPingRecord {
        RawPingRecord {
            client: "node-1".to_string(),
            task_id,
            time,
            value,
        }
    }

    #[test]
    fn test_from_record_parses_rfc3339() {
        let r = record(json!(3), json!("1970-01-01T00:00:01.500Z"), json!(42.5));
        let sample = Sample::from_record(&r).unwrap();

        assert_eq!(sample, Sample::new(3, 1500, 42.5));
    }

    #[test]
    fn test_from_record_drops_malformed() {
        assert!(Sample::from_record(&record(json!(1), json!("not a time"), json!(1.0))).is_none());
        assert!(Sample::from_record(&record(json!(1), json!(null), json!(1.0))).is_none());
        let time = json!("2024-01-01T00:00:00Z");
        assert!(Sample::from_record(&record(json!(1), time.clone(), json!("12"))).is_none());
        assert!(Sample::from_record(&record(json!(-1), time, json!(1.0))).is_none());
        assert!(Sample::from_record(&RawPingRecord::default()).is_none());
    }

    #[test]
    fn test_samples_from_records_sorts_and_skips_bad_rows() {
        let records = vec![
            record(json!(1), json!("2024-01-01T00:02:00Z"), json!(30.0)),
            record(json!(1), json!("garbage"), json!(99.0)),
            record(json!(2), json!("2024-01-01T00:00:00Z"), json!(10.0)),
            record(json!(1), json!("2024-01-01T00:01:00Z"), json!(20.0)),
        ];

        let samples = samples_from_records(&records);
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();

        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_effective_interval_fallback() {
        assert_eq!(effective_interval(Some(30.0), 60.0), 30.0);
        assert_eq!(effective_interval(Some(0.0), 60.0), 60.0);
        assert_eq!(effective_interval(Some(f64::NAN), 60.0), 60.0);
        assert_eq!(effective_interval(None, 0.0), DEFAULT_INTERVAL_SECONDS);

        let task = TaskDescriptor::new(1, "tcp", -5.0);
        assert_eq!(task.effective_interval(45.0), 45.0);
    }

    #[test]
    fn test_task_descriptor_reads_backend_field_names() {
        let task: TaskDescriptor =
            serde_json::from_value(json!({ "id": 7, "name": "CN-CT", "interval": 30 })).unwrap();

        assert_eq!(task, TaskDescriptor::new(7, "CN-CT", 30.0));
    }

    #[test]
    fn test_task_descriptor_tolerates_unusable_interval() {
        let tasks: Vec<TaskDescriptor> = serde_json::from_value(json!([
            { "id": 1, "name": "CT", "interval": null },
            { "id": 2, "name": null, "interval": "30" },
            { "id": 3 }
        ]))
        .unwrap();

        assert!(tasks.iter().all(|t| t.interval_seconds == 0.0));
        assert_eq!(tasks[1].name, "");
        assert_eq!(tasks[0].effective_interval(DEFAULT_INTERVAL_SECONDS), 60.0);
    }

    #[test]
    fn test_latest_values() {
        let samples = vec![
            Sample::new(1, 0, 10.0),
            Sample::new(2, 500, 11.0),
            Sample::new(1, 60_000, 12.0),
        ];
        let tasks = vec![
            TaskDescriptor::new(1, "a", 60.0),
            TaskDescriptor::new(2, "b", 60.0),
            TaskDescriptor::new(3, "c", 60.0),
        ];

        let latest = latest_values(&samples, &tasks);

        assert_eq!(latest[0].value, Some(12.0));
        assert_eq!(latest[0].time_ms, Some(60_000));
        assert_eq!(latest[1].value, Some(11.0));
        assert_eq!(latest[2].value, None);
        assert_eq!(latest[2].time_ms, None);
    }
}
