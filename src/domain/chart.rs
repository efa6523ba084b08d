// Chart domain model - normalized ping series projected per task
use super::peaks::{suppress_peaks, PeakRule};
use super::ping::{
    effective_interval, latest_values, LatestValue, Sample, TaskDescriptor, TaskId,
    DEFAULT_INTERVAL_SECONDS,
};
use super::timeline::{
    bucket_samples, fill_gaps, loss_rate, GapFill, Window, DEFAULT_COALESCE_TOLERANCE_MS,
    DEFAULT_TOLERANCE_FACTOR,
};
use serde::{Deserialize, Serialize};

pub const PALETTE: [&str; 8] = [
    "#0A84FF", "#30D158", "#FF9F0A", "#FF375F", "#5E5CE6", "#64D2FF", "#BF5AF2", "#FFD60A",
];

/// Longest history a chart may span, 30 days.
pub const DEFAULT_MAX_HOURS: u32 = 720;

pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Tunables for the normalization pipeline
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub coalesce_tolerance_ms: i64,
    pub default_interval_seconds: f64,
    pub tolerance_factor: f64,
    pub max_hours: u32,
    pub peak_rule: PeakRule,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            coalesce_tolerance_ms: DEFAULT_COALESCE_TOLERANCE_MS,
            default_interval_seconds: DEFAULT_INTERVAL_SECONDS,
            tolerance_factor: DEFAULT_TOLERANCE_FACTOR,
            max_hours: DEFAULT_MAX_HOURS,
            peak_rule: PeakRule::default(),
        }
    }
}

impl NormalizeOptions {
    /// Bound requested hours to `1..=max_hours`
    pub fn clamp_hours(&self, hours: u32) -> u32 {
        hours.clamp(1, self.max_hours.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    /// Covers the whole requested window, padding with gaps
    #[default]
    Full,
    /// Spans only the data actually received
    Mini,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartRequest {
    pub hours: u32,
    pub cut_peak: bool,
    pub mode: ChartMode,
}

impl ChartRequest {
    pub fn new(hours: u32) -> Self {
        Self {
            hours,
            cut_peak: false,
            mode: ChartMode::Full,
        }
    }

    pub fn with_cut_peak(mut self, cut_peak: bool) -> Self {
        self.cut_peak = cut_peak;
        self
    }

    pub fn with_mode(mut self, mode: ChartMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: i64,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSeries {
    pub task_id: TaskId,
    pub name: String,
    pub color: &'static str,
    pub interval_seconds: f64,
    pub loss_rate: u8,
    pub latest: LatestValue,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingChart {
    pub uuid: String,
    pub hours: u32,
    pub cut_peak: bool,
    pub mode: ChartMode,
    pub series: Vec<TaskSeries>,
}

/// Run bucketing, gap filling and optional peak suppression, then project
/// one point array per task.
///
/// Cadence and tolerance come from the first task. Loss rates are taken from
/// the filled series before any smoothing. Requested hours are bounded by
/// `options.max_hours`.
pub fn build_chart(
    uuid: &str,
    samples: &[Sample],
    tasks: &[TaskDescriptor],
    request: &ChartRequest,
    options: &NormalizeOptions,
    now_ms: i64,
) -> PingChart {
    let hours = options.clamp_hours(request.hours);
    let interval = effective_interval(
        tasks.first().map(|t| t.interval_seconds),
        options.default_interval_seconds,
    );
    let mut fill = GapFill::new(interval).with_tolerance(interval * options.tolerance_factor);
    if request.mode == ChartMode::Full {
        fill = fill.with_window(Window::new(now_ms, f64::from(hours) * 3600.0));
    }

    let filled = fill_gaps(&bucket_samples(samples, options.coalesce_tolerance_ms), &fill);

    let suppressed;
    let shown = if request.cut_peak && !tasks.is_empty() {
        let task_ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        suppressed = suppress_peaks(&filled, &task_ids, &options.peak_rule);
        &suppressed
    } else {
        &filled
    };

    tracing::debug!(
        "Normalized {} samples into {} slots for {} ({} tasks, interval {}s)",
        samples.len(),
        shown.len(),
        uuid,
        tasks.len(),
        interval
    );

    let series = tasks
        .iter()
        .zip(latest_values(samples, tasks))
        .enumerate()
        .map(|(idx, (task, latest))| TaskSeries {
            task_id: task.id,
            name: task.name.clone(),
            color: color_for(idx),
            interval_seconds: task.effective_interval(options.default_interval_seconds),
            loss_rate: loss_rate(&filled, task.id),
            latest,
            points: shown
                .iter()
                .map(|slot| ChartPoint {
                    x: slot.time_ms,
                    y: slot.value(task.id),
                })
                .collect(),
        })
        .collect();

    PingChart {
        uuid: uuid.to_string(),
        hours,
        cut_peak: request.cut_peak,
        mode: request.mode,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_400_000;

    fn tasks() -> Vec<TaskDescriptor> {
        vec![TaskDescriptor::new(1, "CT", 60.0), TaskDescriptor::new(2, "CU", 60.0)]
    }

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new(1, NOW - 180_000, 20.0),
            Sample::new(2, NOW - 179_000, 30.0),
            Sample::new(1, NOW - 120_000, 400.0),
            Sample::new(2, NOW - 119_500, 31.0),
            Sample::new(1, NOW - 60_000, 22.0),
            Sample::new(1, NOW, 21.0),
            Sample::new(2, NOW + 800, 29.0),
        ]
    }

    fn chart_for(
        samples: &[Sample],
        tasks: &[TaskDescriptor],
        request: &ChartRequest,
    ) -> PingChart {
        build_chart("node", samples, tasks, request, &NormalizeOptions::default(), NOW)
    }

    #[test]
    fn test_full_chart_covers_window() {
        let chart = chart_for(&samples(), &tasks(), &ChartRequest::new(1));

        assert_eq!(chart.series.len(), 2);
        let ct = &chart.series[0];
        assert_eq!(ct.points.len(), 60);
        assert_eq!(ct.points.last().unwrap().x, NOW);
        assert_eq!(ct.points[0].x, NOW - 3_540_000);
        assert_eq!(ct.loss_rate, 93);
        assert_eq!(ct.latest.value, Some(21.0));

        let cu = &chart.series[1];
        assert_eq!(cu.points[57].y, Some(31.0));
        assert_eq!(cu.points[58].y, None);
        assert_eq!(cu.loss_rate, 95);
        assert_eq!(cu.latest.value, Some(29.0));
    }

    #[test]
    fn test_mini_chart_spans_data_only() {
        let request = ChartRequest::new(1).with_mode(ChartMode::Mini);
        let chart = chart_for(&samples(), &tasks(), &request);

        let ys: Vec<Option<f64>> = chart.series[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![Some(20.0), Some(400.0), Some(22.0), Some(21.0)]);
        assert_eq!(chart.series[1].loss_rate, 25);
    }

    #[test]
    fn test_cut_peak_smooths_without_changing_loss() {
        let request = ChartRequest::new(1).with_mode(ChartMode::Mini).with_cut_peak(true);
        let chart = chart_for(&samples(), &tasks(), &request);

        let ys: Vec<Option<f64>> = chart.series[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![Some(20.0), Some(21.0), Some(22.0), Some(21.0)]);
        assert_eq!(chart.series[0].loss_rate, 0);
        assert!(chart.cut_peak);
    }

    #[test]
    fn test_colors_follow_task_order() {
        let tasks: Vec<TaskDescriptor> = (0..10)
            .map(|i| TaskDescriptor::new(i, format!("t{i}"), 60.0))
            .collect();
        let chart = chart_for(&[], &tasks, &ChartRequest::new(1));

        assert_eq!(chart.series[0].color, PALETTE[0]);
        assert_eq!(chart.series[8].color, PALETTE[0]);
        assert_eq!(chart.series[9].color, PALETTE[1]);
        assert!(chart.series.iter().all(|s| s.loss_rate == 100));
    }

    #[test]
    fn test_no_tasks_yields_no_series() {
        let chart = chart_for(&samples(), &[], &ChartRequest::new(6));

        assert!(chart.series.is_empty());
        assert_eq!(chart.hours, 6);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: NormalizeOptions =
            serde_json::from_value(serde_json::json!({ "tolerance_factor": 1.5 })).unwrap();

        assert_eq!(options.tolerance_factor, 1.5);
        assert_eq!(options.coalesce_tolerance_ms, 1500);
        assert_eq!(options.max_hours, DEFAULT_MAX_HOURS);
        assert_eq!(options.peak_rule, PeakRule::default());
    }

    #[test]
    fn test_requested_hours_bounded() {
        let options = NormalizeOptions {
            max_hours: 24,
            ..Default::default()
        };
        let chart = build_chart("node", &[], &tasks(), &ChartRequest::new(u32::MAX), &options, NOW);

        assert_eq!(chart.hours, 24);
        assert_eq!(chart.series[0].points.len(), 24 * 60);
        assert_eq!(options.clamp_hours(0), 1);
        assert_eq!(options.clamp_hours(12), 12);
    }

    #[test]
    fn test_zero_max_hours_still_allows_an_hour() {
        let options = NormalizeOptions {
            max_hours: 0,
            ..Default::default()
        };

        assert_eq!(options.clamp_hours(48), 1);
    }
}
