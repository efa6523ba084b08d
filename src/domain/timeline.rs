// Time-slot alignment: bucketing raw samples, gap filling and loss rate
use super::ping::{effective_interval, Sample, TaskId, DEFAULT_INTERVAL_SECONDS};
use serde::Serialize;
use std::collections::BTreeMap;

/// Samples closer than this are treated as the same moment.
pub const DEFAULT_COALESCE_TOLERANCE_MS: i64 = 1500;

/// Smallest slot spacing gap filling will produce.
pub const MIN_INTERVAL_MS: i64 = 1000;

/// Gap tolerance as a multiple of the interval when none is given.
pub const DEFAULT_TOLERANCE_FACTOR: f64 = 1.2;

/// One aligned point in time holding at most one value per task.
///
/// A task missing from `values` reads the same as an explicit `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeSlot {
    pub time_ms: i64,
    pub values: BTreeMap<TaskId, Option<f64>>,
}

impl TimeSlot {
    /// A slot with no data for any task
    pub fn gap(time_ms: i64) -> Self {
        Self {
            time_ms,
            values: BTreeMap::new(),
        }
    }

    pub fn value(&self, task_id: TaskId) -> Option<f64> {
        self.values.get(&task_id).copied().flatten()
    }

    pub fn is_gap(&self) -> bool {
        self.values.values().all(Option::is_none)
    }
}

/// Time slots in non-decreasing time order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct NormalizedSeries {
    slots: Vec<TimeSlot>,
}

impl NormalizedSeries {
    pub fn from_slots(mut slots: Vec<TimeSlot>) -> Self {
        slots.sort_by_key(|s| s.time_ms);
        Self { slots }
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<TimeSlot> {
        self.slots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn times(&self) -> Vec<i64> {
        self.slots.iter().map(|s| s.time_ms).collect()
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [TimeSlot] {
        &mut self.slots
    }
}

/// Coalesce time-ascending samples into aligned slots.
///
/// Each sample joins the first existing slot whose anchor lies within
/// `coalesce_tolerance_ms`, otherwise it anchors a new slot at its own
/// timestamp. A later sample from the same task in the same slot overwrites
/// the earlier one.
pub fn bucket_samples(samples: &[Sample], coalesce_tolerance_ms: i64) -> NormalizedSeries {
    let tolerance = coalesce_tolerance_ms.max(0) as u64;
    let mut slots: Vec<TimeSlot> = Vec::new();

    for sample in samples {
        match slots
            .iter_mut()
            .find(|slot| slot.time_ms.abs_diff(sample.time_ms) <= tolerance)
        {
            Some(slot) => {
                slot.values.insert(sample.task_id, Some(sample.value));
            }
            None => {
                let mut slot = TimeSlot::gap(sample.time_ms);
                slot.values.insert(sample.task_id, Some(sample.value));
                slots.push(slot);
            }
        }
    }

    NormalizedSeries::from_slots(slots)
}

/// Fixed span the filled series must cover, ending at `end_ms`.
///
/// The span is half-open: slots fall in `(end_ms - seconds, end_ms]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub end_ms: i64,
    pub seconds: f64,
}

impl Window {
    pub fn new(end_ms: i64, seconds: f64) -> Self {
        Self { end_ms, seconds }
    }

    fn span_ms(&self) -> Option<i64> {
        (self.seconds.is_finite() && self.seconds > 0.0)
            .then(|| (self.seconds * 1000.0).round() as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapFill {
    pub interval_seconds: f64,
    pub tolerance_seconds: Option<f64>,
    pub window: Option<Window>,
}

impl GapFill {
    pub fn new(interval_seconds: f64) -> Self {
        Self {
            interval_seconds,
            tolerance_seconds: None,
            window: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance_seconds: f64) -> Self {
        self.tolerance_seconds = Some(tolerance_seconds);
        self
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    fn interval_ms(&self) -> i64 {
        let seconds = effective_interval(Some(self.interval_seconds), DEFAULT_INTERVAL_SECONDS);
        ((seconds * 1000.0).round() as i64).max(MIN_INTERVAL_MS)
    }

    /// Never below the interval, otherwise inserted slots could not close a gap
    fn tolerance_ms(&self, interval_ms: i64) -> i64 {
        let tolerance = match self.tolerance_seconds {
            Some(t) if t.is_finite() && t > 0.0 => (t * 1000.0).round() as i64,
            _ => (interval_ms as f64 * DEFAULT_TOLERANCE_FACTOR).round() as i64,
        };
        tolerance.max(interval_ms)
    }
}

/// Insert null slots so no two neighbours are further apart than the
/// tolerance, then extend to the window boundaries when one is given.
///
/// Running it again on its own output adds nothing.
pub fn fill_gaps(series: &NormalizedSeries, fill: &GapFill) -> NormalizedSeries {
    let interval = fill.interval_ms();
    let tolerance = fill.tolerance_ms(interval);
    let mut slots: Vec<TimeSlot> = Vec::with_capacity(series.len());

    for slot in series.iter() {
        if let Some(mut t) = slots.last().map(|s: &TimeSlot| s.time_ms) {
            while slot.time_ms.saturating_sub(t) > tolerance {
                t += interval;
                slots.push(TimeSlot::gap(t));
            }
        }
        slots.push(slot.clone());
    }

    if let Some((window, span)) = fill.window.and_then(|w| w.span_ms().map(|span| (w, span))) {
        let start = window.end_ms.saturating_sub(span);

        let mut leading = Vec::new();
        let mut t = slots.first().map_or(window.end_ms + interval, |s| s.time_ms) - interval;
        while t > start {
            leading.push(TimeSlot::gap(t));
            t -= interval;
        }

        if !leading.is_empty() {
            leading.reverse();
            leading.append(&mut slots);
            slots = leading;
        }

        if let Some(mut t) = slots.last().map(|s| s.time_ms) {
            t += interval;
            while t <= window.end_ms {
                slots.push(TimeSlot::gap(t));
                t += interval;
            }
        }
    }

    NormalizedSeries { slots }
}

/// Percentage of slots without a value for `task_id`, rounded.
pub fn loss_rate(series: &NormalizedSeries, task_id: TaskId) -> u8 {
    if series.is_empty() {
        return 0;
    }

    let missing = series.iter().filter(|s| s.value(task_id).is_none()).count();
    (100.0 * missing as f64 / series.len() as f64).round() as u8
}
