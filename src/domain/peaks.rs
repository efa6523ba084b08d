// Peak suppression - smooths one-off spikes for display
use super::ping::TaskId;
use super::timeline::NormalizedSeries;
use serde::Deserialize;

/// Decides when a value counts as a spike.
///
/// A value is a spike when it exceeds `ratio` times the larger of its two
/// non-null neighbours and is at least `min_delta` above it. That larger
/// neighbour must be positive; negative markers such as a `-1` timeout never
/// make an ordinary value look like a spike.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PeakRule {
    pub ratio: f64,
    pub min_delta: f64,
}

impl Default for PeakRule {
    fn default() -> Self {
        Self {
            ratio: 2.0,
            min_delta: 5.0,
        }
    }
}

impl PeakRule {
    fn is_spike(&self, prev: f64, value: f64, next: f64) -> bool {
        let reference = prev.max(next);
        reference > 0.0
            && value > self.ratio * reference
            && value - reference >= self.min_delta
    }
}

/// Replace spikes in each task's values with the mean of their neighbours.
///
/// Nulls pass through and are skipped when looking for neighbours. Spikes
/// are detected on the input values, so two adjacent spikes are judged
/// against each other rather than against a smoothed value.
pub fn suppress_peaks(
    series: &NormalizedSeries,
    task_ids: &[TaskId],
    rule: &PeakRule,
) -> NormalizedSeries {
    let mut output = series.clone();

    for &task_id in task_ids {
        let present: Vec<(usize, f64)> = series
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.value(task_id).map(|v| (idx, v)))
            .collect();

        if present.len() < 3 {
            continue;
        }

        let slots = output.slots_mut();
        for window in present.windows(3) {
            let [(_, prev), (idx, value), (_, next)] = [window[0], window[1], window[2]];
            if rule.is_spike(prev, value, next) {
                slots[idx].values.insert(task_id, Some((prev + next) / 2.0));
            }
        }
    }

    output
}
