// Selectable history ranges, bounded by how long the backend keeps ping records
const PRESET_HOURS: [u32; 4] = [1, 6, 12, 24];

/// History ranges (in hours) a client may request.
///
/// Presets are offered when the backend keeps at least that much history.
/// A preserve time beyond the largest preset, or one above an hour that
/// matches no preset, is offered as an extra range.
pub fn available_views(preserve_hours: u32) -> Vec<u32> {
    if preserve_hours == 0 {
        return Vec::new();
    }

    let mut views: Vec<u32> = PRESET_HOURS
        .iter()
        .copied()
        .filter(|&h| preserve_hours >= h)
        .collect();

    let largest = PRESET_HOURS[PRESET_HOURS.len() - 1];
    if preserve_hours > largest || (preserve_hours > 1 && !PRESET_HOURS.contains(&preserve_hours)) {
        views.push(preserve_hours);
    }

    views
}

pub fn default_view(views: &[u32]) -> u32 {
    if views.contains(&1) {
        1
    } else {
        views.first().copied().unwrap_or(1)
    }
}
