use crate::run::EquityPoint;

/// Default display budget for an equity series.
pub const DEFAULT_MAX_POINTS: usize = 900;

/// Reduces an ordered series to at most `max_points` by keeping every
/// stride-th point, where stride is `ceil(len / max_points)`. The result is
/// a pure subsequence — values are never interpolated or smoothed — and the
/// final input point is always part of it: when the stride walk misses it,
/// it is appended, or swapped for the last kept point when the output is
/// already at capacity.
pub fn downsample(points: Vec<EquityPoint>, max_points: usize) -> Vec<EquityPoint> {
    if max_points == 0 || points.len() <= max_points {
        return points;
    }

    let stride = points.len().div_ceil(max_points);
    let mut kept: Vec<EquityPoint> = points.iter().step_by(stride).cloned().collect();

    let final_point = &points[points.len() - 1];
    let landed = kept
        .last()
        .is_some_and(|point| point.date == final_point.date);
    if !landed {
        if kept.len() < max_points {
            kept.push(final_point.clone());
        } else if let Some(slot) = kept.last_mut() {
            *slot = final_point.clone();
        }
    }

    kept
}
