//! Score normalization, confidence and smoothing helpers

/// Clamp a score into [0, 1]
pub fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// `min(count / high_confidence_count, 1)`
pub fn confidence(count: u32, high_confidence_count: u32) -> f64 {
    if high_confidence_count == 0 {
        return 1.0;
    }
    (count as f64 / high_confidence_count as f64).min(1.0)
}

/// Per-record success contribution: rating share plus approval share
pub fn success_increment(
    rating: f64,
    max_rating: f64,
    approved: bool,
    rating_weight: f64,
    approval_weight: f64,
) -> f64 {
    let approval = if approved { 1.0 } else { 0.0 };
    (rating / max_rating) * rating_weight + approval * approval_weight
}

/// Exponential smoothing: `stored * (1 - rate) + new * rate`
pub fn smooth(stored: f64, new: f64, rate: f64) -> f64 {
    stored * (1.0 - rate) + new * rate
}

/// Ranking multiplier in [0.5, 1.5] for a normalized score
pub fn adjustment_multiplier(normalized_score: f64) -> f64 {
    0.5 + clamp_unit(normalized_score)
}

/// `numerator / max(count, 1)`
pub fn per_selection(numerator: f64, count: u32) -> f64 {
    numerator / count.max(1) as f64
}
