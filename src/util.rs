/// Arithmetic mean; `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Round half-to-even (banker's rounding).
///
/// The upstream service rounds segment boundaries and the correction/pause
/// millisecond totals this way, which differs from `f64::round` on exact
/// halves (2.5 -> 2, not 3).
pub fn round_half_even(value: f64) -> f64 {
    let floor = value.floor();
    let frac = value - floor;

    if frac > 0.5 {
        floor + 1.0
    } else if frac < 0.5 {
        floor
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}
