/// Upper bound of the percentile scale.
const PERCENT_SCALE: f64 = 100.0;

/// Linear-interpolation percentile over ascending `sorted` samples.
///
/// The rank is `(p / 100) * (n - 1)`; an integral rank selects that sample,
/// otherwise the result lies on the line between the two neighbours.
/// `p` is clamped to `0..=100`; an empty slice yields `0.0`.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "linear interpolation between samples")]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    let rank = (p.clamp(0.0, PERCENT_SCALE) / PERCENT_SCALE) * last as f64;
    let lower_idx = rank.floor() as usize;
    let lower = sorted.get(lower_idx).copied().unwrap_or(0.0);
    let fraction = rank.fract();
    if fraction <= 0.0 {
        return lower;
    }
    match sorted.get(lower_idx.saturating_add(1)) {
        Some(upper) => lower + (upper - lower) * fraction,
        None => lower,
    }
}
