use crate::record::FlightRecord;

/// Sums the revenue of a group of records. Returns 0.0 for an empty group.
pub fn revenue_sum(records: &[&FlightRecord]) -> f64 {
    records.iter().map(|r| r.revenue).sum()
}

/// Relative change from `start` to `result` in percent.
///
/// Returns `None` when `start` is zero or the ratio is not finite (a tiny
/// start with a huge result), instead of letting `inf`/`NaN` leak into the
/// output.
pub fn percent_change(start: f64, result: f64) -> Option<f64> {
    if start == 0.0 {
        return None;
    }
    let percent = (result / start - 1.0) * 100.0;
    percent.is_finite().then_some(percent)
}
