/// `entry_continuation_confirmed`: computed once the forward 5-day window
/// following an `ENTRY_WINDOW` promotion is fully known (spec §4.4, §8.5).
/// `series` is a close-price series in chronological order and
/// `entry_start_idx` is the index of the day the state became `ENTRY_WINDOW`.
///
/// Returns `None` when the forward window is not yet available — the caller
/// (the range evaluator) re-checks later once more days have been persisted.
/// Returns `Some(bool)` once decidable; the value is write-once on the attrs
/// row it belongs to and is never recomputed afterward.
pub fn compute_entry_continuation(series: &[f64], entry_start_idx: usize) -> Option<bool> {
    if entry_start_idx < 3 || entry_start_idx + 5 >= series.len() {
        return None;
    }

    let mut above_5 = 0u32;
    for day in 1..=5 {
        let idx = entry_start_idx + day;
        let sma5_start = idx.checked_sub(4)?;
        let sma5 = series[sma5_start..=idx].iter().sum::<f64>() / 5.0;
        if series[idx] > sma5 {
            above_5 += 1;
        }
    }

    Some(above_5 >= 3)
}
