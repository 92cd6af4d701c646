/// Round to `places` decimals, ties to even on the scaled value.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// `part / whole * 100` rounded to one decimal, 0 for an empty whole.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 1)
}
