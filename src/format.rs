//! Small display helpers shared by the session view and the terminal UI.

/// Format a position in seconds as `m:ss`.
///
/// Fractional seconds are truncated; negative and non-finite input render as
/// `0:00`.
pub fn format_time(seconds: f64) -> String {
    let secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Percentage of `value` within `[min, max]`, used for slider fills.
///
/// Returns 0 when the range is empty or inverted.
pub fn fill_percent(value: f64, min: f64, max: f64) -> f64 {
    if !(max > min) || !value.is_finite() {
        return 0.0;
    }
    (((value - min) / (max - min)) * 100.0).clamp(0.0, 100.0)
}
