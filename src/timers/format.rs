//! Rendering helpers for timer display

/// Format a duration as `M:SS`, or `H:MM:SS` from one hour up
///
/// Partial seconds round up so a running timer never shows `0:00`
/// before it has actually completed.
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms.div_ceil(1000);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Fraction of the countdown already elapsed, in `0.0..=1.0`
pub fn progress(time_left_ms: u64, total_duration_ms: u64) -> f64 {
    if total_duration_ms == 0 {
        return 1.0;
    }
    let elapsed = total_duration_ms.saturating_sub(time_left_ms);
    (elapsed as f64 / total_duration_ms as f64).clamp(0.0, 1.0)
}
