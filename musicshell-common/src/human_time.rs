//! Human-readable duration formatting
//!
//! Track durations are shown to API clients as `mm:ss`.

use std::time::Duration;

/// Format a track duration as `mm:ss`.
///
/// Only the minutes component within the hour is shown, so a track longer
/// than an hour wraps (`1:02:03` formats as `02:03`).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use musicshell_common::human_time::format_mm_ss;
///
/// assert_eq!(format_mm_ss(Duration::from_secs(0)), "00:00");
/// assert_eq!(format_mm_ss(Duration::from_secs(185)), "03:05");
/// ```
pub fn format_mm_ss(duration: Duration) -> String {
    let total = duration.as_secs();
    let minutes = (total / 60) % 60;
    let seconds = total % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_under_a_minute() {
        assert_eq!(format_mm_ss(Duration::from_secs(7)), "00:07");
        assert_eq!(format_mm_ss(Duration::from_millis(59_999)), "00:59");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_mm_ss(Duration::from_secs(180)), "03:00");
        assert_eq!(format_mm_ss(Duration::from_secs(599)), "09:59");
    }

    #[test]
    fn test_format_wraps_past_one_hour() {
        assert_eq!(format_mm_ss(Duration::from_secs(3600 + 123)), "02:03");
    }
}
