//! Summarization time window.

use chrono::{DateTime, Duration, SubsecRound, Utc};

use super::models::TimeWindow;
use crate::errors::SummarizerError;

/// Compute the interval `[now - lookback_hours, now]`, both ends truncated to whole seconds.
///
/// # Errors
///
/// Returns `InvalidConfiguration` when `lookback_hours` is zero, negative, or too
/// large to represent.
pub fn compute_window(now: DateTime<Utc>, lookback_hours: i64) -> Result<TimeWindow, SummarizerError> {
    if lookback_hours <= 0 {
        return Err(SummarizerError::InvalidConfiguration(format!(
            "lookback must be a positive number of hours, got {lookback_hours}"
        )));
    }

    let lookback = Duration::try_hours(lookback_hours).ok_or_else(|| {
        SummarizerError::InvalidConfiguration(format!("lookback of {lookback_hours} hours is out of range"))
    })?;

    let end = now.trunc_subsecs(0);
    let start = end.checked_sub_signed(lookback).ok_or_else(|| {
        SummarizerError::InvalidConfiguration(format!("lookback of {lookback_hours} hours is out of range"))
    })?;

    Ok(TimeWindow::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_window_spans_lookback_and_drops_subseconds() {
        let now = Utc
            .with_ymd_and_hms(2024, 5, 18, 10, 0, 0)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();

        let window = compute_window(now, 25).unwrap();

        assert_eq!(window.end(), Utc.with_ymd_and_hms(2024, 5, 18, 10, 0, 0).unwrap());
        assert_eq!(window.start(), Utc.with_ymd_and_hms(2024, 5, 17, 9, 0, 0).unwrap());
        assert_eq!(window.start().nanosecond(), 0);
        assert!(window.start() < window.end());
    }

    #[test]
    fn test_non_positive_lookback_is_rejected() {
        let now = Utc::now();
        for hours in [0, -1, -25] {
            let err = compute_window(now, hours).unwrap_err();
            assert!(matches!(err, SummarizerError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_huge_lookback_is_rejected() {
        let err = compute_window(Utc::now(), i64::MAX).unwrap_err();
        assert!(matches!(err, SummarizerError::InvalidConfiguration(_)));
    }
}
