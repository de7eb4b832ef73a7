//! Phase transition timing.
//!
//! Objects record the moment they entered each lifecycle phase. The elapsed
//! time between two such moments is observed into latency histograms. When
//! transitions are very fast the recorded timestamps can be skewed so that the
//! later phase appears to start before the earlier one; those observations are
//! floored at zero.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::Error;

/// Elapsed time between two phase entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Elapsed seconds, never negative.
    pub seconds: f64,
    /// The raw difference was negative and was floored at zero.
    pub clamped: bool,
}

fn delta_seconds(delta: TimeDelta) -> f64 {
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        // Beyond ~292 years nanoseconds overflow; millisecond precision is plenty there.
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Compute the transition between entering a phase at `old_time` and the next
/// phase at `new_time`.
pub fn transition_time(
    old_time: Option<DateTime<Utc>>,
    new_time: Option<DateTime<Utc>>,
) -> Result<Transition, Error> {
    let (old, new) = match (old_time, new_time) {
        (Some(old), Some(new)) => (old, new),
        _ => return Err(Error::MissingTimestamp { old_time, new_time }),
    };

    let seconds = delta_seconds(new.signed_duration_since(old));
    if seconds < 0.0 {
        return Ok(Transition {
            seconds: 0.0,
            clamped: true,
        });
    }

    Ok(Transition {
        seconds,
        clamped: false,
    })
}

/// Elapsed seconds between `old_time` and `new_time`, floored at zero.
///
/// Fails with [`Error::MissingTimestamp`] when either timestamp is absent.
pub fn transition_time_seconds(
    old_time: Option<DateTime<Utc>>,
    new_time: Option<DateTime<Utc>>,
) -> Result<f64, Error> {
    transition_time(old_time, new_time).map(|t| t.seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MissingEndpoint;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_forward_transition() {
        let t = base();
        let later = t + TimeDelta::milliseconds(2500);
        assert_eq!(transition_time_seconds(Some(t), Some(later)).unwrap(), 2.5);
    }

    #[test]
    fn test_fractional_seconds_preserved() {
        let t = base();
        let later = t + TimeDelta::nanoseconds(1_000_000_250);
        let seconds = transition_time_seconds(Some(t), Some(later)).unwrap();
        assert_eq!(seconds, 1_000_000_250f64 / 1e9);
        assert!(seconds > 1.0);
    }

    #[test]
    fn test_skew_is_clamped() {
        let t = base();
        let earlier = t - TimeDelta::milliseconds(1);
        let transition = transition_time(Some(t), Some(earlier)).unwrap();
        assert_eq!(transition.seconds, 0.0);
        assert!(transition.clamped);
        assert_eq!(transition_time_seconds(Some(t), Some(earlier)).unwrap(), 0.0);
    }

    #[test]
    fn test_equal_timestamps() {
        let t = base();
        let transition = transition_time(Some(t), Some(t)).unwrap();
        assert_eq!(transition.seconds, 0.0);
        assert!(!transition.clamped);
    }

    #[test]
    fn test_missing_old_time() {
        let err = transition_time_seconds(None, Some(base())).unwrap_err();
        assert!(matches!(err, Error::MissingTimestamp { .. }));
        assert_eq!(err.missing_endpoint(), Some(MissingEndpoint::Old));
    }

    #[test]
    fn test_missing_new_time() {
        let err = transition_time_seconds(Some(base()), None).unwrap_err();
        assert_eq!(err.missing_endpoint(), Some(MissingEndpoint::New));
    }

    #[test]
    fn test_missing_both() {
        let err = transition_time_seconds(None, None).unwrap_err();
        assert_eq!(err.missing_endpoint(), Some(MissingEndpoint::Both));
    }

    #[test]
    fn test_many_forward_offsets() {
        let t = base();
        for millis in [0i64, 1, 999, 1000, 59_999, 3_600_000, 86_400_000] {
            let later = t + TimeDelta::milliseconds(millis);
            assert_eq!(
                transition_time_seconds(Some(t), Some(later)).unwrap(),
                millis as f64 / 1e3
            );
        }
    }

    #[test]
    fn test_many_backward_offsets() {
        let t = base();
        for millis in [1i64, 500, 60_000, 86_400_000] {
            let earlier = t - TimeDelta::milliseconds(millis);
            assert_eq!(transition_time_seconds(Some(t), Some(earlier)).unwrap(), 0.0);
        }
    }
}
