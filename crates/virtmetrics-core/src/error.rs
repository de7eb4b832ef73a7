//! Core error types.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Which end of a phase transition had no timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEndpoint {
    /// The earlier timestamp was absent.
    Old,
    /// The later timestamp was absent.
    New,
    /// Neither timestamp was present.
    Both,
}

impl MissingEndpoint {
    fn of(old_time: &Option<DateTime<Utc>>, new_time: &Option<DateTime<Utc>>) -> Option<Self> {
        match (old_time.is_none(), new_time.is_none()) {
            (true, true) => Some(MissingEndpoint::Both),
            (true, false) => Some(MissingEndpoint::Old),
            (false, true) => Some(MissingEndpoint::New),
            (false, false) => None,
        }
    }
}

impl fmt::Display for MissingEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingEndpoint::Old => f.write_str("old_time"),
            MissingEndpoint::New => f.write_str("new_time"),
            MissingEndpoint::Both => f.write_str("old_time and new_time"),
        }
    }
}

fn describe_missing(old_time: &Option<DateTime<Utc>>, new_time: &Option<DateTime<Utc>>) -> String {
    MissingEndpoint::of(old_time, new_time)
        .map(|m| m.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Core metrics errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A phase transition is missing one of its timestamps.
    #[error(
        "missing phase transition timestamp ({}), new_time: {new_time:?}, old_time: {old_time:?}",
        describe_missing(.old_time, .new_time)
    )]
    MissingTimestamp {
        old_time: Option<DateTime<Utc>>,
        new_time: Option<DateTime<Utc>>,
    },

    /// The metrics registry rejected a metric or collector.
    #[error("registration error: {0}")]
    Registration(#[from] prometheus::Error),

    /// A metric definition is invalid.
    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    /// A bucket ladder is invalid.
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
}

impl Error {
    /// For a missing timestamp error, which endpoint was absent.
    pub fn missing_endpoint(&self) -> Option<MissingEndpoint> {
        match self {
            Error::MissingTimestamp { old_time, new_time } => {
                MissingEndpoint::of(old_time, new_time)
            }
            _ => None,
        }
    }

    /// Whether the error must abort startup.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::MissingTimestamp { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_endpoint() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = Error::MissingTimestamp {
            old_time: None,
            new_time: Some(t),
        };
        assert_eq!(err.missing_endpoint(), Some(MissingEndpoint::Old));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("old_time"));

        let err = Error::MissingTimestamp {
            old_time: None,
            new_time: None,
        };
        assert_eq!(err.missing_endpoint(), Some(MissingEndpoint::Both));
    }

    #[test]
    fn test_registration_is_fatal() {
        let err = Error::Registration(prometheus::Error::AlreadyReg);
        assert!(err.is_fatal());
        assert_eq!(err.missing_endpoint(), None);
    }
}
