//! Histogram bucket ladders.
//!
//! A ladder is the ordered list of bucket upper bounds of a histogram. The
//! phase transition ladder spans half a second to one hour with coarsening
//! granularity and is shared by every phase transition latency histogram.

use crate::error::Error;

const SECOND: f64 = 1.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;

/// Bucket upper bounds, in seconds, for phase transition latencies.
pub const PHASE_TRANSITION_TIME_BUCKETS: [f64; 18] = [
    0.5 * SECOND,
    1.0 * SECOND,
    2.0 * SECOND,
    5.0 * SECOND,
    10.0 * SECOND,
    20.0 * SECOND,
    30.0 * SECOND,
    40.0 * SECOND,
    50.0 * SECOND,
    60.0 * SECOND,
    90.0 * SECOND,
    2.0 * MINUTE,
    3.0 * MINUTE,
    5.0 * MINUTE,
    10.0 * MINUTE,
    20.0 * MINUTE,
    30.0 * MINUTE,
    1.0 * HOUR,
];

/// Bucket upper bounds, in seconds, for phase transition latency histograms.
pub fn phase_transition_time_buckets() -> Vec<f64> {
    PHASE_TRANSITION_TIME_BUCKETS.to_vec()
}

/// Immutable, strictly increasing bucket upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketLadder {
    bounds: Vec<f64>,
}

impl BucketLadder {
    /// Create a ladder, validating that bounds are finite and strictly increasing.
    pub fn new(bounds: Vec<f64>) -> Result<Self, Error> {
        if bounds.is_empty() {
            return Err(Error::InvalidBuckets("ladder is empty".to_string()));
        }
        if let Some(bad) = bounds.iter().find(|b| !b.is_finite()) {
            return Err(Error::InvalidBuckets(format!("non-finite bound {}", bad)));
        }
        if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::InvalidBuckets(format!(
                "bounds not strictly increasing: {} then {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { bounds })
    }

    /// The phase transition latency ladder.
    pub fn phase_transition() -> Self {
        Self {
            bounds: phase_transition_time_buckets(),
        }
    }

    /// Upper bounds in order.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Number of finite buckets.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Always false; a ladder has at least one bound.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Smallest upper bound.
    pub fn first(&self) -> f64 {
        self.bounds[0]
    }

    /// Largest finite upper bound.
    pub fn last(&self) -> f64 {
        self.bounds[self.bounds.len() - 1]
    }

    /// Index of the bucket `value` falls into.
    ///
    /// Returns `len()` for values above the largest bound (the `+Inf` bucket).
    pub fn bucket_index(&self, value: f64) -> usize {
        self.bounds
            .iter()
            .position(|&boundary| value <= boundary)
            .unwrap_or(self.bounds.len())
    }

    /// Copy of the bounds, as taken by histogram options.
    pub fn to_vec(&self) -> Vec<f64> {
        self.bounds.clone()
    }
}

impl Default for BucketLadder {
    fn default() -> Self {
        Self::phase_transition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transition_values() {
        assert_eq!(
            phase_transition_time_buckets(),
            vec![
                0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 90.0, 120.0, 180.0, 300.0,
                600.0, 1200.0, 1800.0, 3600.0
            ]
        );
    }

    #[test]
    fn test_phase_transition_is_stable() {
        assert_eq!(phase_transition_time_buckets(), phase_transition_time_buckets());
        assert_eq!(BucketLadder::phase_transition(), BucketLadder::default());
    }

    #[test]
    fn test_phase_transition_is_valid_ladder() {
        let ladder = BucketLadder::new(phase_transition_time_buckets()).unwrap();
        assert_eq!(ladder.len(), 18);
        assert_eq!(ladder.first(), 0.5);
        assert_eq!(ladder.last(), 3600.0);
    }

    #[test]
    fn test_bucket_index() {
        let ladder = BucketLadder::phase_transition();
        assert_eq!(ladder.bucket_index(0.0), 0);
        assert_eq!(ladder.bucket_index(0.5), 0);
        assert_eq!(ladder.bucket_index(0.6), 1);
        assert_eq!(ladder.bucket_index(2.5), 3);
        assert_eq!(ladder.bucket_index(3600.0), 17);
        assert_eq!(ladder.bucket_index(3600.1), 18);
    }

    #[test]
    fn test_rejects_unordered() {
        assert!(BucketLadder::new(vec![1.0, 1.0]).is_err());
        assert!(BucketLadder::new(vec![2.0, 1.0]).is_err());
        assert!(BucketLadder::new(vec![]).is_err());
        assert!(BucketLadder::new(vec![1.0, f64::INFINITY]).is_err());
    }
}
