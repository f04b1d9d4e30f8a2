//! Pilot-signal domains for charging stations.

use serde::Serialize;

/// The set of pilot magnitudes (A) a station is physically able to produce.
///
/// Membership is exact: no rounding to the nearest quantization step is
/// performed for discretized devices.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateDomain {
    /// Any rate in `[0, max_rate]`.
    Continuous { max_rate: f64 },
    /// Zero, or any rate in `[min_rate, max_rate]`.
    Deadband { min_rate: f64, max_rate: f64 },
    /// An explicit, sorted, deduplicated set that always contains zero.
    Discretized { rates: Vec<f64> },
}

impl RateDomain {
    /// Continuous domain `[0, max_rate]`.
    ///
    /// # Panics
    ///
    /// Panics if `max_rate` is negative or NaN.
    pub fn continuous(max_rate: f64) -> Self {
        assert!(max_rate >= 0.0, "max_rate must be >= 0");
        RateDomain::Continuous { max_rate }
    }

    /// Continuous domain with no upper bound.
    pub fn unbounded() -> Self {
        RateDomain::Continuous {
            max_rate: f64::INFINITY,
        }
    }

    /// Deadband domain: `0` or `[min_rate, max_rate]`.
    ///
    /// # Panics
    ///
    /// Panics if `min_rate` is negative or greater than `max_rate`.
    pub fn deadband(min_rate: f64, max_rate: f64) -> Self {
        assert!(min_rate >= 0.0, "min_rate must be >= 0");
        assert!(min_rate <= max_rate, "min_rate must be <= max_rate");
        RateDomain::Deadband { min_rate, max_rate }
    }

    /// Discretized domain built from `rates` in any order, with duplicates.
    ///
    /// The stored set is sorted ascending, deduplicated, and contains `0`
    /// exactly once.
    ///
    /// # Panics
    ///
    /// Panics if any rate is negative or not finite.
    pub fn discretized(rates: impl IntoIterator<Item = f64>) -> Self {
        // `+ 0.0` folds -0.0 into 0.0
        let mut rates: Vec<f64> = rates.into_iter().map(|r| r + 0.0).collect();
        assert!(
            rates.iter().all(|r| r.is_finite() && *r >= 0.0),
            "discretized rates must be finite and >= 0"
        );
        rates.push(0.0);
        rates.sort_by(f64::total_cmp);
        rates.dedup();
        RateDomain::Discretized { rates }
    }

    /// The read-only view of allowed rates.
    ///
    /// Ranges are reported as their `[low, high]` endpoints, discretized
    /// domains as the full set.
    pub fn allowed_rates(&self) -> Vec<f64> {
        match self {
            RateDomain::Continuous { max_rate } => vec![0.0, *max_rate],
            RateDomain::Deadband { min_rate, max_rate } => vec![*min_rate, *max_rate],
            RateDomain::Discretized { rates } => rates.clone(),
        }
    }

    /// Returns `true` if `rate` is a member of this domain.
    pub fn contains(&self, rate: f64) -> bool {
        if rate.is_nan() || rate < 0.0 {
            return false;
        }
        match self {
            RateDomain::Continuous { max_rate } => rate <= *max_rate,
            RateDomain::Deadband { min_rate, max_rate } => {
                rate == 0.0 || (rate >= *min_rate && rate <= *max_rate)
            }
            RateDomain::Discretized { rates } => rates.iter().any(|r| *r == rate),
        }
    }

    /// Largest rate in the domain.
    pub fn max_rate(&self) -> f64 {
        match self {
            RateDomain::Continuous { max_rate } | RateDomain::Deadband { max_rate, .. } => {
                *max_rate
            }
            RateDomain::Discretized { rates } => rates.last().copied().unwrap_or(0.0),
        }
    }

    /// Largest member of the domain that does not exceed `rate`.
    ///
    /// Used by baseline schedulers to pick a pilot the device accepts.
    pub fn floor(&self, rate: f64) -> f64 {
        if rate.is_nan() || rate <= 0.0 {
            return 0.0;
        }
        match self {
            RateDomain::Continuous { max_rate } => rate.min(*max_rate),
            RateDomain::Deadband { min_rate, max_rate } => {
                if rate < *min_rate {
                    0.0
                } else {
                    rate.min(*max_rate)
                }
            }
            RateDomain::Discretized { rates } => rates
                .iter()
                .copied()
                .take_while(|r| *r <= rate)
                .last()
                .unwrap_or(0.0),
        }
    }
}
