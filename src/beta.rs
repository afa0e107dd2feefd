//! Dynamic beta estimation
//!
//! Scalar Kalman filter with beta as the state, a random-walk process model
//! and the observation model `dependent_t = beta_t * driver_t + noise`.
//! Also estimates the lead/lag between a driver market and a dependent one
//! (e.g. a US supplier and its Taiwanese customer).

use serde::{Deserialize, Serialize};

use crate::stats;

/// Initial beta before any observation
pub const INITIAL_BETA: f64 = 1.0;
/// Initial state variance
pub const INITIAL_VARIANCE: f64 = 1.0;

/// Filter noise parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BetaConfig {
    /// Process noise Q
    pub process_noise: f64,
    /// Observation noise R
    pub observation_noise: f64,
    /// Largest lag tried by the lead/lag search
    pub max_lag: usize,
}

impl Default for BetaConfig {
    fn default() -> Self {
        BetaConfig {
            process_noise: 0.01,
            observation_noise: 0.1,
            max_lag: 5,
        }
    }
}

/// Filtered beta after one observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaEstimate {
    pub value: f64,
    pub variance: f64,
}

/// Recursive beta filter
///
/// Kept as an explicit state machine so callers can feed observations one at
/// a time as they arrive; [`kalman_beta`] runs it over whole series.
#[derive(Debug, Clone)]
pub struct KalmanBeta {
    beta: f64,
    variance: f64,
    process_noise: f64,
    observation_noise: f64,
}

impl KalmanBeta {
    pub fn new(process_noise: f64, observation_noise: f64) -> Self {
        Self {
            beta: INITIAL_BETA,
            variance: INITIAL_VARIANCE,
            process_noise,
            observation_noise,
        }
    }

    pub fn from_config(config: &BetaConfig) -> Self {
        Self::new(config.process_noise, config.observation_noise)
    }

    /// Predict-then-update with one (driver, dependent) observation
    pub fn update(&mut self, driver: f64, dependent: f64) -> BetaEstimate {
        // Predict: random walk keeps beta, inflates variance
        let beta_pred = self.beta;
        let var_pred = self.variance + self.process_noise;

        let innovation = dependent - driver * beta_pred;
        let innovation_var = driver * var_pred * driver + self.observation_noise;

        if innovation_var == 0.0 || !innovation_var.is_finite() {
            // Observation carries no information; keep the prediction
            self.variance = var_pred;
        } else {
            let gain = var_pred * driver / innovation_var;
            self.beta = beta_pred + gain * innovation;
            self.variance = (1.0 - gain * driver) * var_pred;
        }

        self.estimate()
    }

    pub fn estimate(&self) -> BetaEstimate {
        BetaEstimate {
            value: self.beta,
            variance: self.variance,
        }
    }
}

/// Run the filter over two aligned return series
///
/// Mismatched or empty input yields an empty path.
pub fn kalman_beta(
    driver: &[f64],
    dependent: &[f64],
    process_noise: f64,
    observation_noise: f64,
) -> Vec<BetaEstimate> {
    if driver.len() != dependent.len() || driver.is_empty() {
        tracing::debug!(
            "Kalman beta skipped: driver={} dependent={} observations",
            driver.len(),
            dependent.len()
        );
        return Vec::new();
    }

    let mut filter = KalmanBeta::new(process_noise, observation_noise);
    driver
        .iter()
        .zip(dependent)
        .map(|(&h, &z)| filter.update(h, z))
        .collect()
}

/// Lead/lag between a driver and a dependent series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadLag {
    /// Periods by which the dependent series trails the driver
    pub lag: usize,
    pub correlation: f64,
}

/// Estimate how many periods the dependent series lags the driver
///
/// For each lag in `0..=max_lag`, correlates `driver[..n-lag]` with
/// `dependent[lag..]` and keeps the lag with the largest absolute
/// correlation; the smallest lag wins ties. Needs `max_lag + 10`
/// observations in both series, otherwise returns lag 0 with correlation 0.
pub fn estimate_lead_lag(driver: &[f64], dependent: &[f64], max_lag: usize) -> LeadLag {
    let none = LeadLag {
        lag: 0,
        correlation: 0.0,
    };
    if driver.len() < max_lag + 10 || dependent.len() < max_lag + 10 {
        return none;
    }

    let mut best = none;
    for lag in 0..=max_lag {
        let corr = if lag == 0 {
            stats::pearson(driver, dependent)
        } else {
            let d = &driver[..driver.len() - lag];
            let y = &dependent[lag..];
            // Unequal raw lengths fall back to the common prefix
            let n = d.len().min(y.len());
            stats::pearson(&d[..n], &y[..n])
        };

        if corr.abs() > best.correlation.abs() {
            best = LeadLag {
                lag,
                correlation: corr,
            };
        }
    }

    best
}
