use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One observed implicit-feedback event (e.g. a purchase).
///
/// Immutable once parsed; `signal` is strictly positive and both ids fit
/// comfortably below `i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: i32,
    pub item_id: i32,
    pub signal: f64,
}

/// One grid point. Uniquely identifies a trained model and a result row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterConfig {
    /// Latent-factor count of the factorization.
    pub rank: usize,
    /// Overfitting penalty (lambda).
    pub regularization: f64,
    /// Implicit-feedback confidence scaling (alpha).
    pub confidence: f64,
}

impl HyperparameterConfig {
    /// Canonical artifact name for this grid point.
    ///
    /// Decimal points are replaced with underscores so the name is safe as
    /// a file/table name and two distinct configs never collide
    /// (`0.1` -> `0_1`, `0.01` -> `0_01`).
    pub fn artifact_name(&self) -> String {
        format!(
            "rank{}_alpha{}_lambda{}",
            self.rank,
            encode_float(self.confidence),
            encode_float(self.regularization),
        )
    }
}

fn encode_float(value: f64) -> String {
    format!("{}", value).replace('.', "_")
}

/// Ordered top-K item list for one user. Position matters.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationList {
    pub user_id: i32,
    pub items: Vec<i32>,
}

/// Held-out ground truth: the set of test items per user.
pub type TestTruth = HashMap<i32, HashSet<i32>>;

/// The immutable train/test partition, produced once per run and reused
/// identically across every grid point.
#[derive(Debug, Clone)]
pub struct Split {
    pub training: Vec<Interaction>,
    pub test: Vec<Interaction>,
}

/// One scored grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub config: HyperparameterConfig,
    pub precision_at_k: f64,
    /// Users contributing to the mean (inner join of predictions and truth).
    pub aligned_users: usize,
}

/// Per-pass sweep statistics.
#[derive(Debug, Clone, Default)]
pub struct SweepStats {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub configs_planned: u32,
    pub configs_succeeded: u32,
    pub configs_failed: u32,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name_format() {
        let config = HyperparameterConfig {
            rank: 75,
            regularization: 10.0,
            confidence: 40.0,
        };
        assert_eq!(config.artifact_name(), "rank75_alpha40_lambda10");
    }

    #[test]
    fn test_artifact_name_distinguishes_close_floats() {
        let a = HyperparameterConfig {
            rank: 100,
            regularization: 0.1,
            confidence: 1.0,
        };
        let b = HyperparameterConfig {
            rank: 100,
            regularization: 0.01,
            confidence: 1.0,
        };
        assert_eq!(a.artifact_name(), "rank100_alpha1_lambda0_1");
        assert_eq!(b.artifact_name(), "rank100_alpha1_lambda0_01");
        assert_ne!(a.artifact_name(), b.artifact_name());
    }
}
