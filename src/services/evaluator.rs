//! Ranking Evaluator
//!
//! Aligns predicted top-K lists with the held-out truth per user (an inner
//! join on user id) and computes mean precision@K over the aligned users.
//! Users present on only one side contribute nothing. An empty alignment
//! yields 0.0 with `aligned_users == 0`; callers can tell the degenerate
//! case apart from a genuinely zero score.

use tracing::warn;

use crate::models::{EvaluationResult, HyperparameterConfig, RecommendationList, TestTruth};

/// Precision@K for one user: |top-K hits| / K.
///
/// K is the configured list length, not the (possibly shorter) predicted
/// list length, so an empty prediction scores 0.0.
pub fn precision_at_k(predicted: &[i32], truth: &std::collections::HashSet<i32>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let hits = predicted.iter().take(k).filter(|item| truth.contains(item)).count();
    hits as f64 / k as f64
}

/// Mean precision@K over the users present in both predictions and truth.
pub fn evaluate(
    config: &HyperparameterConfig,
    predictions: &[RecommendationList],
    truth: &TestTruth,
    k: usize,
) -> EvaluationResult {
    let mut sum = 0.0;
    let mut aligned_users = 0usize;

    for list in predictions {
        if let Some(held_out) = truth.get(&list.user_id) {
            sum += precision_at_k(&list.items, held_out, k);
            aligned_users += 1;
        }
    }

    let precision = if aligned_users > 0 {
        sum / aligned_users as f64
    } else {
        warn!(
            config = %config.artifact_name(),
            "No users align between predictions and test truth; reporting 0.0"
        );
        0.0
    };

    EvaluationResult {
        config: *config,
        precision_at_k: precision,
        aligned_users,
    }
}
