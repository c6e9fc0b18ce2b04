//! Grid Enumerator
//!
//! Cartesian product of the hyperparameter dimensions in nested-loop order:
//! ranks outer, regularizations middle, confidences inner. The order only
//! determines result-log ordering; nothing downstream depends on it.

use crate::config::GridConfig;
use crate::models::HyperparameterConfig;

/// Every grid point, exactly once, in nested-loop order. Value-identical
/// triples are not deduplicated.
pub fn enumerate(config: &GridConfig) -> Vec<HyperparameterConfig> {
    let mut points =
        Vec::with_capacity(config.ranks.len() * config.regularizations.len() * config.confidences.len());

    for &rank in &config.ranks {
        for &regularization in &config.regularizations {
            for &confidence in &config.confidences {
                points.push(HyperparameterConfig {
                    rank,
                    regularization,
                    confidence,
                });
            }
        }
    }

    points
}
