//! Splitter
//!
//! Deterministic train/test partitioning of the cleaned interaction set.
//! Each interaction is independently assigned to training with probability
//! `training_ratio`, driven by a seeded RNG, so a fixed seed and a fixed
//! input produce exactly the same partition across runs and restarts. Both
//! halves are produced once per sweep and must not be reshuffled between
//! grid points.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::SplitConfig;
use crate::models::{Interaction, Split, TestTruth};

/// Partition `interactions` into training and test sets.
pub fn split(interactions: &[Interaction], config: &SplitConfig) -> Split {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut training = Vec::with_capacity(interactions.len());
    let mut test = Vec::new();

    for interaction in interactions {
        if rng.gen::<f64>() < config.training_ratio {
            training.push(*interaction);
        } else {
            test.push(*interaction);
        }
    }

    info!(
        training = training.len(),
        test = test.len(),
        seed = config.seed,
        ratio = config.training_ratio,
        "Split cleaned interactions"
    );

    Split { training, test }
}

/// Group held-out item ids per user. Derived once and reused for every
/// grid point so metrics stay comparable.
pub fn derive_truth(test: &[Interaction]) -> TestTruth {
    let mut truth = TestTruth::new();
    for interaction in test {
        truth
            .entry(interaction.user_id)
            .or_default()
            .insert(interaction.item_id);
    }
    truth
}
