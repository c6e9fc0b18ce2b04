//! Trainer seam and the in-process implicit-feedback factorizer.
//!
//! The evaluation harness only depends on the `RecommendationTrainer`
//! trait: training set + hyperparameters in, factor model out. The default
//! implementation is a confidence-weighted SGD matrix factorization over
//! implicit feedback (observed interactions are positives with confidence
//! `1 + alpha * signal`, sampled unobserved pairs are zero-target
//! negatives). Training is seeded per grid point so a rerun of the same
//! configuration reproduces the same model.

use async_trait::async_trait;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EvalError, Result};
use crate::models::{HyperparameterConfig, Interaction};

const LEARNING_RATE: f32 = 0.005;
/// Zero-target samples drawn per observed interaction per iteration.
const NEGATIVES_PER_POSITIVE: usize = 4;
/// Per-component gradient step clamp; keeps high-confidence updates finite.
const MAX_STEP: f32 = 1.0;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationTrainer: Send + Sync {
    async fn train(
        &self,
        interactions: &[Interaction],
        config: &HyperparameterConfig,
    ) -> Result<ImplicitFactorModel>;
}

/// Latent-factor model for implicit feedback. Opaque to the harness apart
/// from scoring and persistence.
#[derive(Debug, Clone)]
pub struct ImplicitFactorModel {
    pub rank: usize,
    user_factors: HashMap<i32, Array1<f32>>,
    item_factors: HashMap<i32, Array1<f32>>,
}

/// On-disk form of a factor model.
#[derive(Serialize, Deserialize)]
struct PersistedModel {
    rank: usize,
    user_factors: HashMap<i32, Vec<f32>>,
    item_factors: HashMap<i32, Vec<f32>>,
}

impl ImplicitFactorModel {
    /// Predicted preference score, `None` if either side is unknown.
    pub fn predict(&self, user_id: i32, item_id: i32) -> Option<f32> {
        let user = self.user_factors.get(&user_id)?;
        let item = self.item_factors.get(&item_id)?;
        Some(user.dot(item))
    }

    pub fn user_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.user_factors.keys().copied()
    }

    pub fn item_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.item_factors.keys().copied()
    }

    pub fn user_count(&self) -> usize {
        self.user_factors.len()
    }

    pub fn item_count(&self) -> usize {
        self.item_factors.len()
    }

    /// Persist the model as JSON at `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let persisted = PersistedModel {
            rank: self.rank,
            user_factors: self
                .user_factors
                .iter()
                .map(|(&id, factors)| (id, factors.to_vec()))
                .collect(),
            item_factors: self
                .item_factors
                .iter()
                .map(|(&id, factors)| (id, factors.to_vec()))
                .collect(),
        };
        let json = serde_json::to_string(&persisted)?;
        fs::write(path, json)?;
        debug!(path = %path.display(), "Persisted factor model");
        Ok(())
    }

    /// Reload a persisted model. Round-trips exactly: reloaded models rank
    /// items identically to the in-memory original.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let persisted: PersistedModel = serde_json::from_str(&json)?;
        Ok(Self {
            rank: persisted.rank,
            user_factors: persisted
                .user_factors
                .into_iter()
                .map(|(id, factors)| (id, Array1::from_vec(factors)))
                .collect(),
            item_factors: persisted
                .item_factors
                .into_iter()
                .map(|(id, factors)| (id, Array1::from_vec(factors)))
                .collect(),
        })
    }
}

/// Confidence-weighted SGD factorizer for implicit feedback.
pub struct ImplicitSgdTrainer {
    iterations: usize,
}

impl ImplicitSgdTrainer {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    fn seed_for(config: &HyperparameterConfig) -> u64 {
        // Deterministic per grid point so independent retries converge to
        // the same artifact.
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        config.artifact_name().hash(&mut hasher);
        hasher.finish()
    }

    fn init_factors(
        ids: impl Iterator<Item = i32>,
        rank: usize,
        rng: &mut StdRng,
    ) -> HashMap<i32, Array1<f32>> {
        let scale = 1.0 / (rank as f32).sqrt();
        ids.map(|id| {
            let factors: Vec<f32> = (0..rank).map(|_| (rng.gen::<f32>() - 0.5) * scale).collect();
            (id, Array1::from_vec(factors))
        })
        .collect()
    }
}

#[async_trait]
impl RecommendationTrainer for ImplicitSgdTrainer {
    async fn train(
        &self,
        interactions: &[Interaction],
        config: &HyperparameterConfig,
    ) -> Result<ImplicitFactorModel> {
        if interactions.is_empty() {
            return Err(EvalError::Trainer("empty training set".to_string()));
        }
        if config.rank == 0 {
            return Err(EvalError::Trainer("rank must be positive".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(Self::seed_for(config));

        // Sorted id lists keep initialization order (and thus the model)
        // independent of hash-map iteration order.
        let mut user_ids: Vec<i32> = interactions.iter().map(|i| i.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let mut item_ids: Vec<i32> = interactions.iter().map(|i| i.item_id).collect();
        item_ids.sort_unstable();
        item_ids.dedup();

        let mut seen: HashMap<i32, HashSet<i32>> = HashMap::new();
        for interaction in interactions {
            seen.entry(interaction.user_id)
                .or_default()
                .insert(interaction.item_id);
        }

        let mut user_factors = Self::init_factors(user_ids.iter().copied(), config.rank, &mut rng);
        let mut item_factors = Self::init_factors(item_ids.iter().copied(), config.rank, &mut rng);

        let lambda = config.regularization as f32;
        let alpha = config.confidence;

        for iteration in 0..self.iterations {
            for interaction in interactions {
                let confidence = (1.0 + alpha * interaction.signal) as f32;
                sgd_step(
                    &mut user_factors,
                    &mut item_factors,
                    interaction.user_id,
                    interaction.item_id,
                    1.0,
                    confidence,
                    lambda,
                )?;

                // Unobserved pairs as zero-target, unit-confidence samples.
                for _ in 0..NEGATIVES_PER_POSITIVE {
                    let candidate = item_ids[rng.gen_range(0..item_ids.len())];
                    if seen[&interaction.user_id].contains(&candidate) {
                        continue;
                    }
                    sgd_step(
                        &mut user_factors,
                        &mut item_factors,
                        interaction.user_id,
                        candidate,
                        0.0,
                        1.0,
                        lambda,
                    )?;
                }
            }
            debug!(iteration, rank = config.rank, "SGD iteration complete");
        }

        info!(
            rank = config.rank,
            users = user_factors.len(),
            items = item_factors.len(),
            iterations = self.iterations,
            "Trained implicit factor model"
        );

        Ok(ImplicitFactorModel {
            rank: config.rank,
            user_factors,
            item_factors,
        })
    }
}

/// One confidence-weighted gradient step on a (user, item, target) triple.
fn sgd_step(
    user_factors: &mut HashMap<i32, Array1<f32>>,
    item_factors: &mut HashMap<i32, Array1<f32>>,
    user_id: i32,
    item_id: i32,
    target: f32,
    confidence: f32,
    lambda: f32,
) -> Result<()> {
    let user = user_factors
        .get(&user_id)
        .ok_or_else(|| EvalError::Trainer(format!("unknown user {}", user_id)))?
        .clone();
    let item = item_factors
        .get(&item_id)
        .ok_or_else(|| EvalError::Trainer(format!("unknown item {}", item_id)))?
        .clone();

    let error = confidence * (target - user.dot(&item));
    if !error.is_finite() {
        return Err(EvalError::Trainer(format!(
            "numerical divergence on pair ({}, {})",
            user_id, item_id
        )));
    }

    let user_step = ((&item * error - &user * lambda) * LEARNING_RATE).mapv(clamp_step);
    let item_step = ((&user * error - &item * lambda) * LEARNING_RATE).mapv(clamp_step);

    user_factors.insert(user_id, &user + &user_step);
    item_factors.insert(item_id, &item + &item_step);

    Ok(())
}

fn clamp_step(step: f32) -> f32 {
    step.clamp(-MAX_STEP, MAX_STEP)
}
