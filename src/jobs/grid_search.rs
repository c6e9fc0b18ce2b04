//! Grid Search Job
//!
//! The sweep control loop: load -> filter -> split once, then for every
//! grid point train, recommend, evaluate, and persist. Each grid point is
//! fully isolated: its model and recommendation table are namespaced by the
//! config's artifact name, and any per-point failure (trainer divergence,
//! persistence trouble) is logged and counted without stopping the
//! remaining points. Designed to run as a one-shot batch process.

use chrono::Utc;
use std::time::Instant;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::models::{
    EvaluationResult, HyperparameterConfig, Interaction, RecommendationList, SweepStats, TestTruth,
};
use crate::services::trainer::{ImplicitFactorModel, ImplicitSgdTrainer, RecommendationTrainer};
use crate::services::{evaluator, grid, parser, quality_filter, recommender, splitter, ResultSink};

/// Everything one grid point produces, before any of it touches disk.
pub struct ConfigArtifacts {
    pub model: ImplicitFactorModel,
    pub recommendations: Vec<RecommendationList>,
    pub result: EvaluationResult,
}

pub struct GridSearchJob {
    config: Config,
    trainer: Box<dyn RecommendationTrainer>,
}

impl GridSearchJob {
    pub fn new(config: Config) -> Self {
        let trainer = Box::new(ImplicitSgdTrainer::new(config.grid.iterations));
        Self { config, trainer }
    }

    /// Swap in a different trainer behind the same seam.
    pub fn with_trainer(config: Config, trainer: Box<dyn RecommendationTrainer>) -> Self {
        Self { config, trainer }
    }

    /// Run one full sweep over the hyperparameter grid.
    pub async fn run(&self) -> Result<SweepStats> {
        let start_time = Instant::now();
        let mut stats = SweepStats {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        self.config.split.validate()?;

        let raw = parser::load_interactions(&self.config.input.interactions_path)?;
        let cleaned = quality_filter::clean(&raw, &self.config.filter);
        let split = splitter::split(&cleaned, &self.config.split);
        let truth = splitter::derive_truth(&split.test);

        let points = grid::enumerate(&self.config.grid);
        stats.configs_planned = points.len() as u32;

        info!(
            grid_points = points.len(),
            training = split.training.len(),
            test = split.test.len(),
            "Starting grid search sweep"
        );

        let sink = ResultSink::open(&self.config.output.results_path)?;

        for point in &points {
            match self.run_config(&split.training, &truth, point, &sink).await {
                Ok(result) => {
                    stats.configs_succeeded += 1;
                    info!(
                        config = %point.artifact_name(),
                        precision_at_k = result.precision_at_k,
                        aligned_users = result.aligned_users,
                        "Grid point evaluated"
                    );
                }
                Err(e) => {
                    stats.configs_failed += 1;
                    error!(
                        config = %point.artifact_name(),
                        error = %e,
                        "Grid point failed; continuing sweep"
                    );
                }
            }
        }

        stats.completed_at = Some(Utc::now());
        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            planned = stats.configs_planned,
            succeeded = stats.configs_succeeded,
            failed = stats.configs_failed,
            duration_ms = stats.total_duration_ms,
            "Grid search sweep completed"
        );

        Ok(stats)
    }

    /// Evaluate one grid point and persist its artifacts.
    async fn run_config(
        &self,
        training: &[Interaction],
        truth: &TestTruth,
        point: &HyperparameterConfig,
        sink: &ResultSink,
    ) -> Result<EvaluationResult> {
        let artifacts = self.evaluate_config(training, truth, point).await?;
        self.persist_artifacts(&artifacts, sink)?;
        Ok(artifacts.result)
    }

    /// The pure core of one grid point: train, rank, score. No I/O.
    pub async fn evaluate_config(
        &self,
        training: &[Interaction],
        truth: &TestTruth,
        point: &HyperparameterConfig,
    ) -> Result<ConfigArtifacts> {
        let k = self.config.grid.recommendations_per_user;

        let model = self.trainer.train(training, point).await?;
        let recommendations = recommender::top_k(&model, k);
        let result = evaluator::evaluate(point, &recommendations, truth, k);

        Ok(ConfigArtifacts {
            model,
            recommendations,
            result,
        })
    }

    /// Persist one grid point's model, recommendation table, and result row.
    fn persist_artifacts(&self, artifacts: &ConfigArtifacts, sink: &ResultSink) -> Result<()> {
        let name = artifacts.result.config.artifact_name();

        let model_path = std::path::Path::new(&self.config.output.models_dir)
            .join(format!("{}.json", name));
        artifacts.model.save(&model_path)?;

        recommender::persist_table(
            &artifacts.recommendations,
            &self.config.output.recommendations_dir,
            &name,
        )?;

        sink.append(&artifacts.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterConfig, GridConfig, InputConfig, OutputConfig, SplitConfig};
    use crate::error::EvalError;
    use crate::services::trainer::MockRecommendationTrainer;
    use std::io::Write;
    use std::path::Path;

    fn write_dataset(path: &Path) {
        // 12 users x items drawn so everyone clears the quality filter.
        let mut file = std::fs::File::create(path).unwrap();
        for user_id in 1..=12 {
            for offset in 0..4 {
                let item_id = 100 + (user_id + offset) % 8;
                writeln!(file, "{};{};1.0", user_id, item_id).unwrap();
            }
        }
    }

    fn test_job_config(dir: &Path, ranks: Vec<usize>) -> Config {
        Config {
            input: InputConfig {
                interactions_path: dir.join("interactions.txt").display().to_string(),
            },
            filter: FilterConfig {
                genuine_user_max_product: 100,
                recommendable_product_max_user: 3000,
            },
            split: SplitConfig {
                training_ratio: 0.7,
                seed: 42,
            },
            grid: GridConfig {
                ranks,
                regularizations: vec![0.01],
                confidences: vec![1.0],
                iterations: 2,
                recommendations_per_user: 3,
            },
            output: OutputConfig {
                models_dir: dir.join("models").display().to_string(),
                recommendations_dir: dir.join("recs").display().to_string(),
                results_path: dir.join("results.txt").display().to_string(),
            },
        }
    }

    fn diverging_trainer() -> MockRecommendationTrainer {
        let mut trainer = MockRecommendationTrainer::new();
        trainer
            .expect_train()
            .returning(|_, _| Err(EvalError::Trainer("synthetic divergence".to_string())));
        trainer
    }

    #[tokio::test]
    async fn test_sweep_writes_one_row_per_grid_point() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(&dir.path().join("interactions.txt"));
        let config = test_job_config(dir.path(), vec![4, 8]);

        let job = GridSearchJob::new(config.clone());
        let stats = job.run().await.unwrap();

        assert_eq!(stats.configs_planned, 2);
        assert_eq!(stats.configs_succeeded, 2);
        assert_eq!(stats.configs_failed, 0);

        let results = std::fs::read_to_string(&config.output.results_path).unwrap();
        let lines: Vec<&str> = results.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("4,"));
        assert!(lines[1].starts_with("8,"));
    }

    #[tokio::test]
    async fn test_sweep_persists_namespaced_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(&dir.path().join("interactions.txt"));
        let config = test_job_config(dir.path(), vec![4]);

        GridSearchJob::new(config.clone()).run().await.unwrap();

        let name = HyperparameterConfig {
            rank: 4,
            regularization: 0.01,
            confidence: 1.0,
        }
        .artifact_name();
        assert!(Path::new(&config.output.models_dir)
            .join(format!("{}.json", name))
            .exists());
        assert!(Path::new(&config.output.recommendations_dir)
            .join(format!("recs_{}.csv", name))
            .exists());
    }

    #[tokio::test]
    async fn test_trainer_failure_does_not_abort_sweep() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(&dir.path().join("interactions.txt"));
        let config = test_job_config(dir.path(), vec![4, 8, 16]);

        let job = GridSearchJob::with_trainer(config.clone(), Box::new(diverging_trainer()));
        let stats = job.run().await.unwrap();

        assert_eq!(stats.configs_planned, 3);
        assert_eq!(stats.configs_succeeded, 0);
        assert_eq!(stats.configs_failed, 3);

        // The log exists but holds no rows for failed points.
        let results = std::fs::read_to_string(&config.output.results_path).unwrap();
        assert!(results.is_empty());
    }
}
