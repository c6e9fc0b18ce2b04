use serde::Deserialize;
use std::env;

use crate::error::{EvalError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub input: InputConfig,
    pub filter: FilterConfig,
    pub split: SplitConfig,
    pub grid: GridConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Path to the `;`-delimited interaction file.
    pub interactions_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Users with at least this many distinct items are dropped (exclusive bound).
    pub genuine_user_max_product: usize,
    /// Items with at least this many distinct users are dropped (exclusive bound).
    pub recommendable_product_max_user: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitConfig {
    /// Fraction of cleaned interactions assigned to training; the rest go to test.
    pub training_ratio: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    pub ranks: Vec<usize>,
    pub regularizations: Vec<f64>,
    pub confidences: Vec<f64>,
    pub iterations: usize,
    /// Recommendations generated per user (K).
    pub recommendations_per_user: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub models_dir: String,
    pub recommendations_dir: String,
    pub results_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            input: InputConfig {
                interactions_path: env::var("INTERACTIONS_PATH")
                    .unwrap_or_else(|_| "data/interactions.txt".to_string()),
            },
            filter: FilterConfig {
                genuine_user_max_product: parse_env("GENUINE_USER_MAX_PRODUCT", "100")?,
                recommendable_product_max_user: parse_env(
                    "RECOMMENDABLE_PRODUCT_MAX_USER",
                    "3000",
                )?,
            },
            split: SplitConfig {
                training_ratio: parse_env("SPLIT_TRAINING_RATIO", "0.7")?,
                seed: parse_env("SPLIT_SEED", "42")?,
            },
            grid: GridConfig {
                ranks: parse_env_list("GRID_RANKS", "75,100,150")?,
                regularizations: parse_env_list("GRID_LAMBDAS", "10.0,1.0,0.01")?,
                confidences: parse_env_list("GRID_ALPHAS", "40.0,10.0,1.0,0.1,0.01")?,
                iterations: parse_env("TRAIN_ITERATIONS", "10")?,
                recommendations_per_user: parse_env("RECOMMENDATIONS_PER_USER", "5")?,
            },
            output: OutputConfig {
                models_dir: env::var("MODELS_DIR").unwrap_or_else(|_| "out/models".to_string()),
                recommendations_dir: env::var("RECOMMENDATIONS_DIR")
                    .unwrap_or_else(|_| "out/recommendations".to_string()),
                results_path: env::var("RESULTS_PATH")
                    .unwrap_or_else(|_| "out/results.txt".to_string()),
            },
        })
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.training_ratio > 0.0 && self.training_ratio < 1.0) {
            return Err(EvalError::Config(format!(
                "SPLIT_TRAINING_RATIO must be in (0, 1), got {}",
                self.training_ratio
            )));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| {
        EvalError::Config(format!("{} must be a valid {}", key, std::any::type_name::<T>()))
    })
}

fn parse_env_list<T: std::str::FromStr>(key: &str, default: &str) -> Result<Vec<T>> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(|field| {
            field.trim().parse().map_err(|_| {
                EvalError::Config(format!("{} contains an invalid entry: '{}'", key, field))
            })
        })
        .collect()
}
