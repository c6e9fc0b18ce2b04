//! rec-eval — grid-search evaluation harness for implicit-feedback
//! collaborative filtering.
//!
//! Pipeline: parse raw interaction records, drop degenerate users/items,
//! split deterministically into train/test, then for every point of a
//! hyperparameter grid train a factor model, generate top-K
//! recommendations, score them with precision@K against the held-out set,
//! and append one result row per grid point.

pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{EvalError, Result};
pub use jobs::GridSearchJob;
