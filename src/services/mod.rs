pub mod evaluator;
pub mod grid;
pub mod parser;
pub mod quality_filter;
pub mod recommender;
pub mod sink;
pub mod splitter;
pub mod trainer;

pub use sink::ResultSink;
pub use trainer::{ImplicitFactorModel, ImplicitSgdTrainer, RecommendationTrainer};
