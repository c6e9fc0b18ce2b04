use rec_eval::{Config, GridSearchJob};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = Config::from_env()?;

    info!(
        input = %config.input.interactions_path,
        results = %config.output.results_path,
        ranks = ?config.grid.ranks,
        regularizations = ?config.grid.regularizations,
        confidences = ?config.grid.confidences,
        "Starting rec-eval sweep"
    );

    let job = GridSearchJob::new(config);
    let stats = job.run().await?;

    println!(
        "Sweep finished: {}/{} grid points succeeded ({} failed) in {} ms",
        stats.configs_succeeded,
        stats.configs_planned,
        stats.configs_failed,
        stats.total_duration_ms
    );

    if stats.configs_failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
