//! Trains the model artifact ahead of time, if it is not already on disk.
//! Uses the same `FAKEACC_*` variables as the server.

use fakeacc::{Config, FakeAccountDetector, TrainOutcome};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    match FakeAccountDetector::ensure_trained(
        &config.model_path,
        &config.train_data,
        &config.test_data,
    )? {
        TrainOutcome::Skipped => {
            println!("📦 Model already exists at {:?}, nothing to do", config.model_path)
        }
        TrainOutcome::Trained { accuracy } => {
            println!("✅ Test accuracy: {:.2}%", accuracy * 100.0)
        }
    }
    Ok(())
}
