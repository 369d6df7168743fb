//! Fake account detector web server.
//!
//! Environment:
//!   FAKEACC_ADDR        - listen address (default: 127.0.0.1:5000)
//!   FAKEACC_MODEL_PATH  - model artifact (default: fake_account_detector.msgpack)
//!   FAKEACC_TRAIN_DATA  - training set (default: trainData.json)
//!   FAKEACC_TEST_DATA   - test set (default: testData.json)
//!   RUST_LOG            - log filter (default: info)

use fakeacc::Config;
use fakeacc::web::{AppState, create_router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let addr = config.addr;
    info!(
        model = ?config.model_path,
        train = ?config.train_data,
        test = ?config.test_data,
        "configuration loaded"
    );

    let app = create_router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(addr).await?;
    info!("🚀 Fake account detector listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("👋 Shutdown complete");
    Ok(())
}
