//! HTTP surface: a single page at `/` that renders the profile form and,
//! after a POST, the prediction.

pub mod handlers;
pub mod routes;

use anyhow::Result;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::Config;
use crate::model::{FakeAccountDetector, TrainOutcome};

pub use routes::create_router;

static TEMPLATE: &str = include_str!("../../templates/index.html");

/// Shown instead of a prediction when no username can be extracted.
pub static INVALID_URL: &str = "Invalid URL. Unable to extract username.";

/// Shared application state
pub struct AppState {
    pub config: Config,
    model_ready: OnceCell<TrainOutcome>,
    init_runs: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            model_ready: OnceCell::new(),
            init_runs: AtomicUsize::new(0),
        }
    }

    /// Makes sure the artifact exists, training it on first use.
    ///
    /// Concurrent callers wait on the same initialization, so at most one
    /// training run happens per process. A failed run leaves the cell empty
    /// and the next request tries again.
    pub async fn ensure_model(&self) -> Result<TrainOutcome> {
        let outcome = self
            .model_ready
            .get_or_try_init(|| async {
                let run = self.init_runs.fetch_add(1, Ordering::SeqCst) + 1;
                info!(run, "initializing model artifact");
                let config = self.config.clone();
                tokio::task::spawn_blocking(move || {
                    FakeAccountDetector::ensure_trained(
                        &config.model_path,
                        &config.train_data,
                        &config.test_data,
                    )
                })
                .await?
            })
            .await?;
        Ok(*outcome)
    }

    /// Number of times the train-if-absent step has started in this process.
    pub fn init_runs(&self) -> usize {
        self.init_runs.load(Ordering::SeqCst)
    }

    /// Reads the artifact from disk. Called on every prediction.
    pub async fn load_model(&self) -> Result<FakeAccountDetector> {
        let path = self.config.model_path.clone();
        tokio::task::spawn_blocking(move || FakeAccountDetector::load_from_file(&path)).await?
    }
}

/// Renders the form page, with the result block when `result` is set.
pub fn render_page(result: Option<&'static str>) -> Html<String> {
    let block = result
        .map(|r| format!(r#"<div class="result">Prediction: {r}</div>"#))
        .unwrap_or_default();
    Html(TEMPLATE.replace("{{ result }}", &block))
}

/// Request failure mapped to an HTTP status.
#[derive(Debug)]
pub enum AppError {
    BadRequest(anyhow::Error),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(e) => (StatusCode::BAD_REQUEST, format!("{e:#}")).into_response(),
            AppError::Internal(e) => {
                error!("request failed: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_has_no_result_block() {
        let Html(page) = render_page(None);
        assert!(page.contains("<form method=\"post\">"));
        assert!(!page.contains("Prediction:"));
        assert!(!page.contains("{{ result }}"));
    }

    #[test]
    fn result_is_embedded() {
        let Html(page) = render_page(Some("Fake Account"));
        assert!(page.contains(r#"<div class="result">Prediction: Fake Account</div>"#));
    }
}
