use axum::extract::{Form, State};
use axum::response::Html;
use std::sync::Arc;
use tracing::{info, warn};

use super::{AppError, AppState, INVALID_URL, render_page};
use crate::features::{ProfileForm, build_features};

/// `GET /`: the empty form.
pub async fn index() -> Html<String> {
    render_page(None)
}

/// `POST /`: classify the submitted profile.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ProfileForm>,
) -> Result<Html<String>, AppError> {
    state.ensure_model().await.map_err(AppError::Internal)?;
    let model = state.load_model().await.map_err(AppError::Internal)?;

    let Some(features) = build_features(&form).map_err(AppError::BadRequest)? else {
        warn!(url = %form.url, "could not extract username");
        return Ok(render_page(Some(INVALID_URL)));
    };

    let (verdict, fake_share) = model
        .predict_with_proba(&features)
        .map_err(AppError::Internal)?;
    info!(url = %form.url, fake_share, label = verdict.label(), "profile classified");

    Ok(render_page(Some(verdict.label())))
}
