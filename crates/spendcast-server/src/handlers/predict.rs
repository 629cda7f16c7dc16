//! Forecast handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::{AppError, AppState};
use spendcast_core::models::ForecastResponse;

/// GET /predict/:user_id - 30-day spending forecast for one user
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ForecastResponse>, AppError> {
    let forecaster = state.forecaster.clone();
    let requested = user_id.clone();

    // Model fitting is CPU-bound; keep it off the async workers
    let response = tokio::task::spawn_blocking(move || forecaster.predict(&requested)).await??;

    info!(
        user = %user_id,
        total = response.total_predicted_spend,
        "Forecast served"
    );

    Ok(Json(response))
}
