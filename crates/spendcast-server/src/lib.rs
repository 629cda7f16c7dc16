//! Spendcast Web Server
//!
//! Axum-based REST API serving 30-day spending forecasts.
//!
//! - `GET /predict/:user_id` returns the forecast for one user
//! - Permissive CORS unless origins are configured
//! - Request tracing through `tower-http`

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use spendcast_core::db::Database;
use spendcast_core::predict::{Forecaster, PredictError};
use spendcast_core::repository::ExpenseRepository;

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub forecaster: Forecaster,
}

/// Create the application router
pub fn create_router(repository: Arc<dyn ExpenseRepository>, config: ServerConfig) -> Router {
    create_router_with_forecaster(Forecaster::with_default_engine(repository), config)
}

/// Create the application router around an existing forecaster
pub fn create_router_with_forecaster(forecaster: Forecaster, config: ServerConfig) -> Router {
    let state = Arc::new(AppState { forecaster });

    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .route("/predict/:user_id", get(handlers::predict))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.allowed_origins.is_empty() {
        info!("CORS: allowing any origin");
    } else {
        info!(origins = ?config.allowed_origins, "CORS: restricted origins");
    }

    let app = create_router(Arc::new(db), config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = ?err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        if err.is_client_error() {
            return Self::bad_request(&err.to_string());
        }
        // Server-side failures still surface their message to the client
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            internal: Some(err.into()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            internal: Some(err.into()),
        }
    }
}
