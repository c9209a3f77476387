use crate::error::RecommenderError;
use crate::models::*;
use crate::utils::stats::DatasetSummary;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

/// A failed request, rendered as an `ApiResponse` with no data.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<RecommenderError> for ApiError {
    fn from(err: RecommenderError) -> Self {
        let status = match &err {
            RecommenderError::Configuration(_) => StatusCode::BAD_REQUEST,
            RecommenderError::UnknownEntity { .. } => StatusCode::NOT_FOUND,
            RecommenderError::NotFitted => StatusCode::CONFLICT,
            RecommenderError::NumericDegeneracy(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self.message);
        } else {
            warn!("Request rejected: {}", self.message);
        }
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "recforge".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());
    status.insert(
        "sessions".to_string(),
        state.service.session_count().to_string(),
    );

    Json(ApiResponse::success(status))
}

async fn create_session(
    State(state): State<AppState>,
    Json(dataset): Json<Dataset>,
) -> ApiResult<SessionInfo> {
    Ok(Json(ApiResponse::success(state.service.create_session(dataset))))
}

async fn compile_model(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(spec): Json<CompileSpec>,
) -> ApiResult<CompileSummary> {
    let service = state.service.clone();
    let summary = tokio::task::spawn_blocking(move || service.compile(session_id, spec))
        .await
        .map_err(|e| ApiError::internal(format!("compile task failed: {}", e)))??;

    Ok(Json(ApiResponse::success(summary)))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<RecommendationRequest>,
) -> ApiResult<RecommendationResponse> {
    let response = state.service.recommend(session_id, &request)?;
    Ok(Json(ApiResponse::success(response)))
}

async fn get_summary(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<DatasetSummary> {
    let service = state.service.clone();
    let summary = tokio::task::spawn_blocking(move || service.summary(session_id))
        .await
        .map_err(|e| ApiError::internal(format!("summary task failed: {}", e)))??;

    Ok(Json(ApiResponse::success(summary)))
}

async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<String> {
    state.service.close_session(session_id)?;
    Ok(Json(ApiResponse::success("Session closed".to_string())))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", delete(close_session))
        .route("/sessions/:session_id/compile", post(compile_model))
        .route("/sessions/:session_id/recommendations", post(get_recommendations))
        .route("/sessions/:session_id/summary", get(get_summary))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
