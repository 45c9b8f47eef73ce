//! Health Handler
//!
//! 检查语音服务连通性；ping 只表示进程存活

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{ApiResponse, HealthResponse};
use crate::infrastructure::http::state::AppState;

/// 健康检查
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let speech_engine = state.speech_engine.health_check().await;

    if !speech_engine {
        tracing::warn!("Speech engine health check failed");
    }

    Json(ApiResponse::success(HealthResponse {
        speech_engine,
        combiner: state.combiner.name(),
    }))
}
