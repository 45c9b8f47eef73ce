//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                    GET   存活检查
//! - /api/health                  GET   语音服务连通性
//! - /api/tts/synthesize          POST  JSON 脚本 → 音频
//! - /api/tts/synthesize/upload   POST  上传脚本文件 → 音频

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .nest("/tts", tts_routes())
}

/// TTS 路由
fn tts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/synthesize", post(handlers::synthesize))
        .route("/synthesize/upload", post(handlers::synthesize_upload))
}
