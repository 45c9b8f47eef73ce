//! TTS HTTP Handlers
//!
//! 成功时直接返回音频二进制；任何失败都返回 JSON 错误，不返回部分音频

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::{SynthesizeSpeech, SynthesizeSpeechResponse};
use crate::infrastructure::http::dto::SynthesizeRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// JSON 脚本合成
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    let command = SynthesizeSpeech {
        script: req.script,
        conversation_style: req.conversation_style,
    };

    let result = state.synthesize_handler.handle(command).await?;
    Ok(audio_response(result))
}

/// 上传脚本文件合成
///
/// 字段：`file`（UTF-8 文本）、`conversation_style`（可选，兼容 `speaker_type`）
pub async fn synthesize_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut script: Option<String> = None;
    let mut conversation_style: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    ApiError::BadRequest("Script file must be UTF-8 text".to_string())
                })?;
                script = Some(text.trim_start_matches('\u{feff}').to_string());
            }
            "conversation_style" | "speaker_type" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read conversation style: {}", e))
                })?;
                conversation_style = Some(value).filter(|v| !v.trim().is_empty());
            }
            _ => {}
        }
    }

    let script =
        script.ok_or_else(|| ApiError::BadRequest("Script file is required".to_string()))?;

    let command = SynthesizeSpeech {
        script,
        conversation_style,
    };

    let result = state.synthesize_handler.handle(command).await?;
    Ok(audio_response(result))
}

fn audio_response(result: SynthesizeSpeechResponse) -> Response {
    tracing::debug!(
        turns = result.turn_count,
        audio_size = result.audio_data.len(),
        format = %result.format,
        "Returning combined audio"
    );

    (
        [
            (header::CONTENT_TYPE, result.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"speech.{}\"",
                    result.format.extension()
                ),
            ),
        ],
        result.audio_data,
    )
        .into_response()
}
