//! HTTP Middleware
//!
//! 框架层拒绝的请求日志（请求体过大、JSON 无法解析、路由不存在等）

use axum::{extract::Request, middleware::Next, response::Response};

use super::error::LoggedApiError;

/// 是否为未经 ApiError 记录的失败响应
fn is_unlogged_rejection(response: &Response) -> bool {
    let status = response.status();
    (status.is_client_error() || status.is_server_error())
        && response.extensions().get::<LoggedApiError>().is_none()
}

/// 框架拒绝日志中间件
///
/// ApiError 产生的响应带有 `LoggedApiError` 扩展，在此跳过；
/// 其余 4xx/5xx 来自 axum 提取器或路由，handler 从未执行，只在这里留下记录
pub async fn rejection_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let content_length = request
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let response = next.run(request).await;

    if is_unlogged_rejection(&response) {
        let status = response.status();
        if status.is_server_error() {
            tracing::error!(
                method = %method,
                uri = %uri,
                status = status.as_u16(),
                "Request rejected by server"
            );
        } else {
            tracing::warn!(
                method = %method,
                uri = %uri,
                status = status.as_u16(),
                content_length,
                "Request rejected before reaching handler"
            );
        }
    }

    response
}
