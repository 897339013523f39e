use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// 响应耗时头名
pub const RESPONSE_TIME_HEADER: &str = "x-response-time";

/// 计时中间件：为每个响应写入 `X-Response-Time: {ms} ms`。
pub async fn response_time_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut res = next.run(req).await;
    let elapsed_ms = started.elapsed().as_millis();

    tracing::debug!(
        target: "image_service::http",
        %method,
        path = %path,
        status = res.status().as_u16(),
        elapsed_ms,
        "请求完成"
    );

    if let Ok(value) = HeaderValue::from_str(&format_elapsed(elapsed_ms)) {
        res.headers_mut().insert(RESPONSE_TIME_HEADER, value);
    }
    res
}

fn format_elapsed(ms: u128) -> String {
    format!("{ms} ms")
}
