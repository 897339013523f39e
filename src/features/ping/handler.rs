use axum::{
    Router,
    http::{HeaderValue, header},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Local, TimeZone};

use crate::state::AppState;

fn pong<Tz: TimeZone>(now: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("pong {}", now.to_rfc3339())
}

#[utoipa::path(
    get,
    path = "/ping",
    summary = "存活探针",
    description = "返回 `pong` 与服务器本地时间（RFC3339），仅用于探活。",
    responses((status = 200, description = "服务存活", body = String, content_type = "text/plain")),
    tag = "Health"
)]
pub async fn ping() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )],
        pong(Local::now()),
    )
}

pub fn create_ping_router() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}
