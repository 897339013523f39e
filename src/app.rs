use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::features::image::create_image_router;
use crate::features::ping::create_ping_router;
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::response_time::response_time_middleware;
use crate::state::AppState;

/// 压缩策略：图片本身已压缩，只压缩 JSON/HTML/文本等响应。
///
/// 保留默认的最小大小阈值（32B）。
pub fn compression_predicate() -> impl Predicate {
    SizeAbove::default()
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整路由：业务接口 + 文档 + 静态演示页 + 全局中间件
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::<AppState>::new()
        .merge(create_ping_router())
        .merge(create_image_router());

    if config.docs.enabled {
        router = router.merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    if config.static_files.enabled {
        let dir = config.static_files_path();
        if dir.is_dir() {
            tracing::info!("静态文件目录: {}", dir.display());
            router = router.fallback_service(ServeDir::new(dir));
        } else {
            tracing::debug!("静态文件目录不存在，跳过: {}", dir.display());
        }
    }

    // 后添加的层在外层：计时 → 压缩 → request-id → 路由
    router
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new().compress_when(compression_predicate()))
        .layer(axum::middleware::from_fn(response_time_middleware))
}
