use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::ping::handler::ping,
        crate::features::image::handler::generate_avatar,
        crate::features::image::handler::generate_cover,
    ),
    components(schemas(
        crate::error::AppError,
        crate::error::ProblemDetails,
        crate::features::image::types::ImageFormat,
    )),
    tags(
        (
            name = "Image",
            description = "图片生成：按名称/标题确定性生成头像与封面（png/jpeg/webp）。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Image Service API",
        version = env!("CARGO_PKG_VERSION"),
        description = "占位头像与书籍封面生成服务（Axum + utoipa）。输出只由路由参数决定，响应带长期缓存头。"
    )
)]
pub struct ApiDoc;
