use std::time::Instant;

use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{error::AppError, state::AppState};

use super::encoder::EncodedImage;
use super::types::{
    AvatarQuery, CoverQuery, GenerationRequest, ImageFormat, content_type_for, split_file_name,
};

/// 输出只由路由参数决定，允许客户端与 CDN 永久缓存（365 天）
pub const CACHE_CONTROL_VALUE: &str = "public, immutable, max-age=31536000";

#[utoipa::path(
    get,
    path = "/avatar/{file}",
    summary = "生成头像",
    description = "按名称首字母生成渐变背景头像。配色由名称确定性派生，同名永远同色。`file` 形如 `{name}.{ext}`，ext 为 png|jpg|jpeg|webp，无法识别时输出 PNG；Content-Type 为 `image/{ext}`；缺少扩展名时返回 404。",
    params(
        ("file" = String, Path, description = "名称与扩展名，例如 `Jane Doe.png`"),
        AvatarQuery
    ),
    responses(
        (status = 200, description = "PNG/JPEG/WebP bytes of avatar image"),
        (status = 400, description = "Bad request", body = AppError),
        (status = 404, description = "Missing file extension", body = AppError),
        (status = 422, description = "Invalid dimensions", body = AppError),
        (status = 500, description = "Renderer error", body = AppError)
    ),
    tag = "Image"
)]
pub async fn generate_avatar(
    State(state): State<AppState>,
    file: Result<Path<String>, PathRejection>,
    query: Result<Query<AvatarQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Path(file) = file?;
    let Query(query) = query?;
    let (name, ext) = parse_file(&file)?;

    let req = GenerationRequest::avatar(name, ImageFormat::from_extension(ext), &query);
    render(&state, req, ext).await
}

#[utoipa::path(
    get,
    path = "/cover/{file}",
    summary = "生成封面",
    description = "生成带边框的书籍封面：标题顶部换行排版，作者底部居中。未提供作者时退化为标题首字母。默认尺寸 200×250。",
    params(
        ("file" = String, Path, description = "标题与扩展名，例如 `Dune.webp`"),
        CoverQuery
    ),
    responses(
        (status = 200, description = "PNG/JPEG/WebP bytes of cover image"),
        (status = 400, description = "Bad request", body = AppError),
        (status = 404, description = "Missing file extension", body = AppError),
        (status = 422, description = "Invalid dimensions", body = AppError),
        (status = 500, description = "Renderer error", body = AppError)
    ),
    tag = "Image"
)]
pub async fn generate_cover(
    State(state): State<AppState>,
    file: Result<Path<String>, PathRejection>,
    query: Result<Query<CoverQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Path(file) = file?;
    let Query(query) = query?;
    let (title, ext) = parse_file(&file)?;

    let req = GenerationRequest::cover(title, ImageFormat::from_extension(ext), &query);
    render(&state, req, ext).await
}

fn parse_file(file: &str) -> Result<(&str, &str), AppError> {
    split_file_name(file).ok_or_else(|| AppError::NotFound(format!("缺少扩展名: '{file}'")))
}

fn validate_dimensions(req: &GenerationRequest, max_dimension: u32) -> Result<(), AppError> {
    for (label, value) in [("width", req.width), ("height", req.height)] {
        if value == 0 {
            return Err(AppError::Validation(format!("{label} 必须大于 0")));
        }
        if value > max_dimension {
            return Err(AppError::Validation(format!(
                "{label} 不能超过 {max_dimension}（当前 {value}）"
            )));
        }
    }
    Ok(())
}

async fn render(state: &AppState, req: GenerationRequest, ext: &str) -> Result<Response, AppError> {
    validate_dimensions(&req, state.render.max_dimension)?;
    let content_type = content_type_for(ext, req.format);

    let t_total = Instant::now();
    let _permit = state
        .render_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
    let wait = t_total.elapsed();

    // 栅格化与编码为 CPU 密集操作，必须移出 tokio worker
    let images = state.images.clone();
    let span = tracing::Span::current();
    let image =
        tokio::task::spawn_blocking(move || span.in_scope(|| images.generate(&req))).await??;

    tracing::debug!(
        "图片请求完成: 排队={:?}, 总耗时={:?}, 格式={}",
        wait,
        t_total.elapsed(),
        image.content_type()
    );
    Ok(image_response(image, &content_type))
}

fn image_response(image: EncodedImage, content_type: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(image.content_type())),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_VALUE),
    );
    (StatusCode::OK, headers, image.bytes).into_response()
}

/// 创建图片路由
pub fn create_image_router() -> Router<AppState> {
    Router::new()
        .route("/avatar/:file", get(generate_avatar))
        .route("/cover/:file", get(generate_cover))
}
