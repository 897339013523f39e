use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::image::FontBook;

/// 执行启动检查并加载字体库
///
/// 1. 校验渲染配置
/// 2. 检查字体目录（缺失仅告警）
/// 3. 加载字体库（扫描系统字体较慢，放到阻塞线程池）
pub async fn run_startup_checks(config: &AppConfig) -> Result<FontBook, AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    validate_render_config(config)?;
    check_fonts_dir(config);

    let t_fonts = std::time::Instant::now();
    let render = config.render.clone();
    let fonts = tokio::task::spawn_blocking(move || FontBook::load(&render)).await?;
    if fonts.face_count() == 0 {
        tracing::warn!("⚠️ 未加载到任何字体，生成的图片将不含文字");
    }
    tracing::info!("字体库加载耗时: {}ms", t_fonts.elapsed().as_millis());

    tracing::info!("✅ 启动检查完成");
    Ok(fonts)
}

fn validate_render_config(config: &AppConfig) -> Result<(), AppError> {
    if config.render.max_dimension == 0 {
        return Err(AppError::Internal(
            "render.max_dimension 必须大于 0".to_string(),
        ));
    }
    if config.render.font_family.trim().is_empty() {
        return Err(AppError::Internal("render.font_family 不能为空".to_string()));
    }
    Ok(())
}

fn check_fonts_dir(config: &AppConfig) {
    let fonts_path = config.fonts_path();
    if fonts_path.is_dir() {
        tracing::info!("✅ 字体目录: {:?}", fonts_path);
    } else {
        tracing::warn!("⚠️ 未找到字体目录 {:?}，仅使用系统字体", fonts_path);
        if !config.render.load_system_fonts {
            tracing::warn!("⚠️ render.load_system_fonts = false，字体库可能为空");
        }
    }
}
