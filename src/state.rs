use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::RenderConfig;
use crate::features::image::ImageService;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 渲染参数（尺寸上限等）
    pub render: Arc<RenderConfig>,
    /// 图片生成流水线（持有只读字体库）
    pub images: Arc<ImageService>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(render: RenderConfig, images: ImageService) -> Self {
        let permits = render.effective_parallelism();
        tracing::info!("渲染并发上限: {}", permits);
        Self {
            render: Arc::new(render),
            images: Arc::new(images),
            render_semaphore: Arc::new(Semaphore::new(permits)),
        }
    }
}
