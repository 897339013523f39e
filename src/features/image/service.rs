use std::time::Instant;

use crate::error::AppError;

use super::composer::Scene;
use super::encoder::EncodedImage;
use super::fonts::{FontBook, FontMeasurer};
use super::types::{GenerationRequest, ImageKind};

/// 图片生成流水线：场景构建 → 栅格化 → 编码。
///
/// 全部为 CPU 密集的同步操作，调用方负责移出异步 worker。
#[derive(Debug, Clone)]
pub struct ImageService {
    fonts: FontBook,
}

impl ImageService {
    pub fn new(fonts: FontBook) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// 构建场景（不栅格化）
    pub fn scene(&self, req: &GenerationRequest) -> Scene {
        let measurer = FontMeasurer::new(&self.fonts);
        match &req.kind {
            ImageKind::Avatar { name } => Scene::avatar(name, req.width, req.height, &measurer),
            ImageKind::Cover { title, author } => Scene::cover(
                title,
                author.as_deref(),
                req.width,
                req.height,
                &measurer,
            ),
        }
    }

    pub fn generate(&self, req: &GenerationRequest) -> Result<EncodedImage, AppError> {
        let t0 = Instant::now();
        let scene = self.scene(req);
        let t_layout = t0.elapsed();

        let canvas = scene.render(&self.fonts)?;
        let t_raster = t0.elapsed();

        let image = canvas.encode(req.format)?;
        let t_total = t0.elapsed();

        tracing::debug!(
            "生成完成 {}x{} {:?}: 排版={:?}, 栅格化={:?}, 编码={:?}, 总计={:?}, 大小={}B",
            req.width,
            req.height,
            req.format,
            t_layout,
            t_raster - t_layout,
            t_total - t_raster,
            t_total,
            image.bytes.len()
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::ImageService;
    use crate::features::image::fonts::FontBook;
    use crate::features::image::types::{
        AvatarQuery, CoverQuery, GenerationRequest, ImageFormat,
    };
    use resvg::usvg::fontdb;

    fn service() -> ImageService {
        ImageService::new(FontBook::from_database(fontdb::Database::new(), "Montserrat"))
    }

    #[test]
    fn generates_requested_format() {
        let svc = service();
        let req = GenerationRequest::avatar("Jane Doe", ImageFormat::Webp, &AvatarQuery::default());
        let img = svc.generate(&req).unwrap();
        assert_eq!(img.format, ImageFormat::Webp);
        assert_eq!(&img.bytes[..4], b"RIFF");
    }

    #[test]
    fn same_request_same_bytes() {
        let svc = service();
        let req = GenerationRequest::cover(
            "Dune",
            ImageFormat::Png,
            &CoverQuery {
                author: Some("Frank Herbert".into()),
                ..Default::default()
            },
        );
        assert_eq!(svc.generate(&req).unwrap(), svc.generate(&req).unwrap());
    }

    #[test]
    fn empty_name_still_renders() {
        let svc = service();
        let req = GenerationRequest::avatar("", ImageFormat::Png, &AvatarQuery::default());
        assert!(svc.generate(&req).is_ok());
    }
}
