use axum::body::Bytes;
use image::ColorType;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;

use crate::error::AppError;

use super::composer::Canvas;
use super::types::ImageFormat;

/// JPEG 固定质量
const JPEG_QUALITY: u8 = 75;

/// 编码后的图片（不可变字节 + 格式）
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Bytes,
    pub format: ImageFormat,
}

impl EncodedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.mime()
    }
}

impl Canvas {
    /// 消费画布并编码为指定格式
    pub fn encode(self, format: ImageFormat) -> Result<EncodedImage, AppError> {
        let (w, h) = (self.width(), self.height());
        let rgba = demultiplied_rgba(&self);

        let bytes = match format {
            ImageFormat::Png => encode_png(&rgba, w, h)?,
            ImageFormat::Jpeg => encode_jpeg(&rgba, w, h)?,
            ImageFormat::Webp => encode_webp(&rgba, w, h)?,
        };

        Ok(EncodedImage {
            bytes: Bytes::from(bytes),
            format,
        })
    }
}

/// tiny-skia 内部为预乘 alpha，编码前还原
fn demultiplied_rgba(canvas: &Canvas) -> Vec<u8> {
    let pixmap = canvas.pixmap();
    let mut out = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

fn encode_png(rgba: &[u8], w: u32, h: u32) -> Result<Vec<u8>, AppError> {
    let mut out = Vec::with_capacity(rgba.len() / 2);
    {
        let mut encoder = png::Encoder::new(&mut out, w, h);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Default);
        encoder.set_filter(png::FilterType::Paeth);
        let mut writer = encoder
            .write_header()
            .map_err(|e| AppError::ImageRenderer(format!("PNG write_header error: {e}")))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| AppError::ImageRenderer(format!("PNG write_image_data error: {e}")))?;
        writer
            .finish()
            .map_err(|e| AppError::ImageRenderer(format!("PNG finish error: {e}")))?;
    }
    Ok(out)
}

fn encode_jpeg(rgba: &[u8], w: u32, h: u32) -> Result<Vec<u8>, AppError> {
    // JPEG 无透明通道：合成到白底
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = u16::from(px[3]);
        for &c in &px[..3] {
            rgb.push(((u16::from(c) * a + 255 * (255 - a)) / 255) as u8);
        }
    }

    let mut out = Vec::new();
    let mut enc = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    enc.encode(&rgb, w, h, ColorType::Rgb8.into())
        .map_err(|e| AppError::ImageRenderer(format!("JPEG encode error: {e}")))?;
    Ok(out)
}

fn encode_webp(rgba: &[u8], w: u32, h: u32) -> Result<Vec<u8>, AppError> {
    let mut out = Vec::new();
    let enc = WebPEncoder::new_lossless(&mut out);
    enc.encode(rgba, w, h, ColorType::Rgba8.into())
        .map_err(|e| AppError::ImageRenderer(format!("WebP encode error: {e}")))?;
    Ok(out)
}
