use std::fs;
use std::path::Path;
use std::sync::Arc;

use resvg::usvg::{self, fontdb};

use crate::config::RenderConfig;
use crate::error::AppError;

use super::text::{TextBlock, TextExtent, TextMeasure};

/// 字体库：fontdb 数据库 + 首选字体族。
///
/// 启动期构建一次，之后只读共享给所有渲染任务。
#[derive(Debug, Clone)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
    family: String,
}

impl FontBook {
    /// 按配置加载字体：可选系统字体 + 自定义字体目录
    pub fn load(config: &RenderConfig) -> Self {
        let mut db = fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        load_fonts_dir(&mut db, Path::new(&config.fonts_dir));
        Self::from_database(db, &config.font_family)
    }

    /// 由现成数据库构建；首选字体缺失时以库中第一个字体族作为 sans-serif 回退。
    pub fn from_database(mut db: fontdb::Database, family: &str) -> Self {
        let has_family = db
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name == family));
        let first_family: Option<String> = db
            .faces()
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()));

        match (has_family, first_family) {
            (true, _) => db.set_sans_serif_family(family),
            (false, Some(fallback)) => {
                tracing::warn!("未找到字体 '{}'，回退到 '{}'", family, fallback);
                db.set_sans_serif_family(fallback);
            }
            (false, None) => tracing::warn!("字体库为空，文字将不会被绘制"),
        }

        tracing::info!("字体库加载完成: {} 个字形文件, 首选字体 '{}'", db.len(), family);

        Self {
            db: Arc::new(db),
            family: family.to_string(),
        }
    }

    /// SVG `font-family` 属性值（首选字体 + 通用回退）
    pub fn font_family(&self) -> String {
        format!("{}, sans-serif", self.family)
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// 解析 SVG 场景（共享字体库）
    pub fn parse_svg(&self, svg: &str) -> Result<usvg::Tree, AppError> {
        let opts = usvg::Options {
            fontdb: self.db.clone(),
            font_family: self.family.clone(),
            shape_rendering: usvg::ShapeRendering::GeometricPrecision,
            text_rendering: usvg::TextRendering::OptimizeLegibility,
            ..Default::default()
        };
        usvg::Tree::from_data(svg.as_bytes(), &opts)
            .map_err(|e| AppError::ImageRenderer(format!("Failed to parse SVG: {e}")))
    }
}

fn load_fonts_dir(db: &mut fontdb::Database, dir: &Path) {
    if !dir.is_dir() {
        tracing::debug!("字体目录不存在，跳过: {}", dir.display());
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        tracing::warn!("读取字体目录失败: {}", dir.display());
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_font = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"));
        if path.is_file() && is_font {
            if let Err(e) = db.load_font_file(&path) {
                tracing::error!("加载字体文件失败 '{}': {}", path.display(), e);
            }
        }
    }
}

/// 基于字形轮廓的测量器：把文本块放进最小 SVG，由 usvg 展开为轮廓后取墨迹包围盒。
pub struct FontMeasurer<'a> {
    fonts: &'a FontBook,
}

impl<'a> FontMeasurer<'a> {
    pub fn new(fonts: &'a FontBook) -> Self {
        Self { fonts }
    }

    fn measurement_svg(&self, block: &TextBlock) -> Result<String, std::fmt::Error> {
        let mut svg = String::from(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1" overflow="visible">"#,
        );
        block.write_svg(&mut svg, &self.fonts.font_family(), r#"fill="black""#)?;
        svg.push_str("</svg>");
        Ok(svg)
    }
}

impl TextMeasure for FontMeasurer<'_> {
    fn measure(&self, block: &TextBlock) -> TextExtent {
        if block.is_blank() {
            return TextExtent::EMPTY;
        }
        let Ok(svg) = self.measurement_svg(block) else {
            return TextExtent::EMPTY;
        };
        let tree = match self.fonts.parse_svg(&svg) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("文本测量失败: {}", e);
                return TextExtent::EMPTY;
            }
        };
        glyph_ink_bounds(tree.root()).unwrap_or(TextExtent::EMPTY)
    }
}

/// 文本节点展开为字形轮廓后的紧致包围盒（不含行框的上伸/下伸留白）
fn glyph_ink_bounds(group: &usvg::Group) -> Option<TextExtent> {
    let mut bounds: Option<(f32, f32, f32, f32)> = None;
    for node in group.children() {
        let rect = match node {
            usvg::Node::Text(text) => {
                let outlines = text.flattened();
                if !outlines.has_children() {
                    continue;
                }
                let r = outlines.abs_bounding_box();
                Some((r.left(), r.top(), r.right(), r.bottom()))
            }
            usvg::Node::Group(inner) => glyph_ink_bounds(inner)
                .map(|e| (e.x, e.y, e.x + e.width, e.y + e.height)),
            _ => None,
        };
        if let Some((l, t, r, b)) = rect {
            bounds = Some(match bounds {
                Some((bl, bt, br, bb)) => (bl.min(l), bt.min(t), br.max(r), bb.max(b)),
                None => (l, t, r, b),
            });
        }
    }
    bounds.map(|(left, top, right, bottom)| TextExtent {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}
