//! 场景合成：配色 + 拟合文本 → SVG 场景 → 栅格画布。
//!
//! 场景构建是纯字符串操作，测量能力通过 `TextMeasure` 注入；
//! 栅格化阶段才接触字体库与像素。

use std::fmt::Write;

use resvg::render;
use resvg::usvg;
use tiny_skia::{ColorU8, Pixmap, Transform};

use crate::error::AppError;

use super::fonts::FontBook;
use super::palette::{ColorScheme, derive_colors, opacity, to_hex};
use super::text::{
    Anchor, BASE_FONT_SIZE, FitConstraints, FittedText, TextBlock, TextExtent, TextMeasure,
    fit_font_size, initials, layout_text, wrap_lines,
};

/// 封面边框距画布边缘的距离
pub const BORDER_OFFSET: f32 = 10.0;
/// 封面边框（渐变内嵌线）宽度
pub const BORDER_WIDTH: f32 = 4.0;
/// 作者行相对标题的字号比例
pub const AUTHOR_SCALE: f32 = 0.6;

/// 单次生成独占的栅格画布，生成结束后移交编码器。
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, AppError> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            AppError::ImageRenderer(format!("Failed to create pixmap {width}x{height}"))
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// 非预乘像素（越界返回 None）
    pub fn pixel(&self, x: u32, y: u32) -> Option<ColorU8> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.pixmap.pixel(x, y).map(|p| p.demultiply())
    }

    fn draw(&mut self, tree: &usvg::Tree) {
        render(tree, Transform::default(), &mut self.pixmap.as_mut());
    }
}

/// 待绘制的场景
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub colors: ColorScheme,
    pub texts: Vec<FittedText>,
    /// 是否绘制封面边框
    pub border: bool,
}

impl Scene {
    /// 头像：名称首字母居中铺满（四周留 10% 内边距）
    pub fn avatar(name: &str, width: u32, height: u32, measurer: &dyn TextMeasure) -> Self {
        Self {
            width,
            height,
            colors: derive_colors(name),
            texts: vec![fit_initials(name, width, height, measurer)],
            border: false,
        }
    }

    /// 封面：有作者时为标题 + 作者两段文本；否则退化为带边框的首字母头像
    pub fn cover(
        title: &str,
        author: Option<&str>,
        width: u32,
        height: u32,
        measurer: &dyn TextMeasure,
    ) -> Self {
        let texts = match author.filter(|a| !a.trim().is_empty()) {
            Some(author) => fit_title_and_author(title, author, width, height, measurer),
            None => vec![fit_initials(title, width, height, measurer)],
        };
        Self {
            width,
            height,
            colors: derive_colors(title),
            texts,
            border: true,
        }
    }

    /// 生成 SVG 场景
    pub fn to_svg(&self, font_family: &str) -> Result<String, std::fmt::Error> {
        let (w, h) = (self.width as f32, self.height as f32);
        let (cx, cy, r) = (w * 0.1, h * 0.1, w.max(h));
        let colors = &self.colors;

        let mut svg = String::with_capacity(2048);
        write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        )?;

        svg.push_str("<defs>");
        write_radial_gradient(&mut svg, "bg", (cx, cy, r), colors.start, colors.end)?;
        if self.border {
            write_radial_gradient(&mut svg, "inlay", (cx, cy, r), colors.end, colors.start)?;
        }
        svg.push_str("</defs>");

        write!(
            svg,
            r##"<rect width="{w}" height="{h}" fill="#ffffff"/><rect width="{w}" height="{h}" fill="url(#bg)"/>"##,
            w = self.width,
            h = self.height
        )?;

        let fill = to_hex(colors.text);
        let fill_opacity = opacity(colors.text);
        for text in &self.texts {
            if text.block.is_blank() {
                continue;
            }
            let (tx, ty) = text.translation(self.width, self.height);
            let attrs = format!(
                r#"fill="{fill}" fill-opacity="{fill_opacity:.4}" transform="translate({tx:.3} {ty:.3})""#
            );
            text.block.write_svg(&mut svg, font_family, &attrs)?;
        }

        if self.border {
            let inner_w = w - BORDER_OFFSET * 2.0;
            let inner_h = h - BORDER_OFFSET * 2.0;
            if inner_w > 0.0 && inner_h > 0.0 {
                write!(
                    svg,
                    r#"<rect x="{o}" y="{o}" width="{inner_w}" height="{inner_h}" fill="none" stroke="{fill}" stroke-opacity="{fill_opacity:.4}" stroke-width="{outer}"/>"#,
                    o = BORDER_OFFSET,
                    outer = BORDER_WIDTH + 0.5
                )?;
                write!(
                    svg,
                    r##"<rect x="{o}" y="{o}" width="{inner_w}" height="{inner_h}" fill="none" stroke="url(#inlay)" stroke-width="{BORDER_WIDTH}"/>"##,
                    o = BORDER_OFFSET
                )?;
            }
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    /// 栅格化到新画布
    pub fn render(&self, fonts: &FontBook) -> Result<Canvas, AppError> {
        let svg = self
            .to_svg(&fonts.font_family())
            .map_err(|e| AppError::ImageRenderer(format!("Failed to build scene: {e}")))?;
        let tree = fonts.parse_svg(&svg)?;

        let mut canvas = Canvas::new(self.width, self.height)?;
        canvas.draw(&tree);
        Ok(canvas)
    }
}

fn write_radial_gradient(
    out: &mut String,
    id: &str,
    (cx, cy, r): (f32, f32, f32),
    from: ColorU8,
    to: ColorU8,
) -> std::fmt::Result {
    write!(
        out,
        r#"<radialGradient id="{id}" gradientUnits="userSpaceOnUse" cx="{cx}" cy="{cy}" fx="{cx}" fy="{cy}" r="{r}" spreadMethod="pad"><stop offset="0" stop-color="{}"/><stop offset="1" stop-color="{}"/></radialGradient>"#,
        to_hex(from),
        to_hex(to)
    )
}

/// 首字母模式：基准字号下测量一次，按线性缩放得到拟合后的墨迹框
fn fit_initials(name: &str, width: u32, height: u32, measurer: &dyn TextMeasure) -> FittedText {
    let text = initials(name);
    let hpad = (width / 10) as f32;
    let vpad = (height / 10) as f32;

    let lines = if text.is_empty() { Vec::new() } else { vec![text] };
    let measured = measurer.measure(&TextBlock::new(lines.clone(), BASE_FONT_SIZE));
    let constraints = FitConstraints::new(width as f32 - hpad * 2.0, height as f32 - vpad * 2.0);
    let size = fit_font_size(&measured, BASE_FONT_SIZE, &constraints);

    let extent = if measured.is_degenerate() {
        TextExtent::EMPTY
    } else {
        measured.scaled(size / BASE_FONT_SIZE)
    };

    FittedText {
        block: TextBlock::new(lines, size),
        extent,
        anchor: Anchor::Center,
        wrap_width: None,
    }
}

/// 标题模式：标题顶部居中换行，作者按标题拟合结果的 0.6 倍底部居中
fn fit_title_and_author(
    title: &str,
    author: &str,
    width: u32,
    height: u32,
    measurer: &dyn TextMeasure,
) -> Vec<FittedText> {
    let (w, h) = (width as f32, height as f32);
    let vpad = h / 10.0;
    let hpad = w / 10.0 + BORDER_OFFSET / 2.0;

    let measured = measurer.measure(&TextBlock::new(
        wrap_lines(title, w, BASE_FONT_SIZE, measurer),
        BASE_FONT_SIZE,
    ));
    let constraints =
        FitConstraints::new(w - hpad * 3.0, h - vpad * 3.0).with_max_size(h * 0.5);
    let title_size = fit_font_size(&measured, BASE_FONT_SIZE, &constraints);
    let author_size = fit_font_size(
        &measured,
        BASE_FONT_SIZE,
        &constraints.with_scale(AUTHOR_SCALE),
    );

    let wrap_width = (w - BORDER_OFFSET * 2.0) - BORDER_WIDTH * 2.0;
    let edge = (BORDER_OFFSET * 2.0) as u32;

    vec![
        layout_text(title, title_size, Some(wrap_width), Anchor::Top(edge), measurer),
        layout_text(
            author,
            author_size,
            Some(wrap_width),
            Anchor::Bottom(height.saturating_sub(edge)),
            measurer,
        ),
    ]
}
