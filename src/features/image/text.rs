use std::fmt::Write;

/// 拟合字号时使用的基准字号
pub const BASE_FONT_SIZE: f32 = 200.0;
/// 拟合结果的下限（空文本/退化字形时使用）
pub const MIN_FONT_SIZE: f32 = 1.0;
/// 行高相对字号的倍数
pub const LINE_HEIGHT: f32 = 1.2;

const DEGENERATE_EPSILON: f32 = 1e-3;

/// 名称首字母：按空格/下划线/连字符切分，每段取首字符并转大写。
///
/// 连续分隔符产生的空段会被跳过。
pub fn initials(name: &str) -> String {
    name.split([' ', '_', '-'])
        .map(str::trim)
        .filter_map(|token| token.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// 一段待排版文本：多行、统一字号、每行水平居中于 x = 0，首行基线位于 y = 0。
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub font_size: f32,
}

impl TextBlock {
    pub fn new(lines: Vec<String>, font_size: f32) -> Self {
        Self { lines, font_size }
    }

    pub fn single(line: impl Into<String>, font_size: f32) -> Self {
        Self::new(vec![line.into()], font_size)
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT
    }

    /// 写出 `<text>` 元素；`attrs` 为附加属性（填充色、变换等）。
    pub fn write_svg(&self, out: &mut String, font_family: &str, attrs: &str) -> std::fmt::Result {
        write!(
            out,
            r#"<text font-family="{}" font-size="{:.3}" text-anchor="middle" {attrs}>"#,
            escape_xml(font_family),
            self.font_size
        )?;
        for (i, line) in self.lines.iter().enumerate() {
            write!(
                out,
                r#"<tspan x="0" y="{:.3}">{}</tspan>"#,
                i as f32 * self.line_height(),
                escape_xml(line)
            )?;
        }
        out.push_str("</text>");
        Ok(())
    }
}

/// 字形墨迹包围盒（坐标系同 `TextBlock`）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextExtent {
    pub const EMPTY: TextExtent = TextExtent {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width < DEGENERATE_EPSILON
            || self.height < DEGENERATE_EPSILON
    }

    /// 字形轮廓随字号线性缩放
    pub fn scaled(&self, factor: f32) -> TextExtent {
        TextExtent {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// 文本测量能力（生产实现基于字体轮廓，测试可替换为线性模型）
pub trait TextMeasure {
    fn measure(&self, block: &TextBlock) -> TextExtent;
}

/// 贪心按词换行：超过 `wrap_width` 时另起一行，单词本身不拆分。
pub fn wrap_lines(
    text: &str,
    wrap_width: f32,
    font_size: f32,
    measurer: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            let width = measurer
                .measure(&TextBlock::single(candidate.as_str(), font_size))
                .width;
            if width > wrap_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// 字号拟合约束
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConstraints {
    /// 可用宽度（已扣除内边距）
    pub available_width: f32,
    /// 可用高度（已扣除内边距）
    pub available_height: f32,
    /// 字号上限（封面标题为画布高度的一半）
    pub max_size: Option<f32>,
    /// 最终乘数（作者行为 0.6）
    pub scale: f32,
}

impl FitConstraints {
    pub fn new(available_width: f32, available_height: f32) -> Self {
        Self {
            available_width,
            available_height,
            max_size: None,
            scale: 1.0,
        }
    }

    pub fn with_max_size(mut self, max_size: f32) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// 按基准字号下的测量结果计算拟合字号。
///
/// `size = base * min(可用高 / 测量高, 可用宽 / 测量宽)`，不限制放大。
/// 测量退化时两个缩放比视为无穷大：有上限则取上限，否则返回 `MIN_FONT_SIZE`。
/// 非正可用空间时返回 `MIN_FONT_SIZE`。
pub fn fit_font_size(measured: &TextExtent, base_size: f32, constraints: &FitConstraints) -> f32 {
    if constraints.available_width <= 0.0 || constraints.available_height <= 0.0 {
        return MIN_FONT_SIZE;
    }
    if measured.is_degenerate() {
        return match constraints.max_size {
            Some(max) if max.is_finite() => (max * constraints.scale).max(MIN_FONT_SIZE),
            _ => MIN_FONT_SIZE,
        };
    }

    let vertical_scale = constraints.available_height / measured.height;
    let horizontal_scale = constraints.available_width / measured.width;
    let mut size = base_size * vertical_scale.min(horizontal_scale);
    if let Some(max) = constraints.max_size {
        size = size.min(max);
    }
    size *= constraints.scale;

    if size.is_finite() {
        size.max(MIN_FONT_SIZE)
    } else {
        MIN_FONT_SIZE
    }
}

/// 文本在画布上的锚定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// 水平垂直居中
    Center,
    /// 顶部居中（墨迹上沿对齐到给定 y）
    Top(u32),
    /// 底部居中（墨迹下沿对齐到给定 y）
    Bottom(u32),
}

/// 拟合完成、可直接绘制的文本
#[derive(Debug, Clone, PartialEq)]
pub struct FittedText {
    pub block: TextBlock,
    /// 在拟合字号下的墨迹包围盒
    pub extent: TextExtent,
    pub anchor: Anchor,
    pub wrap_width: Option<f32>,
}

impl FittedText {
    /// 使墨迹包围盒落到锚点所需的平移量
    pub fn translation(&self, canvas_width: u32, canvas_height: u32) -> (f32, f32) {
        let tx = canvas_width as f32 / 2.0 - self.extent.center_x();
        let ty = match self.anchor {
            Anchor::Center => canvas_height as f32 / 2.0 - self.extent.center_y(),
            Anchor::Top(top) => top as f32 - self.extent.y,
            Anchor::Bottom(bottom) => bottom as f32 - self.extent.bottom(),
        };
        (tx, ty)
    }
}

/// 将文本以给定字号排版（可选换行）并测量
pub fn layout_text(
    text: &str,
    font_size: f32,
    wrap_width: Option<f32>,
    anchor: Anchor,
    measurer: &dyn TextMeasure,
) -> FittedText {
    let lines = match wrap_width {
        Some(width) => wrap_lines(text, width, font_size, measurer),
        None if text.is_empty() => Vec::new(),
        None => vec![text.to_string()],
    };
    let block = TextBlock::new(lines, font_size);
    let extent = if block.is_blank() {
        TextExtent::EMPTY
    } else {
        measurer.measure(&block)
    };
    FittedText {
        block,
        extent,
        anchor,
        wrap_width,
    }
}

/// XML 转义（用户文本写入 SVG 场景前必须经过）
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
