use serde::{Deserialize, Serialize};

/// 默认边长（像素）
pub const DEFAULT_SIZE: u32 = 200;
/// 封面默认高宽比
pub const COVER_ASPECT: f64 = 1.25;

/// 输出图片格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG（默认，无法识别的扩展名也回落到 PNG）
    #[default]
    Png,
    /// JPEG（固定质量，不含透明通道）
    Jpeg,
    /// WebP（无损）
    Webp,
}

impl ImageFormat {
    /// 由扩展名推断格式（大小写不敏感）
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "webp" => ImageFormat::Webp,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

/// 把 `{name}.{ext}` 形式的路由段在最后一个 '.' 处拆开，返回 `(name, ext)`。
///
/// 缺少扩展名（无 '.' 或 '.' 在末尾）时不匹配路由；名称允许为空。
pub fn split_file_name(file: &str) -> Option<(&str, &str)> {
    let (stem, ext) = file.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some((stem, ext))
}

/// 响应 Content-Type：`image/{ext}`（扩展名转小写，与实际编码格式无关）。
///
/// 扩展名含 MIME token 以外的字符时使用实际编码格式的 MIME。
pub fn content_type_for(ext: &str, format: ImageFormat) -> String {
    let ext = ext.to_ascii_lowercase();
    let is_token = !ext.is_empty()
        && ext
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.' | b'_'));
    if is_token {
        format!("image/{ext}")
    } else {
        format.mime().to_string()
    }
}

/// 头像查询参数
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvatarQuery {
    /// 宽度像素（默认 200）
    #[serde(default)]
    pub width: Option<u32>,
    /// 高度像素（默认 200）
    #[serde(default)]
    pub height: Option<u32>,
}

/// 封面查询参数
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CoverQuery {
    /// 作者（缺省时封面退化为带边框的标题首字母）
    #[serde(default)]
    pub author: Option<String>,
    /// 宽度像素（默认 200）
    #[serde(default)]
    pub width: Option<u32>,
    /// 高度像素（默认 round(width × 1.25)）
    #[serde(default)]
    pub height: Option<u32>,
}

/// 生成内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageKind {
    Avatar { name: String },
    Cover { title: String, author: Option<String> },
}

/// 单次生成请求（请求作用域，不跨请求保留）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: ImageKind,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl GenerationRequest {
    pub fn avatar(name: impl Into<String>, format: ImageFormat, query: &AvatarQuery) -> Self {
        Self {
            kind: ImageKind::Avatar { name: name.into() },
            format,
            width: query.width.unwrap_or(DEFAULT_SIZE),
            height: query.height.unwrap_or(DEFAULT_SIZE),
        }
    }

    pub fn cover(title: impl Into<String>, format: ImageFormat, query: &CoverQuery) -> Self {
        let width = query.width.unwrap_or(DEFAULT_SIZE);
        Self {
            kind: ImageKind::Cover {
                title: title.into(),
                author: query.author.clone(),
            },
            format,
            width,
            height: query.height.unwrap_or_else(|| default_cover_height(width)),
        }
    }

    /// 参与配色派生的文本
    pub fn seed_text(&self) -> &str {
        match &self.kind {
            ImageKind::Avatar { name } => name,
            ImageKind::Cover { title, .. } => title,
        }
    }
}

/// 封面默认高度：`width × 1.25` 四舍六入五成双
pub fn default_cover_height(width: u32) -> u32 {
    (f64::from(width) * COVER_ASPECT).round_ties_even() as u32
}
