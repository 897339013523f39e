use tiny_skia::ColorU8;

use super::rng::{SubtractiveRng, stable_hash};

/// 文字颜色的不透明度（约 78%）
pub const TEXT_ALPHA: u8 = 200;

/// 由文本派生的配色方案
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScheme {
    /// 色相 [0, 360)
    pub hue: i32,
    /// 饱和度 [0.1, 0.9]
    pub saturation: f32,
    /// 亮度 [0.1, 0.9]
    pub lightness: f32,
    /// 渐变起点（亮度 +0.05）
    pub start: ColorU8,
    /// 渐变终点（亮度 -0.05）
    pub end: ColorU8,
    /// 与背景形成对比的文字颜色
    pub text: ColorU8,
}

impl ColorScheme {
    /// 背景是否偏暗（此时文字为近白色）
    pub fn is_dark(&self) -> bool {
        self.lightness <= 0.5
    }
}

/// 由文本确定性地派生配色：稳定哈希 → 种子 → 配色。
pub fn derive_colors(text: &str) -> ColorScheme {
    derive_from_seed(stable_hash(text))
}

/// 由种子派生配色。
///
/// 抽样顺序固定为：色相、饱和度、亮度。
pub fn derive_from_seed(seed: i32) -> ColorScheme {
    let mut rng = SubtractiveRng::new(seed);

    let hue = rng.next_in_range(0, 360);
    let saturation = (rng.next_f64() * 0.8 + 0.1) as f32;
    let lightness = (rng.next_f64() * 0.8 + 0.1) as f32;

    let text = if lightness <= 0.5 {
        ColorU8::from_rgba(255, 255, 255, TEXT_ALPHA)
    } else {
        ColorU8::from_rgba(0, 0, 0, TEXT_ALPHA)
    };

    ColorScheme {
        hue,
        saturation,
        lightness,
        start: hsl_to_rgb(hue as f32, saturation, lightness + 0.05),
        end: hsl_to_rgb(hue as f32, saturation, lightness - 0.05),
        text,
    }
}

/// HSL → 不透明 RGB（各通道四舍五入到 u8）
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> ColorU8 {
    const EPSILON: f32 = 0.001;
    let ranged_hue = hue / 360.0;

    let (r, g, b) = if lightness.abs() <= EPSILON {
        (0.0, 0.0, 0.0)
    } else if saturation.abs() < EPSILON {
        (lightness, lightness, lightness)
    } else {
        let second = if lightness < 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - saturation * lightness
        };
        let first = 2.0 * lightness - second;
        (
            hue_component(first, second, ranged_hue + 0.333_333_3),
            hue_component(first, second, ranged_hue),
            hue_component(first, second, ranged_hue - 0.333_333_3),
        )
    };

    ColorU8::from_rgba(to_channel(r), to_channel(g), to_channel(b), 255)
}

fn hue_component(first: f32, second: f32, third: f32) -> f32 {
    let third = if third < 0.0 {
        third + 1.0
    } else if third > 1.0 {
        third - 1.0
    } else {
        third
    };

    if third < 0.166_666_7 {
        first + (second - first) * 6.0 * third
    } else if third < 0.5 {
        second
    } else if third < 0.666_666_7 {
        first + (second - first) * (0.666_666_7 - third) * 6.0
    } else {
        first
    }
}

fn to_channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5).floor() as u8
}

/// `#rrggbb` 形式（SVG 属性使用）
pub fn to_hex(color: ColorU8) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        color.red(),
        color.green(),
        color.blue()
    )
}

/// 0..=1 的不透明度
pub fn opacity(color: ColorU8) -> f32 {
    f32::from(color.alpha()) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rgb_close(actual: ColorU8, expected: (u8, u8, u8)) {
        let diff = |a: u8, b: u8| (i16::from(a) - i16::from(b)).abs();
        assert!(
            diff(actual.red(), expected.0) <= 1
                && diff(actual.green(), expected.1) <= 1
                && diff(actual.blue(), expected.2) <= 1,
            "got {actual:?}, expected {expected:?}"
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        for text in ["", "Jane Doe", "mary-jane_watson", "标题", "🦀 crab"] {
            assert_eq!(derive_colors(text), derive_colors(text));
        }
    }

    #[test]
    fn empty_text_has_stable_colors() {
        let scheme = derive_colors("");
        assert_eq!(scheme.hue, 229);
        assert!((scheme.saturation - 0.770_437).abs() < 1e-6);
        assert!((scheme.lightness - 0.486_614_14).abs() < 1e-6);
    }

    #[test]
    fn known_names_match_previous_deployment() {
        let jane = derive_colors("Jane Doe");
        assert_eq!(jane.hue, 305);
        assert!((jane.saturation - 0.696_125_7).abs() < 1e-6);
        assert!((jane.lightness - 0.108_951_09).abs() < 1e-6);
        assert_rgb_close(jane.start, (69, 12, 64));
        assert_rgb_close(jane.end, (25, 5, 24));

        let foo = derive_colors("foo");
        assert_eq!(foo.hue, 196);
        assert_rgb_close(foo.start, (138, 175, 189));
        assert_rgb_close(foo.end, (105, 153, 170));
    }

    #[test]
    fn ranges_hold_for_many_inputs() {
        for i in 0..2_000 {
            let scheme = derive_colors(&format!("user-{i}"));
            assert!((0..360).contains(&scheme.hue));
            assert!((0.1..=0.9).contains(&scheme.saturation));
            assert!((0.1..=0.9).contains(&scheme.lightness));
            assert_eq!(scheme.start.alpha(), 255);
            assert_eq!(scheme.end.alpha(), 255);
        }
    }

    #[test]
    fn text_color_contrasts_with_lightness() {
        for i in 0..500 {
            let scheme = derive_colors(&format!("contrast {i}"));
            assert_eq!(scheme.text.alpha(), TEXT_ALPHA);
            if scheme.lightness <= 0.5 {
                assert!(scheme.is_dark());
                assert_eq!((scheme.text.red(), scheme.text.green(), scheme.text.blue()), (255, 255, 255));
            } else {
                assert_eq!((scheme.text.red(), scheme.text.green(), scheme.text.blue()), (0, 0, 0));
            }
        }
    }

    #[test]
    fn start_is_lighter_than_end() {
        let scheme = derive_colors("gradient");
        let luma = |c: ColorU8| u32::from(c.red()) + u32::from(c.green()) + u32::from(c.blue());
        assert!(luma(scheme.start) >= luma(scheme.end));
    }

    #[test]
    fn primary_hues_convert_exactly() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), ColorU8::from_rgba(255, 0, 0, 255));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), ColorU8::from_rgba(0, 255, 0, 255));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), ColorU8::from_rgba(0, 0, 255, 255));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 0.5), ColorU8::from_rgba(128, 128, 128, 255));
        assert_eq!(hsl_to_rgb(42.0, 0.5, 0.0), ColorU8::from_rgba(0, 0, 0, 255));
    }

    #[test]
    fn hex_and_opacity_formatting() {
        assert_eq!(to_hex(ColorU8::from_rgba(69, 12, 64, 255)), "#450c40");
        assert!((opacity(ColorU8::from_rgba(0, 0, 0, 200)) - 0.784_313_7).abs() < 1e-6);
    }
}
