// Paint color resolution and brush construction
use color::{AlphaColor, Srgb};
use kurbo::Stroke;
use peniko::Color;

use crate::canvas::{Brush, BrushStyle, PaintSource};

/// Parse a CSS color. Unrecognized input resolves to opaque black.
pub fn resolve_color(css: &str) -> Color {
    if let Ok(parsed) = color::parse_color(css) {
        return parsed.to_alpha_color::<Srgb>();
    }
    let css = css.trim();
    parse_hex(css)
        .or_else(|| parse_rgb_function(css))
        .unwrap_or(Color::BLACK)
}

/// `resolve_color` with its alpha multiplied by a global alpha
pub fn resolve_color_with_alpha(css: &str, global_alpha: f32) -> Color {
    resolve_color(css).multiply_alpha(global_alpha)
}

pub fn is_transparent(css: &str) -> bool {
    resolve_color(css).components[3] <= 0.0
}

/// Anti-aliased brush of a solid color
pub fn make_brush(color: Color, style: BrushStyle) -> Brush {
    Brush {
        source: PaintSource::Solid(color),
        style,
        blur: None,
        anti_alias: true,
    }
}

pub fn stroke_brush(color: Color, stroke: Stroke) -> Brush {
    make_brush(color, BrushStyle::Stroke(stroke))
}

fn parse_hex(css: &str) -> Option<Color> {
    let hex = css.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let [r, g, b, a] = match hex.len() {
        3 => [digit(0)?, digit(1)?, digit(2)?, 255],
        4 => [digit(0)?, digit(1)?, digit(2)?, digit(3)?],
        6 => [pair(0)?, pair(2)?, pair(4)?, 255],
        8 => [pair(0)?, pair(2)?, pair(4)?, pair(6)?],
        _ => return None,
    };
    Some(AlphaColor::from_rgba8(r, g, b, a))
}

fn parse_rgb_function(css: &str) -> Option<Color> {
    let lower = css.to_ascii_lowercase();
    let args = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |part: &str| -> Option<f32> {
        let value = match part.strip_suffix('%') {
            Some(percent) => percent.parse::<f32>().ok()? * 2.55,
            None => part.parse::<f32>().ok()?,
        };
        Some(value.clamp(0.0, 255.0) / 255.0)
    };
    let alpha = match parts.get(3) {
        Some(part) => match part.strip_suffix('%') {
            Some(percent) => percent.parse::<f32>().ok()? / 100.0,
            None => part.parse::<f32>().ok()?,
        },
        None => 1.0,
    };

    Some(AlphaColor::new([
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha.clamp(0.0, 1.0),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_rgb_agree() {
        let hex = resolve_color("#336699").to_rgba8();
        let rgb = resolve_color("rgb(51,102,153)").to_rgba8();
        assert_eq!(hex, rgb);
        assert_eq!((hex.r, hex.g, hex.b, hex.a), (51, 102, 153, 255));
    }

    #[test]
    fn global_alpha_halves_opaque_color() {
        let color = resolve_color_with_alpha("#336699", 0.5);
        assert!((color.components[3] - 0.5).abs() < 1e-6);
        // channels are not premultiplied
        assert_eq!(color.to_rgba8().r, 51);
    }

    #[test]
    fn manual_fallbacks() {
        assert_eq!(parse_hex("#f00c").map(|c| c.to_rgba8().a), Some(204));
        let rgba = parse_rgb_function("rgba(255, 0, 0, 50%)").unwrap();
        assert!((rgba.components[3] - 0.5).abs() < 1e-6);
        assert!(parse_rgb_function("hsl(0, 0%, 0%)").is_none());
    }

    #[test]
    fn garbage_is_opaque_black() {
        assert_eq!(resolve_color("not-a-color"), Color::BLACK);
        assert!(is_transparent("transparent"));
        assert!(!is_transparent("red"));
    }
}
