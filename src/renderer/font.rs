// Font selection for the text painters
use crate::canvas::font::{Font, FontCollection, FontDescriptor, FontMetrics};
use crate::tree::style::{FontStyle, Styles};

/// A matched font together with the vertical offsets text is placed at
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    pub font: Font,
    pub descriptor: FontDescriptor,
    pub metrics: FontMetrics,
    /// Distance from the top of a line box to the alphabetic baseline
    pub baseline: f64,
    /// Distance from the top of a line box to the middle of lowercase glyphs
    pub middle: f64,
}

pub fn font_descriptor(style: &FontStyle) -> FontDescriptor {
    FontDescriptor {
        families: style
            .families
            .iter()
            .map(|family| family.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|family| !family.is_empty())
            .collect(),
        weight: style.weight.clamp(100, 900),
        slant: style.slant,
        size: style.size,
    }
}

pub fn resolve_font(fonts: &dyn FontCollection, style: &FontStyle) -> ResolvedFont {
    let descriptor = font_descriptor(style);
    let font = fonts.match_font(&descriptor);
    let metrics = if font.is_empty() {
        FontMetrics::empty()
    } else {
        fonts.metrics(&font)
    };
    let baseline = metrics.ascent;
    let middle = baseline - metrics.x_height / 2.0;

    ResolvedFont {
        font,
        descriptor,
        metrics,
        baseline,
        middle,
    }
}

/// Used line height; `normal` is 1.2 times the font size
pub fn compute_line_height(styles: &Styles) -> f64 {
    styles.line_height.unwrap_or(styles.font.size as f64 * 1.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_strips_quotes() {
        let style = FontStyle {
            families: vec!["\"Open Sans\"".to_string(), " serif ".to_string(), "".to_string()],
            weight: 1000,
            ..FontStyle::default()
        };
        let descriptor = font_descriptor(&style);
        assert_eq!(descriptor.families, vec!["Open Sans".to_string(), "serif".to_string()]);
        assert_eq!(descriptor.weight, 900);
    }
}
