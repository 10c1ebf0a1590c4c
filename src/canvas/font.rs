// Font collection seam
use crate::tree::style::FontSlant;

/// Glyph id reported for characters the typeface cannot draw
pub const MISSING_GLYPH: u16 = 0;

/// Handle to a typeface registered in a font collection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypefaceId(pub u32);

/// A typeface at a size. A font without a typeface draws nothing and has zero width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Font {
    pub typeface: Option<TypefaceId>,
    pub size: f32,
}

impl Font {
    pub fn new(typeface: TypefaceId, size: f32) -> Self {
        Self {
            typeface: Some(typeface),
            size,
        }
    }

    pub fn empty(size: f32) -> Self {
        Self { typeface: None, size }
    }

    pub fn is_empty(&self) -> bool {
        self.typeface.is_none()
    }
}

/// What to look for when matching a typeface
#[derive(Clone, Debug, PartialEq)]
pub struct FontDescriptor {
    pub families: Vec<String>,
    pub weight: u16,
    pub slant: FontSlant,
    pub size: f32,
}

/// Vertical metrics in pixels; `ascent` and `descent` are both positive
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontMetrics {
    pub ascent: f64,
    pub descent: f64,
    pub x_height: f64,
    pub underline_thickness: f64,
}

impl FontMetrics {
    pub fn empty() -> Self {
        Self {
            ascent: 0.0,
            descent: 0.0,
            x_height: 0.0,
            underline_thickness: 1.0,
        }
    }
}

/// Coarse script category used to pick fallback families
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnicodeBucket {
    Cjk,
    Emoji,
    Symbol,
    Generic,
}

impl UnicodeBucket {
    /// Classify a grapheme cluster by its first scalar value
    pub fn classify(grapheme: &str) -> Self {
        let Some(ch) = grapheme.chars().next() else {
            return UnicodeBucket::Generic;
        };
        // Emoji presentation selector or keycap sequences
        if grapheme.contains('\u{FE0F}') || grapheme.contains('\u{20E3}') {
            return UnicodeBucket::Emoji;
        }
        match ch as u32 {
            0x1100..=0x11FF
            | 0x2E80..=0x2FDF
            | 0x3000..=0x30FF
            | 0x3130..=0x318F
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xAC00..=0xD7AF
            | 0xF900..=0xFAFF
            | 0xFF00..=0xFFEF
            | 0x20000..=0x3FFFF => UnicodeBucket::Cjk,
            0x1F000..=0x1FAFF | 0x2600..=0x27BF => UnicodeBucket::Emoji,
            0x2000..=0x25FF | 0x2B00..=0x2BFF => UnicodeBucket::Symbol,
            _ => UnicodeBucket::Generic,
        }
    }
}

/// Typeface matching, glyph lookup and measurement
pub trait FontCollection {
    /// Best typeface for a descriptor; falls back to the empty font
    fn match_font(&self, descriptor: &FontDescriptor) -> Font;
    /// One glyph id per character, `MISSING_GLYPH` where uncovered
    fn glyph_ids(&self, font: &Font, text: &str) -> Vec<u16>;
    fn glyph_widths(&self, font: &Font, glyphs: &[u16]) -> Vec<f32>;
    fn metrics(&self, font: &Font) -> FontMetrics;
    /// A typeface able to draw `grapheme`, if any
    fn fallback_typeface(
        &self,
        grapheme: &str,
        bucket: UnicodeBucket,
        descriptor: &FontDescriptor,
    ) -> Option<TypefaceId>;

    /// Advance width of a string
    fn measure(&self, font: &Font, text: &str) -> f64 {
        let glyphs = self.glyph_ids(font, text);
        self.glyph_widths(font, &glyphs).iter().map(|w| *w as f64).sum()
    }

    fn has_missing_glyphs(&self, font: &Font, text: &str) -> bool {
        font.is_empty() || self.glyph_ids(font, text).contains(&MISSING_GLYPH)
    }
}
