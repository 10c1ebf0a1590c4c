// Resolved CSS values consumed by the painter.
//
// Lengths are already in CSS pixels except where a percentage has to be
// resolved against a box only known at paint time (background layers).
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A length or a percentage of some reference size
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthPercentage {
    Px(f64),
    Percent(f64),
}

impl LengthPercentage {
    pub const ZERO: Self = LengthPercentage::Px(0.0);
    pub const FIFTY_PERCENT: Self = LengthPercentage::Percent(50.0);

    /// Convert to pixels against the given reference length
    pub fn resolve(&self, basis: f64) -> f64 {
        match self {
            LengthPercentage::Px(px) => *px,
            LengthPercentage::Percent(percent) => basis * percent / 100.0,
        }
    }
}

impl Default for LengthPercentage {
    fn default() -> Self {
        Self::ZERO
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BorderStyle {
    #[default]
    None,
    Solid,
    Double,
    Dashed,
    Dotted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderSide {
    pub style: BorderStyle,
    pub color: String,
    pub width: f64,
}

impl Default for BorderSide {
    fn default() -> Self {
        Self {
            style: BorderStyle::None,
            color: "transparent".to_string(),
            width: 0.0,
        }
    }
}

/// Box for background-origin and background-clip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundBox {
    #[default]
    BorderBox,
    PaddingBox,
    ContentBox,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundRepeat {
    #[default]
    Repeat,
    NoRepeat,
    RepeatX,
    RepeatY,
}

/// One component of an explicit background-size
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeComponent {
    Auto,
    Length(LengthPercentage),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundSize {
    Cover,
    Contain,
    Explicit(SizeComponent, SizeComponent),
}

impl Default for BackgroundSize {
    fn default() -> Self {
        BackgroundSize::Explicit(SizeComponent::Auto, SizeComponent::Auto)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub color: String,
    #[serde(default)]
    pub position: Option<LengthPercentage>,
}

/// Direction of a linear gradient
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientAngle {
    /// CSS angle in radians, 0 pointing up
    Radians(f64),
    /// `to <corner>`: the corner the gradient runs toward, as fractions of
    /// the box (0.0 or 1.0 on each axis)
    Corner { x: f64, y: f64 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RadialShape {
    Circle,
    #[default]
    Ellipse,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RadialExtent {
    ClosestSide,
    ClosestCorner,
    FarthestSide,
    FarthestCorner,
    Explicit(LengthPercentage, Option<LengthPercentage>),
}

impl Default for RadialExtent {
    fn default() -> Self {
        RadialExtent::FarthestCorner
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundImage {
    Url(String),
    LinearGradient {
        angle: GradientAngle,
        stops: Vec<ColorStop>,
    },
    RadialGradient {
        #[serde(default)]
        shape: RadialShape,
        #[serde(default)]
        extent: RadialExtent,
        /// Empty means centered
        #[serde(default)]
        position: Vec<LengthPercentage>,
        stops: Vec<ColorStop>,
    },
}

/// A single entry of the comma separated background lists
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackgroundLayer {
    pub image: BackgroundImage,
    #[serde(default)]
    pub size: BackgroundSize,
    #[serde(default)]
    pub position: [LengthPercentage; 2],
    #[serde(default)]
    pub repeat: BackgroundRepeat,
    #[serde(default = "padding_box")]
    pub origin: BackgroundBox,
    #[serde(default)]
    pub clip: BackgroundBox,
}

fn padding_box() -> BackgroundBox {
    BackgroundBox::PaddingBox
}

impl BackgroundLayer {
    /// Layer with the initial values of every other background property
    pub fn new(image: BackgroundImage) -> Self {
        Self {
            image,
            size: BackgroundSize::default(),
            position: [LengthPercentage::ZERO; 2],
            repeat: BackgroundRepeat::Repeat,
            origin: BackgroundBox::PaddingBox,
            clip: BackgroundBox::BorderBox,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxShadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub spread: f64,
    pub color: String,
    pub inset: bool,
}

impl Default for BoxShadow {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            spread: 0.0,
            color: "black".to_string(),
            inset: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    pub offset_x: f64,
    pub offset_y: f64,
    #[serde(default)]
    pub blur: f64,
    pub color: String,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TextDecorationLine: u8 {
        const UNDERLINE = 0b001;
        const OVERLINE = 0b010;
        const LINE_THROUGH = 0b100;
    }
}

/// One pass of `paint-order`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaintOrderLayer {
    Fill,
    Stroke,
    Markers,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontStyle {
    pub families: Vec<String>,
    pub size: f32,
    pub weight: u16,
    pub slant: FontSlant,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            families: vec!["sans-serif".to_string()],
            size: 16.0,
            weight: 400,
            slant: FontSlant::Normal,
        }
    }
}

/// The resolved declaration block of an element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Styles {
    pub background_color: String,
    /// First entry is the topmost layer
    pub background_layers: Vec<BackgroundLayer>,
    pub borders: [BorderSide; 4],
    pub box_shadows: Vec<BoxShadow>,
    pub color: String,
    pub font: FontStyle,
    pub letter_spacing: f64,
    pub line_height: Option<f64>,
    pub text_align: TextAlign,
    pub text_decoration_line: TextDecorationLine,
    pub text_decoration_color: Option<String>,
    pub text_shadows: Vec<TextShadow>,
    pub paint_order: Vec<PaintOrderLayer>,
    pub webkit_text_stroke_width: f64,
    pub webkit_text_stroke_color: String,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            background_color: "transparent".to_string(),
            background_layers: Vec::new(),
            borders: Default::default(),
            box_shadows: Vec::new(),
            color: "black".to_string(),
            font: FontStyle::default(),
            letter_spacing: 0.0,
            line_height: None,
            text_align: TextAlign::Left,
            text_decoration_line: TextDecorationLine::empty(),
            text_decoration_color: None,
            text_shadows: Vec::new(),
            paint_order: vec![PaintOrderLayer::Fill, PaintOrderLayer::Stroke, PaintOrderLayer::Markers],
            webkit_text_stroke_width: 0.0,
            webkit_text_stroke_color: "black".to_string(),
        }
    }
}

impl Styles {
    /// Clip box of the first declared layer, which also bounds the background color
    pub fn background_color_clip(&self) -> BackgroundBox {
        self.background_layers.first().map(|layer| layer.clip).unwrap_or_default()
    }

    pub fn has_background(&self) -> bool {
        !self.background_layers.is_empty() || !crate::renderer::paint::is_transparent(&self.background_color)
    }
}
