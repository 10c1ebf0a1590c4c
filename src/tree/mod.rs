// Stacking-context tree handed to the painter by the layout stage
pub mod geometry;
pub mod list;
pub mod style;
pub mod tags;

use bitflags::bitflags;
use kurbo::{Affine, Point, Rect, Size};
use serde::{Deserialize, Serialize};

pub use geometry::{BoxGeometry, PathSegment, Side, SideGeometry};
pub use list::{ListMarker, ListStyleType};
pub use style::Styles;
pub use tags::{StructureTree, TagNode};

/// Identity of an element, shared with the accessibility tag tree
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

bitflags! {
    /// Which painting phases an effect applies to
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EffectTarget: u8 {
        const BACKGROUND_BORDERS = 0b01;
        const CONTENT = 0b10;
    }
}

impl Default for EffectTarget {
    fn default() -> Self {
        EffectTarget::all()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKind {
    Opacity(f32),
    /// 2D matrix applied around `origin`
    Transform { matrix: Affine, origin: Point },
    Clip(Vec<PathSegment>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    #[serde(default)]
    pub target: EffectTarget,
}

impl Effect {
    pub fn new(kind: EffectKind, target: EffectTarget) -> Self {
        Self { kind, target }
    }

    pub fn opacity(value: f32) -> Self {
        Self::new(EffectKind::Opacity(value), EffectTarget::all())
    }

    pub fn transform(matrix: Affine, origin: Point) -> Self {
        Self::new(EffectKind::Transform { matrix, origin }, EffectTarget::all())
    }

    pub fn clip(path: Vec<PathSegment>, target: EffectTarget) -> Self {
        Self::new(EffectKind::Clip(path), target)
    }
}

/// A line of text already positioned by layout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bounds: Rect,
}

/// Replaced content and form controls
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Image { src: String },
    /// Snapshot of a canvas element, usually a data url
    Canvas { src: String },
    Svg { src: String },
    Iframe {
        tree: Box<StackingContext>,
        viewport: Size,
        #[serde(default)]
        background_color: Option<String>,
    },
    Checkbox { checked: bool },
    Radio { checked: bool },
    TextInput { value: String },
    TextArea { value: String },
    Select { value: String },
}

impl ContentKind {
    /// Form controls that paint their value as text
    pub fn text_value(&self) -> Option<&str> {
        match self {
            ContentKind::TextInput { value } | ContentKind::TextArea { value } | ContentKind::Select { value } => {
                Some(value)
            }
            _ => None,
        }
    }
}

/// One rendered box
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementPaint {
    pub id: NodeId,
    /// Structure tag assigned by the accessibility tree builder
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "visible")]
    pub visible: bool,
    #[serde(default)]
    pub styles: Styles,
    pub geometry: BoxGeometry,
    /// Effects from the page root down to this element, outermost first
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub text_runs: Vec<TextRun>,
    #[serde(default)]
    pub content: Option<ContentKind>,
    #[serde(default)]
    pub list_marker: Option<ListMarker>,
}

fn visible() -> bool {
    true
}

impl ElementPaint {
    pub fn new(id: NodeId, geometry: BoxGeometry) -> Self {
        Self {
            id,
            tag: None,
            visible: true,
            styles: Styles::default(),
            geometry,
            effects: Vec::new(),
            text_runs: Vec::new(),
            content: None,
            list_marker: None,
        }
    }

    /// Effects that apply to one painting phase, in application order
    pub fn effects_for(&self, target: EffectTarget) -> Vec<Effect> {
        self.effects
            .iter()
            .filter(|effect| effect.target.intersects(target))
            .cloned()
            .collect()
    }
}

/// An element that establishes a stacking context, with its descendants
/// sorted into painting-order buckets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackingContext {
    pub element: ElementPaint,
    /// Sorted ascending, most negative first
    #[serde(default)]
    pub negative_z_index: Vec<StackingContext>,
    #[serde(default)]
    pub non_inline_level: Vec<ElementPaint>,
    #[serde(default)]
    pub non_positioned_floats: Vec<StackingContext>,
    #[serde(default)]
    pub non_positioned_inline_level: Vec<StackingContext>,
    #[serde(default)]
    pub inline_level: Vec<ElementPaint>,
    #[serde(default)]
    pub zero_or_auto_z_index_or_transformed_or_opacity: Vec<StackingContext>,
    /// Sorted ascending
    #[serde(default)]
    pub positive_z_index: Vec<StackingContext>,
}

impl StackingContext {
    pub fn new(element: ElementPaint) -> Self {
        Self {
            element,
            negative_z_index: Vec::new(),
            non_inline_level: Vec::new(),
            non_positioned_floats: Vec::new(),
            non_positioned_inline_level: Vec::new(),
            inline_level: Vec::new(),
            zero_or_auto_z_index_or_transformed_or_opacity: Vec::new(),
            positive_z_index: Vec::new(),
        }
    }
}
