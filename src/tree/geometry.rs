// Box outlines and per-side border geometry
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// One edge of an outline: a straight vertex or a cubic bezier curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathSegment {
    Vertex(Point),
    Bezier {
        start: Point,
        start_control: Point,
        end_control: Point,
        end: Point,
    },
}

impl PathSegment {
    pub fn start(&self) -> Point {
        match self {
            PathSegment::Vertex(point) => *point,
            PathSegment::Bezier { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            PathSegment::Vertex(point) => *point,
            PathSegment::Bezier { end, .. } => *end,
        }
    }

    /// Move every point of the segment by `delta`
    pub fn translate(&self, delta: Vec2) -> Self {
        match *self {
            PathSegment::Vertex(point) => PathSegment::Vertex(point + delta),
            PathSegment::Bezier { start, start_control, end_control, end } => PathSegment::Bezier {
                start: start + delta,
                start_control: start_control + delta,
                end_control: end_control + delta,
                end: end + delta,
            },
        }
    }

    /// Same curve walked in the opposite direction
    pub fn reverse(&self) -> Self {
        match *self {
            PathSegment::Vertex(point) => PathSegment::Vertex(point),
            PathSegment::Bezier { start, start_control, end_control, end } => PathSegment::Bezier {
                start: end,
                start_control: end_control,
                end_control: start_control,
                end: start,
            },
        }
    }
}

/// Index of a box side, in CSS order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Top = 0,
    Right = 1,
    Bottom = 2,
    Left = 3,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }
}

/// Outlines used to paint one border side.
///
/// `trapezoid` always starts with the two outer-edge segments (outer start,
/// outer end) followed by the two inner-edge segments, so the first two
/// segments describe the side's outer edge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SideGeometry {
    pub trapezoid: Vec<PathSegment>,
    /// Stroke line through the middle of the border width
    pub centerline: Vec<PathSegment>,
    pub double_outer: Vec<PathSegment>,
    pub double_inner: Vec<PathSegment>,
}

/// Border, padding and content outlines of a box, one segment per corner.
///
/// When deserialized without outlines the box gets square corners built
/// from its rectangles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBoxGeometry")]
pub struct BoxGeometry {
    pub border_rect: Rect,
    pub padding_rect: Rect,
    pub content_rect: Rect,
    pub border_box: Vec<PathSegment>,
    pub padding_box: Vec<PathSegment>,
    pub content_box: Vec<PathSegment>,
    pub sides: [SideGeometry; 4],
}

impl BoxGeometry {
    /// Build square-cornered geometry from the three box rectangles.
    pub fn from_rects(border_rect: Rect, padding_rect: Rect, content_rect: Rect) -> Self {
        let widths = [
            padding_rect.y0 - border_rect.y0,
            border_rect.x1 - padding_rect.x1,
            border_rect.y1 - padding_rect.y1,
            padding_rect.x0 - border_rect.x0,
        ];

        // Corners of a rectangle inset by a fraction of each border width
        let inset = |fraction: f64| -> [Point; 4] {
            let r = Rect::new(
                border_rect.x0 + widths[3] * fraction,
                border_rect.y0 + widths[0] * fraction,
                border_rect.x1 - widths[1] * fraction,
                border_rect.y1 - widths[2] * fraction,
            );
            corners(r)
        };

        let outer = corners(border_rect);
        let inner = corners(padding_rect);
        let stroke = inset(0.5);
        let double_outer = inset(1.0 / 3.0);
        let double_inner = inset(2.0 / 3.0);

        let sides = Side::ALL.map(|side| {
            let a = side as usize;
            let b = (a + 1) % 4;
            SideGeometry {
                trapezoid: quad(outer[a], outer[b], inner[b], inner[a]),
                centerline: vec![PathSegment::Vertex(stroke[a]), PathSegment::Vertex(stroke[b])],
                double_outer: quad(outer[a], outer[b], double_outer[b], double_outer[a]),
                double_inner: quad(double_inner[a], double_inner[b], inner[b], inner[a]),
            }
        });

        Self {
            border_rect,
            padding_rect,
            content_rect,
            border_box: vertices(outer),
            padding_box: vertices(inner),
            content_box: vertices(corners(content_rect)),
            sides,
        }
    }

    /// Geometry for a box without borders or padding
    pub fn from_rect(rect: Rect) -> Self {
        Self::from_rects(rect, rect, rect)
    }

    pub fn side(&self, side: Side) -> &SideGeometry {
        &self.sides[side as usize]
    }
}

#[derive(Deserialize)]
struct RawBoxGeometry {
    border_rect: Rect,
    padding_rect: Rect,
    content_rect: Rect,
    #[serde(default)]
    border_box: Vec<PathSegment>,
    #[serde(default)]
    padding_box: Vec<PathSegment>,
    #[serde(default)]
    content_box: Vec<PathSegment>,
    #[serde(default)]
    sides: Option<[SideGeometry; 4]>,
}

impl From<RawBoxGeometry> for BoxGeometry {
    fn from(raw: RawBoxGeometry) -> Self {
        let square = BoxGeometry::from_rects(raw.border_rect, raw.padding_rect, raw.content_rect);
        let or_square = |given: Vec<PathSegment>, fallback: Vec<PathSegment>| {
            if given.is_empty() { fallback } else { given }
        };
        BoxGeometry {
            border_box: or_square(raw.border_box, square.border_box),
            padding_box: or_square(raw.padding_box, square.padding_box),
            content_box: or_square(raw.content_box, square.content_box),
            sides: raw.sides.unwrap_or(square.sides),
            ..square
        }
    }
}

/// Clockwise corners starting at the top left
fn corners(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}

fn vertices(points: [Point; 4]) -> Vec<PathSegment> {
    points.into_iter().map(PathSegment::Vertex).collect()
}

fn quad(a: Point, b: Point, c: Point, d: Point) -> Vec<PathSegment> {
    vertices([a, b, c, d])
}
