// Border painting: solid, double, dashed and dotted sides
use kurbo::{Cap, Stroke};
use tracing::trace;

use super::paint::{make_brush, resolve_color_with_alpha, stroke_brush};
use super::path::{closed_path, format_path};
use crate::canvas::{BrushStyle, Canvas, SaveGuard};
use crate::tree::style::{BorderSide, BorderStyle};
use crate::tree::{BoxGeometry, Side};

/// Extra stroke width so dashes still cover the trapezoid at mitred corners
const DASHED_STROKE_OVERDRAW: f64 = 1.1;

/// Dash pattern chosen for a side
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashPattern {
    pub dash: f64,
    pub space: f64,
    /// False when the side is too short to dash and is stroked solid
    pub use_dash: bool,
}

/// Dash and gap lengths for a dashed or dotted side of `length` pixels.
///
/// Dashed sides stretch the gaps so that the side starts and ends on a
/// full dash.
pub fn balance_dashes(style: BorderStyle, width: f64, length: f64) -> DashPattern {
    let (mut dash, mut space) = match style {
        BorderStyle::Dotted => (width, width),
        _ => (width * 2.0, width),
    };
    let mut use_dash = true;

    if style == BorderStyle::Dashed {
        if length <= dash * 2.0 {
            use_dash = false;
        } else if length <= dash * 2.0 + space {
            let multiplier = length / (dash * 2.0 + space);
            dash *= multiplier;
            space *= multiplier;
        } else {
            let number_of_dashes = ((length + space) / (dash + space)).floor();
            let min_space = (length - number_of_dashes * dash) / (number_of_dashes - 1.0);
            let max_space = (length - (number_of_dashes + 1.0) * dash) / number_of_dashes;
            space = if max_space <= 0.0 || (space - min_space).abs() <= (space - max_space).abs() {
                min_space
            } else {
                max_space
            };
        }
    }

    DashPattern { dash, space, use_dash }
}

/// Paint all four border sides of a box
pub fn render_borders(canvas: &mut dyn Canvas, geometry: &BoxGeometry, borders: &[BorderSide; 4], global_alpha: f32) {
    for side in Side::ALL {
        let border = &borders[side as usize];
        if border.style == BorderStyle::None || border.width <= 0.0 {
            continue;
        }
        let color = resolve_color_with_alpha(&border.color, global_alpha);
        if color.components[3] <= 0.0 {
            continue;
        }

        trace!("border {:?} {:?} {}px", side, border.style, border.width);
        match border.style {
            BorderStyle::Double if border.width >= 3.0 => {
                let brush = make_brush(color, BrushStyle::Fill(peniko::Fill::NonZero));
                let sides = geometry.side(side);
                canvas.draw_path(&closed_path(&sides.double_outer), &brush);
                canvas.draw_path(&closed_path(&sides.double_inner), &brush);
            }
            BorderStyle::Dashed | BorderStyle::Dotted => {
                render_dashed_dotted_border(canvas, geometry, side, border, color);
            }
            _ => {
                let brush = make_brush(color, BrushStyle::Fill(peniko::Fill::NonZero));
                canvas.draw_path(&closed_path(&geometry.side(side).trapezoid), &brush);
            }
        }
    }
}

fn render_dashed_dotted_border(
    canvas: &mut dyn Canvas,
    geometry: &BoxGeometry,
    side: Side,
    border: &BorderSide,
    color: peniko::Color,
) {
    let sides = geometry.side(side);
    let box_paths = &sides.trapezoid;
    if box_paths.len() < 2 {
        return;
    }

    let mut canvas = SaveGuard::new(canvas);
    if border.style == BorderStyle::Dashed {
        canvas.clip_path(&closed_path(box_paths), true);
    }

    let start = box_paths[0].start();
    let end = box_paths[1].end();
    let length = if side.is_horizontal() {
        (start.x - end.x).abs()
    } else {
        (start.y - end.y).abs()
    };

    let pattern = balance_dashes(border.style, border.width, length);
    let (path, stroke) = if border.style == BorderStyle::Dotted {
        let stroke = Stroke::new(border.width)
            .with_caps(Cap::Round)
            .with_dashes(0.0, [0.0, pattern.dash + pattern.space]);
        (format_path(&sides.centerline), stroke)
    } else {
        let mut stroke = Stroke::new(border.width * 2.0 + DASHED_STROKE_OVERDRAW);
        if pattern.use_dash {
            stroke = stroke.with_dashes(0.0, [pattern.dash, pattern.space]);
        }
        (format_path(&box_paths[..2]), stroke)
    };

    canvas.draw_path(&path, &stroke_brush(color, stroke));
}
