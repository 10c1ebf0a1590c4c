// Box shadows
use kurbo::Vec2;
use peniko::Color;

use super::paint::{resolve_color, resolve_color_with_alpha};
use super::path::{closed_path, mask_path, transform_path};
use crate::canvas::{Brush, Canvas, SaveGuard};
use crate::tree::BoxGeometry;
use crate::tree::style::BoxShadow;

/// Outset shadow shapes are drawn this far to the left and shifted back, so
/// only their blurred copy lands inside the clip
const MASK_OFFSET: f64 = 10000.0;

/// Paint box shadows, first declared on top
pub fn render_box_shadows(canvas: &mut dyn Canvas, geometry: &BoxGeometry, shadows: &[BoxShadow], global_alpha: f32) {
    for shadow in shadows.iter().rev() {
        render_box_shadow(canvas, geometry, shadow, global_alpha);
    }
}

fn render_box_shadow(canvas: &mut dyn Canvas, geometry: &BoxGeometry, shadow: &BoxShadow, global_alpha: f32) {
    let border_box = &geometry.border_box;
    let mask_offset = if shadow.inset { 0.0 } else { MASK_OFFSET };
    let direction = if shadow.inset { 1.0 } else { -1.0 };
    let spread = shadow.spread;
    let shadow_area = transform_path(
        border_box,
        -mask_offset + direction * spread,
        direction * spread,
        -2.0 * direction * spread,
        -2.0 * direction * spread,
    );

    let size = canvas.size();
    let mut canvas = SaveGuard::new(canvas);
    let fill_path = if shadow.inset {
        canvas.clip_path(&closed_path(border_box), true);
        mask_path(size, &shadow_area)
    } else {
        canvas.clip_path(&mask_path(size, border_box), true);
        closed_path(&shadow_area)
    };

    let color = if shadow.inset {
        resolve_color_with_alpha(&shadow.color, global_alpha)
    } else {
        outset_color(&shadow.color, global_alpha)
    };
    if color.components[3] <= 0.0 {
        return;
    }

    canvas.translate(Vec2::new(shadow.offset_x + mask_offset, shadow.offset_y));
    canvas.draw_path(&fill_path, &Brush::solid(color).with_blur(shadow.blur / 2.0));
}

/// Outset shadows paint in black at the current global alpha; a fully
/// transparent declared color still suppresses the shadow.
fn outset_color(declared: &str, global_alpha: f32) -> Color {
    if resolve_color(declared).components[3] <= 0.0 {
        return Color::TRANSPARENT;
    }
    Color::BLACK.multiply_alpha(global_alpha)
}
