// Replaced content, form controls and list markers
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape};
use peniko::{Extend, ImageQuality};
use tracing::{debug, warn};

use super::font::{compute_line_height, resolve_font};
use super::paint::{resolve_color, resolve_color_with_alpha};
use super::path::closed_path;
use super::text::render_text_with_letter_spacing;
use crate::canvas::font::FontCollection;
use crate::canvas::{Brush, Canvas, ImagePattern, PaintSource, SaveGuard};
use crate::resource::{Resource, ResourceCache};
use crate::tree::style::TextAlign;
use crate::tree::{BoxGeometry, ElementPaint, ListMarker, ListStyleType};

/// Fill color of checked checkboxes and radio buttons
const INPUT_COLOR: &str = "#2a2a2a";

/// Check mark polygon in units of the control size
const CHECK_MARK: [(f64, f64); 6] = [
    (0.39363, 0.79),
    (0.16, 0.5549),
    (0.27347, 0.44071),
    (0.39694, 0.5649),
    (0.72983, 0.23),
    (0.84, 0.34085),
];

/// Gap between a list-style-image and the list item
const MARKER_IMAGE_GAP: f64 = 10.0;

/// Pixels to sample from: bitmaps at their own size, SVGs at the box size
fn raster_for(resource: &Resource, target: Rect) -> Option<std::sync::Arc<crate::resource::RasterImageData>> {
    let (width, height) = match resource {
        Resource::Image(image) => (image.width, image.height),
        Resource::Svg(_) => (target.width().round() as u32, target.height().round() as u32),
    };
    resource.to_raster(width, height)
}

/// Fill `dest` with the whole of `resource`, scaled to fit
fn draw_image_into(canvas: &mut dyn Canvas, resource: &Resource, dest: Rect) {
    let Some(image) = raster_for(resource, dest) else {
        debug!("Skipping image of {}x{}", dest.width(), dest.height());
        return;
    };
    let transform = Affine::translate(dest.origin().to_vec2())
        * Affine::scale_non_uniform(
            dest.width() / image.width as f64,
            dest.height() / image.height as f64,
        );
    let pattern = ImagePattern {
        image,
        extend: Extend::Pad,
        quality: ImageQuality::High,
        transform,
    };
    canvas.draw_rect(dest, &Brush::fill(PaintSource::Image(pattern)));
}

/// Paint an image, canvas snapshot or SVG into the content box, clipped to
/// the padding box
pub async fn render_replaced(canvas: &mut dyn Canvas, geometry: &BoxGeometry, src: &str, resources: &dyn ResourceCache) {
    let resource = match resources.fetch(src).await {
        Ok(resource) => resource,
        Err(err) => {
            warn!("Error loading image {}: {}", src, err);
            return;
        }
    };
    let (width, height) = resource.intrinsic_size();
    let dest = geometry.content_rect;
    if width <= 0.0 || height <= 0.0 || dest.width() < 1.0 || dest.height() < 1.0 {
        return;
    }

    let mut canvas = SaveGuard::new(canvas);
    canvas.clip_path(&closed_path(&geometry.padding_box), true);
    draw_image_into(&mut *canvas, &resource, dest);
}

fn check_mark_path(bounds: Rect) -> BezPath {
    let size = bounds.width().min(bounds.height());
    let mut path = BezPath::new();
    for (i, (x, y)) in CHECK_MARK.iter().enumerate() {
        let point = Point::new(bounds.x0 + size * x, bounds.y0 + size * y);
        if i == 0 {
            path.move_to(point);
        } else {
            path.line_to(point);
        }
    }
    path.close_path();
    path
}

/// Check mark of a checked checkbox
pub fn render_checkbox(canvas: &mut dyn Canvas, geometry: &BoxGeometry, checked: bool, global_alpha: f32) {
    if !checked {
        return;
    }
    let brush = Brush::solid(resolve_color_with_alpha(INPUT_COLOR, global_alpha));
    canvas.draw_path(&check_mark_path(geometry.border_rect), &brush);
}

/// Dot of a checked radio button
pub fn render_radio(canvas: &mut dyn Canvas, geometry: &BoxGeometry, checked: bool, global_alpha: f32) {
    if !checked {
        return;
    }
    let bounds = geometry.border_rect;
    let size = bounds.width().min(bounds.height());
    let dot = Circle::new((bounds.x0 + size / 2.0, bounds.y0 + size / 2.0), size / 4.0);
    let brush = Brush::solid(resolve_color_with_alpha(INPUT_COLOR, global_alpha));
    canvas.draw_path(&dot.to_path(0.1), &brush);
}

/// Value of a text input, textarea or select, aligned inside the content box
pub fn render_input_value(
    canvas: &mut dyn Canvas,
    fonts: &dyn FontCollection,
    element: &ElementPaint,
    value: &str,
    global_alpha: f32,
) {
    if value.is_empty() {
        return;
    }
    let styles = &element.styles;
    let bounds = element.geometry.content_rect;
    let resolved = resolve_font(fonts, &styles.font);
    let width = fonts.measure(&resolved.font, value);
    let x = match styles.text_align {
        TextAlign::Left => bounds.x0,
        TextAlign::Center => bounds.x0 + (bounds.width() - width) / 2.0,
        TextAlign::Right => bounds.x1 - width,
    };

    let mut canvas = SaveGuard::new(canvas);
    canvas.clip_path(&closed_path(&element.geometry.content_box), true);
    let brush = Brush::solid(resolve_color_with_alpha(&styles.color, global_alpha));
    render_text_with_letter_spacing(
        &mut *canvas,
        fonts,
        value,
        Point::new(x, bounds.y0 + resolved.baseline),
        styles.letter_spacing,
        &brush,
        &resolved.font,
        &resolved.descriptor,
    );
}

/// Paint a list item marker to the left of the element.
///
/// A `list-style-image` replaces the text marker; if it fails to load the
/// marker is left out.
pub async fn render_list_marker(
    canvas: &mut dyn Canvas,
    fonts: &dyn FontCollection,
    resources: &dyn ResourceCache,
    element: &ElementPaint,
    marker: &ListMarker,
    global_alpha: f32,
) {
    let bounds = element.geometry.border_rect;

    if let Some(url) = &marker.image {
        match resources.fetch(url).await {
            Ok(resource) => {
                let (width, height) = resource.intrinsic_size();
                let dest = Rect::from_origin_size((bounds.x0 - (width + MARKER_IMAGE_GAP), bounds.y0), (width, height));
                draw_image_into(canvas, &resource, dest);
            }
            Err(err) => warn!("Error loading list-style-image {}: {}", url, err),
        }
        return;
    }

    if marker.style_type == ListStyleType::None {
        return;
    }
    let text = marker.text();
    if text.is_empty() {
        return;
    }

    let styles = &element.styles;
    let resolved = resolve_font(fonts, &styles.font);
    let padding_top = element.geometry.content_rect.y0 - element.geometry.padding_rect.y0;
    // Marker is vertically centered on this line, right-aligned to the box edge
    let middle = bounds.y0 + padding_top + compute_line_height(styles) / 2.0 + 2.0;
    let baseline = middle + (resolved.metrics.ascent - resolved.metrics.descent) / 2.0;
    let width = fonts.measure(&resolved.font, &text);

    let color = resolve_color(&styles.color).multiply_alpha(global_alpha);
    render_text_with_letter_spacing(
        canvas,
        fonts,
        &text,
        Point::new(bounds.x0 - width, baseline),
        styles.letter_spacing,
        &Brush::solid(color),
        &resolved.font,
        &resolved.descriptor,
    );
}
