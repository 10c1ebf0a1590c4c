// Background color, image and gradient layers
use kurbo::{Affine, Point, Rect, Size, Vec2};
use peniko::{Extend, ImageQuality};
use tracing::{debug, warn};

use super::gradient::{calculate_radius, gradient_direction, process_color_stops};
use super::paint::{is_transparent, resolve_color_with_alpha};
use super::path::closed_path;
use crate::canvas::{Brush, Canvas, ImagePattern, LinearGradient, PaintSource, RadialGradient, SaveGuard};
use crate::resource::{Resource, ResourceCache};
use crate::tree::style::{
    BackgroundBox, BackgroundImage, BackgroundLayer, BackgroundRepeat, BackgroundSize, ColorStop, GradientAngle,
    LengthPercentage, RadialExtent, RadialShape, SizeComponent,
};
use crate::tree::{BoxGeometry, ElementPaint, PathSegment};

/// Natural dimensions of a background image, when it has them
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IntrinsicSize {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub ratio: Option<f64>,
}

impl IntrinsicSize {
    /// Gradients have no natural size
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_image(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ratio: (height > 0.0).then(|| width / height),
        }
    }
}

/// Where one background layer is painted
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundTile {
    /// Area to fill with the repeating tile
    pub path: Vec<PathSegment>,
    /// Origin of the first tile
    pub offset: Vec2,
    pub size: Size,
}

pub fn background_box_rect(geometry: &BoxGeometry, area: BackgroundBox) -> Rect {
    match area {
        BackgroundBox::BorderBox => geometry.border_rect,
        BackgroundBox::PaddingBox => geometry.padding_rect,
        BackgroundBox::ContentBox => geometry.content_rect,
    }
}

pub fn background_box_path(geometry: &BoxGeometry, area: BackgroundBox) -> &[PathSegment] {
    match area {
        BackgroundBox::BorderBox => &geometry.border_box,
        BackgroundBox::PaddingBox => &geometry.padding_box,
        BackgroundBox::ContentBox => &geometry.content_box,
    }
}

/// Rendered tile size for `background-size`
pub fn calculate_background_size(size: BackgroundSize, intrinsic: IntrinsicSize, bounds: Rect) -> Size {
    let (bw, bh) = (bounds.width(), bounds.height());

    let contain_or_cover = |cover: bool| -> Size {
        match intrinsic.ratio {
            Some(ratio) => {
                let target_ratio = bw / bh;
                if (target_ratio < ratio) != cover {
                    Size::new(bw, bw / ratio)
                } else {
                    Size::new(bh * ratio, bh)
                }
            }
            None => Size::new(bw, bh),
        }
    };

    let (first, second) = match size {
        BackgroundSize::Cover => return contain_or_cover(true),
        BackgroundSize::Contain => return contain_or_cover(false),
        BackgroundSize::Explicit(first, second) => (first, second),
    };

    match (first, second) {
        (SizeComponent::Length(w), SizeComponent::Length(h)) => Size::new(w.resolve(bw), h.resolve(bh)),
        (SizeComponent::Auto, SizeComponent::Auto) => match (intrinsic.width, intrinsic.height, intrinsic.ratio) {
            (Some(w), Some(h), _) => Size::new(w, h),
            (Some(w), None, Some(ratio)) => Size::new(w, w / ratio),
            (Some(w), None, None) => Size::new(w, bh),
            (None, Some(h), Some(ratio)) => Size::new(h * ratio, h),
            (None, Some(h), None) => Size::new(bw, h),
            (None, None, Some(_)) => contain_or_cover(false),
            (None, None, None) => Size::new(bw, bh),
        },
        (SizeComponent::Length(w), SizeComponent::Auto) => {
            let width = w.resolve(bw);
            let height = match (intrinsic.width, intrinsic.height, intrinsic.ratio) {
                (_, _, Some(ratio)) => width / ratio,
                (Some(iw), Some(ih), None) if iw > 0.0 => width / iw * ih,
                _ => bh,
            };
            Size::new(width, height)
        }
        (SizeComponent::Auto, SizeComponent::Length(h)) => {
            let height = h.resolve(bh);
            let width = match (intrinsic.width, intrinsic.height, intrinsic.ratio) {
                (_, _, Some(ratio)) => height * ratio,
                (Some(iw), Some(ih), None) if ih > 0.0 => height / ih * iw,
                _ => bw,
            };
            Size::new(width, height)
        }
    }
}

fn rounded(x: f64, y: f64) -> PathSegment {
    PathSegment::Vertex(Point::new(x.round(), y.round()))
}

/// Area covered by a layer for its `background-repeat` value
fn calculate_background_repeat_path(
    repeat: BackgroundRepeat,
    position: Vec2,
    size: Size,
    positioning_area: Rect,
    painting_area: Rect,
) -> Vec<PathSegment> {
    let (x, y) = (position.x, position.y);
    let area = positioning_area;
    match repeat {
        BackgroundRepeat::RepeatX => vec![
            rounded(area.x0, area.y0 + y),
            rounded(area.x1, area.y0 + y),
            rounded(area.x1, area.y0 + y + size.height),
            rounded(area.x0, area.y0 + y + size.height),
        ],
        BackgroundRepeat::RepeatY => vec![
            rounded(area.x0 + x, area.y0),
            rounded(area.x0 + x + size.width, area.y0),
            rounded(area.x0 + x + size.width, area.y1),
            rounded(area.x0 + x, area.y1),
        ],
        BackgroundRepeat::NoRepeat => vec![
            rounded(area.x0 + x, area.y0 + y),
            rounded(area.x0 + x + size.width, area.y0 + y),
            rounded(area.x0 + x + size.width, area.y0 + y + size.height),
            rounded(area.x0 + x, area.y0 + y + size.height),
        ],
        BackgroundRepeat::Repeat => vec![
            rounded(painting_area.x0, painting_area.y0),
            rounded(painting_area.x1, painting_area.y0),
            rounded(painting_area.x1, painting_area.y1),
            rounded(painting_area.x0, painting_area.y1),
        ],
    }
}

/// Fill area, first tile origin and tile size of one background layer
pub fn calculate_background_rendering(
    geometry: &BoxGeometry,
    layer: &BackgroundLayer,
    intrinsic: IntrinsicSize,
) -> BackgroundTile {
    let positioning_area = background_box_rect(geometry, layer.origin);
    let painting_area = background_box_rect(geometry, layer.clip);
    let size = calculate_background_size(layer.size, intrinsic, positioning_area);
    let position = Vec2::new(
        layer.position[0].resolve(positioning_area.width() - size.width),
        layer.position[1].resolve(positioning_area.height() - size.height),
    );
    let path = calculate_background_repeat_path(layer.repeat, position, size, positioning_area, painting_area);
    let offset = Vec2::new(
        (positioning_area.x0 + position.x).round(),
        (positioning_area.y0 + position.y).round(),
    );

    BackgroundTile { path, offset, size }
}

/// Paint the background color and every background layer, clipped to the
/// background painting area. Layers are painted last to first so the first
/// declared one ends up on top.
pub async fn render_background(
    canvas: &mut dyn Canvas,
    element: &ElementPaint,
    resources: &dyn ResourceCache,
    global_alpha: f32,
) {
    let styles = &element.styles;
    let painting_area = background_box_path(&element.geometry, styles.background_color_clip());

    let mut canvas = SaveGuard::new(canvas);
    canvas.clip_path(&closed_path(painting_area), true);

    if !is_transparent(&styles.background_color) {
        let color = resolve_color_with_alpha(&styles.background_color, global_alpha);
        canvas.draw_path(&closed_path(painting_area), &Brush::solid(color));
    }

    for layer in styles.background_layers.iter().rev() {
        match &layer.image {
            BackgroundImage::Url(url) => match resources.fetch(url).await {
                Ok(resource) => render_image_layer(&mut *canvas, &element.geometry, layer, &resource),
                Err(err) => warn!("Error loading background-image {}: {}", url, err),
            },
            BackgroundImage::LinearGradient { angle, stops } => {
                render_linear_gradient(&mut *canvas, &element.geometry, layer, *angle, stops, global_alpha)
            }
            BackgroundImage::RadialGradient { shape, extent, position, stops } => render_radial_gradient(
                &mut *canvas,
                &element.geometry,
                layer,
                RadialParams { shape: *shape, extent: *extent, position },
                stops,
                global_alpha,
            ),
        }
    }
}

fn render_image_layer(canvas: &mut dyn Canvas, geometry: &BoxGeometry, layer: &BackgroundLayer, resource: &Resource) {
    let (width, height) = resource.intrinsic_size();
    let tile = calculate_background_rendering(geometry, layer, IntrinsicSize::from_image(width, height));
    let (tile_width, tile_height) = (tile.size.width.round(), tile.size.height.round());
    if tile_width < 1.0 || tile_height < 1.0 {
        return;
    }

    let Some(image) = resource.to_raster(tile_width as u32, tile_height as u32) else {
        warn!("Could not prepare background tile of {}x{}", tile_width, tile_height);
        return;
    };

    let pattern = ImagePattern {
        image,
        extend: Extend::Repeat,
        quality: ImageQuality::High,
        transform: Affine::translate(tile.offset),
    };
    canvas.draw_path(&closed_path(&tile.path), &Brush::fill(PaintSource::Image(pattern)));
}

fn render_linear_gradient(
    canvas: &mut dyn Canvas,
    geometry: &BoxGeometry,
    layer: &BackgroundLayer,
    angle: GradientAngle,
    stops: &[ColorStop],
    global_alpha: f32,
) {
    let tile = calculate_background_rendering(geometry, layer, IntrinsicSize::none());
    if tile.size.width <= 0.0 || tile.size.height <= 0.0 || stops.is_empty() {
        return;
    }

    let line = gradient_direction(angle, tile.size.width, tile.size.height);
    let gradient = LinearGradient {
        start: line.start,
        end: line.end,
        stops: process_color_stops(stops, line.length, global_alpha),
        extend: Extend::Repeat,
        transform: Affine::translate(tile.offset),
    };
    canvas.draw_path(&closed_path(&tile.path), &Brush::fill(PaintSource::Linear(gradient)));
}

struct RadialParams<'a> {
    shape: RadialShape,
    extent: RadialExtent,
    position: &'a [LengthPercentage],
}

fn render_radial_gradient(
    canvas: &mut dyn Canvas,
    geometry: &BoxGeometry,
    layer: &BackgroundLayer,
    params: RadialParams<'_>,
    stops: &[ColorStop],
    global_alpha: f32,
) {
    let tile = calculate_background_rendering(geometry, layer, IntrinsicSize::none());
    let (left, top) = (tile.offset.x, tile.offset.y);
    let (width, height) = (tile.size.width, tile.size.height);
    if stops.is_empty() {
        return;
    }

    let position_x = params.position.first().copied().unwrap_or(LengthPercentage::FIFTY_PERCENT);
    let position_y = params.position.last().copied().unwrap_or(LengthPercentage::FIFTY_PERCENT);
    let x = position_x.resolve(width);
    let y = position_y.resolve(height);

    let (rx, ry) = calculate_radius(params.shape, params.extent, x, y, width, height);
    if rx <= 0.0 || ry <= 0.0 {
        debug!("Skipping radial gradient with radii {}x{}", rx, ry);
        return;
    }

    let gradient = RadialGradient {
        center: Point::new(left + x, top + y),
        radius: rx,
        stops: process_color_stops(stops, rx * 2.0, global_alpha),
        extend: Extend::Repeat,
        transform: Affine::IDENTITY,
    };
    let brush = Brush::fill(PaintSource::Radial(gradient));

    if rx == ry {
        canvas.draw_path(&closed_path(&tile.path), &brush);
        return;
    }

    // Draw a circular gradient in a y-scaled space to get the ellipse
    let bounds = geometry.border_rect;
    let mid = bounds.center();
    let f = ry / rx;
    let inv_f = 1.0 / f;

    let mut canvas = SaveGuard::new(canvas);
    canvas.translate(mid.to_vec2());
    canvas.scale(1.0, f);
    canvas.translate(-mid.to_vec2());
    let rect = Rect::from_origin_size(
        (left, inv_f * (top - mid.y) + mid.y),
        (width, height * inv_f),
    );
    canvas.draw_rect(rect, &brush);
}
