// Vector canvas abstraction
//
// The painter only ever talks to `dyn Canvas`. `DisplayList` records the
// calls for iframe pictures and tests; `skia::SkiaCanvas` issues them on a
// skia canvas (PDF page or raster surface).
pub mod font;
pub mod skia;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use kurbo::{Affine, BezPath, Point, Rect, Shape, Size, Stroke, Vec2};
use peniko::{Color, Extend, Fill, ImageQuality};

use crate::resource::RasterImageData;
use crate::tree::NodeId;
use font::Font;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

#[derive(Clone, Debug)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub stops: Vec<GradientStop>,
    pub extend: Extend,
    /// Local matrix of the shader
    pub transform: Affine,
}

#[derive(Clone, Debug)]
pub struct RadialGradient {
    pub center: Point,
    pub radius: f64,
    pub stops: Vec<GradientStop>,
    pub extend: Extend,
    pub transform: Affine,
}

/// Bitmap used as a paint source, mapped into user space by `transform`
#[derive(Clone, Debug)]
pub struct ImagePattern {
    pub image: Arc<RasterImageData>,
    pub extend: Extend,
    pub quality: ImageQuality,
    pub transform: Affine,
}

#[derive(Clone, Debug)]
pub enum PaintSource {
    Solid(Color),
    Linear(LinearGradient),
    Radial(RadialGradient),
    Image(ImagePattern),
}

#[derive(Clone, Debug)]
pub enum BrushStyle {
    Fill(Fill),
    Stroke(Stroke),
}

/// Paint source plus how to apply it. Built per draw call.
#[derive(Clone, Debug)]
pub struct Brush {
    pub source: PaintSource,
    pub style: BrushStyle,
    /// Gaussian blur sigma of the coverage mask
    pub blur: Option<f64>,
    pub anti_alias: bool,
}

impl Brush {
    pub fn fill(source: PaintSource) -> Self {
        Self {
            source,
            style: BrushStyle::Fill(Fill::NonZero),
            blur: None,
            anti_alias: true,
        }
    }

    pub fn stroke(source: PaintSource, stroke: Stroke) -> Self {
        Self {
            source,
            style: BrushStyle::Stroke(stroke),
            blur: None,
            anti_alias: true,
        }
    }

    pub fn solid(color: Color) -> Self {
        Self::fill(PaintSource::Solid(color))
    }

    pub fn with_blur(mut self, sigma: f64) -> Self {
        self.blur = (sigma > 0.0).then_some(sigma);
        self
    }

    pub fn color(&self) -> Option<Color> {
        match self.source {
            PaintSource::Solid(color) => Some(color),
            _ => None,
        }
    }
}

/// Backend the painter draws onto.
///
/// Calls are immediate: any native object a backend needs for a call is
/// created and released inside that call.
pub trait Canvas {
    /// Size of the drawing surface in user space
    fn size(&self) -> Size;
    fn save(&mut self);
    fn restore(&mut self);
    /// Number of saves not yet restored
    fn save_count(&self) -> usize;
    fn concat(&mut self, transform: Affine);
    fn clip_path(&mut self, path: &BezPath, anti_alias: bool);
    fn draw_path(&mut self, path: &BezPath, brush: &Brush);
    /// Draw a run of text with its alphabetic baseline starting at `origin`
    fn draw_text(&mut self, text: &str, origin: Point, font: &Font, brush: &Brush);
    fn draw_picture(&mut self, picture: &Arc<Picture>, transform: Affine);
    /// Open an accessibility structure marker for the content that follows
    fn begin_tag(&mut self, node: NodeId, tag: Option<&str>);
    fn end_tag(&mut self);

    fn translate(&mut self, offset: Vec2) {
        self.concat(Affine::translate(offset));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.concat(Affine::scale_non_uniform(sx, sy));
    }

    fn draw_rect(&mut self, rect: Rect, brush: &Brush) {
        self.draw_path(&rect.to_path(0.1), brush);
    }
}

/// Restores the canvas when dropped, whichever way the scope is left
pub struct SaveGuard<'c> {
    canvas: &'c mut dyn Canvas,
}

impl<'c> SaveGuard<'c> {
    pub fn new(canvas: &'c mut dyn Canvas) -> Self {
        canvas.save();
        Self { canvas }
    }
}

impl<'c> Deref for SaveGuard<'c> {
    type Target = dyn Canvas + 'c;

    fn deref(&self) -> &Self::Target {
        self.canvas
    }
}

impl<'c> DerefMut for SaveGuard<'c> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.canvas
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.canvas.restore();
    }
}

/// A recorded canvas call
#[derive(Clone, Debug)]
pub enum DrawOp {
    Save,
    Restore,
    Concat(Affine),
    Clip { path: BezPath, anti_alias: bool },
    Path { path: BezPath, brush: Brush },
    Text { text: String, origin: Point, font: Font, brush: Brush },
    Picture { picture: Arc<Picture>, transform: Affine },
    BeginTag { node: NodeId, tag: Option<String> },
    EndTag,
}

/// Finished recording, composited as one unit
#[derive(Clone, Debug)]
pub struct Picture {
    pub bounds: Rect,
    pub ops: Vec<DrawOp>,
}

impl Picture {
    /// Issue the recorded calls on another canvas, clipped to the bounds
    pub fn replay(&self, canvas: &mut dyn Canvas, transform: Affine) {
        let mut canvas = SaveGuard::new(canvas);
        canvas.concat(transform);
        canvas.clip_path(&self.bounds.to_path(0.1), false);
        for op in &self.ops {
            match op {
                DrawOp::Save => canvas.save(),
                DrawOp::Restore => canvas.restore(),
                DrawOp::Concat(affine) => canvas.concat(*affine),
                DrawOp::Clip { path, anti_alias } => canvas.clip_path(path, *anti_alias),
                DrawOp::Path { path, brush } => canvas.draw_path(path, brush),
                DrawOp::Text { text, origin, font, brush } => canvas.draw_text(text, *origin, font, brush),
                DrawOp::Picture { picture, transform } => canvas.draw_picture(picture, *transform),
                DrawOp::BeginTag { node, tag } => canvas.begin_tag(*node, tag.as_deref()),
                DrawOp::EndTag => canvas.end_tag(),
            }
        }
    }
}

/// Canvas that records every call
#[derive(Debug)]
pub struct DisplayList {
    size: Size,
    ops: Vec<DrawOp>,
    depth: usize,
}

impl DisplayList {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ops: Vec::new(),
            depth: 0,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn finish(self) -> Picture {
        Picture {
            bounds: self.size.to_rect(),
            ops: self.ops,
        }
    }
}

impl Canvas for DisplayList {
    fn size(&self) -> Size {
        self.size
    }

    fn save(&mut self) {
        self.depth += 1;
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.ops.push(DrawOp::Restore);
    }

    fn save_count(&self) -> usize {
        self.depth
    }

    fn concat(&mut self, transform: Affine) {
        self.ops.push(DrawOp::Concat(transform));
    }

    fn clip_path(&mut self, path: &BezPath, anti_alias: bool) {
        self.ops.push(DrawOp::Clip {
            path: path.clone(),
            anti_alias,
        });
    }

    fn draw_path(&mut self, path: &BezPath, brush: &Brush) {
        self.ops.push(DrawOp::Path {
            path: path.clone(),
            brush: brush.clone(),
        });
    }

    fn draw_text(&mut self, text: &str, origin: Point, font: &Font, brush: &Brush) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            origin,
            font: *font,
            brush: brush.clone(),
        });
    }

    fn draw_picture(&mut self, picture: &Arc<Picture>, transform: Affine) {
        self.ops.push(DrawOp::Picture {
            picture: Arc::clone(picture),
            transform,
        });
    }

    fn begin_tag(&mut self, node: NodeId, tag: Option<&str>) {
        self.ops.push(DrawOp::BeginTag {
            node,
            tag: tag.map(str::to_string),
        });
    }

    fn end_tag(&mut self) {
        self.ops.push(DrawOp::EndTag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_guard_restores_on_drop() {
        let mut list = DisplayList::new(Size::new(10.0, 10.0));
        {
            let mut canvas = SaveGuard::new(&mut list);
            canvas.translate(Vec2::new(1.0, 2.0));
            assert_eq!(canvas.save_count(), 1);
        }
        assert_eq!(list.save_count(), 0);
        assert!(matches!(list.ops().last(), Some(DrawOp::Restore)));
    }

    #[test]
    fn picture_replay_is_balanced() {
        let mut inner = DisplayList::new(Size::new(20.0, 20.0));
        inner.save();
        inner.draw_rect(Rect::new(0.0, 0.0, 5.0, 5.0), &Brush::solid(Color::BLACK));
        inner.restore();
        let picture = Arc::new(inner.finish());

        let mut outer = DisplayList::new(Size::new(100.0, 100.0));
        picture.replay(&mut outer, Affine::translate((10.0, 10.0)));
        assert_eq!(outer.save_count(), 0);
        let paths = outer
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::Path { .. }))
            .count();
        assert_eq!(paths, 1);
    }
}
