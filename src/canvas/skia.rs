// Skia backend: canvas calls and font matching
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{Affine, BezPath, Cap, Join, PathEl, Point, Size};
use peniko::{Extend, Fill, ImageAlphaType, ImageQuality};
use skia_safe::font_style::{Slant, Weight, Width};
use skia_safe::{
    AlphaType, BlurStyle, ClipOp, Color, ColorType, CubicResampler, Data, FilterMode, FontMgr, ImageInfo,
    MaskFilter, Matrix, MipmapMode, Paint, PaintStyle, PathEffect, PathFillType, SamplingOptions, Shader, TextBlob,
    TileMode, Typeface, gradient_shader, images, paint, pdf,
};
use tracing::{trace, warn};

use super::font::{Font, FontCollection, FontDescriptor, FontMetrics, MISSING_GLYPH, TypefaceId, UnicodeBucket};
use super::{Brush, BrushStyle, Canvas, GradientStop, ImagePattern, PaintSource, Picture};
use crate::config::{FallbackFamilies, RenderConfig};
use crate::tree::style::FontSlant;
use crate::tree::{NodeId, StructureTree, TagNode};

pub fn to_skia_matrix(affine: Affine) -> Matrix {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Matrix::new_all(
        a as f32, c as f32, e as f32,
        b as f32, d as f32, f as f32,
        0.0, 0.0, 1.0,
    )
}

pub fn to_skia_color(color: peniko::Color) -> Color {
    let rgba = color.to_rgba8();
    Color::from_argb(rgba.a, rgba.r, rgba.g, rgba.b)
}

pub fn to_skia_path(path: &BezPath, fill: Fill) -> skia_safe::Path {
    let mut sk_path = skia_safe::Path::new();
    let pt = |p: Point| (p.x as f32, p.y as f32);
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                sk_path.move_to(pt(p));
            }
            PathEl::LineTo(p) => {
                sk_path.line_to(pt(p));
            }
            PathEl::QuadTo(p1, p2) => {
                sk_path.quad_to(pt(p1), pt(p2));
            }
            PathEl::CurveTo(p1, p2, p3) => {
                sk_path.cubic_to(pt(p1), pt(p2), pt(p3));
            }
            PathEl::ClosePath => {
                sk_path.close();
            }
        }
    }
    sk_path.set_fill_type(match fill {
        Fill::NonZero => PathFillType::Winding,
        Fill::EvenOdd => PathFillType::EvenOdd,
    });
    sk_path
}

fn to_tile_mode(extend: Extend) -> TileMode {
    match extend {
        Extend::Pad => TileMode::Clamp,
        Extend::Repeat => TileMode::Repeat,
        Extend::Reflect => TileMode::Mirror,
    }
}

fn to_sampling(quality: ImageQuality) -> SamplingOptions {
    match quality {
        ImageQuality::Low => SamplingOptions::new(FilterMode::Nearest, MipmapMode::None),
        ImageQuality::Medium => SamplingOptions::new(FilterMode::Linear, MipmapMode::Linear),
        ImageQuality::High => SamplingOptions::from(CubicResampler::catmull_rom()),
    }
}

fn split_stops(stops: &[GradientStop]) -> (Vec<Color>, Vec<f32>) {
    stops
        .iter()
        .map(|stop| (to_skia_color(stop.color), stop.offset))
        .unzip()
}

fn image_shader(pattern: &ImagePattern) -> Option<Shader> {
    let image = &pattern.image;
    let alpha_type = match image.alpha_type {
        ImageAlphaType::Alpha => AlphaType::Unpremul,
        ImageAlphaType::AlphaPremultiplied => AlphaType::Premul,
    };
    let info = ImageInfo::new(
        (image.width as i32, image.height as i32),
        ColorType::RGBA8888,
        alpha_type,
        None,
    );
    let data = Data::new_copy(image.data.data());
    let sk_image = images::raster_from_data(&info, data, image.width as usize * 4)?;
    let tile = to_tile_mode(pattern.extend);
    sk_image.to_shader(
        Some((tile, tile)),
        to_sampling(pattern.quality),
        Some(&to_skia_matrix(pattern.transform)),
    )
}

fn to_skia_shader(source: &PaintSource) -> Option<Shader> {
    match source {
        PaintSource::Solid(_) => None,
        PaintSource::Linear(gradient) => {
            let (colors, positions) = split_stops(&gradient.stops);
            gradient_shader::linear(
                (
                    (gradient.start.x as f32, gradient.start.y as f32),
                    (gradient.end.x as f32, gradient.end.y as f32),
                ),
                colors.as_slice(),
                Some(positions.as_slice()),
                to_tile_mode(gradient.extend),
                None,
                Some(&to_skia_matrix(gradient.transform)),
            )
        }
        PaintSource::Radial(gradient) => {
            let (colors, positions) = split_stops(&gradient.stops);
            gradient_shader::radial(
                (gradient.center.x as f32, gradient.center.y as f32),
                gradient.radius as f32,
                colors.as_slice(),
                Some(positions.as_slice()),
                to_tile_mode(gradient.extend),
                None,
                Some(&to_skia_matrix(gradient.transform)),
            )
        }
        PaintSource::Image(pattern) => image_shader(pattern),
    }
}

/// Build the skia paint for a brush. `None` when a shader could not be
/// created; the draw is skipped.
pub fn to_skia_paint(brush: &Brush) -> Option<Paint> {
    let mut paint = Paint::default();
    paint.set_anti_alias(brush.anti_alias);

    match &brush.source {
        PaintSource::Solid(color) => {
            paint.set_color(to_skia_color(*color));
        }
        source => {
            let shader = to_skia_shader(source)?;
            paint.set_shader(shader);
        }
    }

    if let BrushStyle::Stroke(stroke) = &brush.style {
        paint.set_style(PaintStyle::Stroke);
        paint.set_stroke_width(stroke.width as f32);
        paint.set_stroke_miter(stroke.miter_limit as f32);
        paint.set_stroke_cap(match stroke.start_cap {
            Cap::Butt => paint::Cap::Butt,
            Cap::Round => paint::Cap::Round,
            Cap::Square => paint::Cap::Square,
        });
        paint.set_stroke_join(match stroke.join {
            Join::Bevel => paint::Join::Bevel,
            Join::Miter => paint::Join::Miter,
            Join::Round => paint::Join::Round,
        });
        if !stroke.dash_pattern.is_empty() {
            let intervals: Vec<f32> = stroke.dash_pattern.iter().map(|d| *d as f32).collect();
            if let Some(effect) = PathEffect::dash(&intervals, stroke.dash_offset as f32) {
                paint.set_path_effect(effect);
            }
        }
    }

    if let Some(sigma) = brush.blur {
        match MaskFilter::blur(BlurStyle::Normal, sigma as f32, None) {
            Some(filter) => {
                paint.set_mask_filter(filter);
            }
            None => warn!("Could not create blur mask of sigma {}", sigma),
        }
    }

    Some(paint)
}

/// Typeface registry backed by the system font manager
pub struct SkiaFonts {
    font_mgr: FontMgr,
    default_family: String,
    fallback_families: FallbackFamilies,
    typefaces: RefCell<Vec<Typeface>>,
    // skia unique id -> registry id
    registered: RefCell<HashMap<u32, TypefaceId>>,
    matched: RefCell<HashMap<(Vec<String>, u16, FontSlant), Option<TypefaceId>>>,
    fallbacks: RefCell<HashMap<(String, u16, FontSlant), Option<TypefaceId>>>,
}

impl SkiaFonts {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            font_mgr: FontMgr::new(),
            default_family: config.default_font_family.clone(),
            fallback_families: config.fallback_families.clone(),
            typefaces: RefCell::new(Vec::new()),
            registered: RefCell::new(HashMap::new()),
            matched: RefCell::new(HashMap::new()),
            fallbacks: RefCell::new(HashMap::new()),
        }
    }

    fn register(&self, typeface: Typeface) -> TypefaceId {
        let unique_id = typeface.unique_id();
        if let Some(id) = self.registered.borrow().get(&unique_id) {
            return *id;
        }
        let mut typefaces = self.typefaces.borrow_mut();
        let id = TypefaceId(typefaces.len() as u32);
        typefaces.push(typeface);
        self.registered.borrow_mut().insert(unique_id, id);
        id
    }

    pub fn typeface(&self, id: TypefaceId) -> Option<Typeface> {
        self.typefaces.borrow().get(id.0 as usize).cloned()
    }

    /// Skia font for a registry font; `None` for the empty font
    pub fn skia_font(&self, font: &Font) -> Option<skia_safe::Font> {
        let typeface = self.typeface(font.typeface?)?;
        Some(skia_safe::Font::new(typeface, font.size))
    }

    fn skia_style(weight: u16, slant: FontSlant) -> skia_safe::FontStyle {
        let slant = match slant {
            FontSlant::Normal => Slant::Upright,
            FontSlant::Italic => Slant::Italic,
            FontSlant::Oblique => Slant::Oblique,
        };
        skia_safe::FontStyle::new(Weight::from(weight as i32), Width::NORMAL, slant)
    }

    fn lookup(&self, descriptor: &FontDescriptor) -> Option<TypefaceId> {
        let style = Self::skia_style(descriptor.weight, descriptor.slant);
        let typeface = descriptor
            .families
            .iter()
            .find_map(|family| self.font_mgr.match_family_style(family, style))
            .or_else(|| self.font_mgr.match_family_style(&self.default_family, style))
            .or_else(|| self.font_mgr.legacy_make_typeface(None, style))?;
        Some(self.register(typeface))
    }

    fn lookup_fallback(&self, grapheme: &str, bucket: UnicodeBucket, descriptor: &FontDescriptor) -> Option<TypefaceId> {
        let ch = grapheme.chars().next()?;
        let style = Self::skia_style(descriptor.weight, descriptor.slant);
        let covers = |typeface: &Typeface| typeface.unichar_to_glyph(ch as i32) != MISSING_GLYPH;

        let typeface = self
            .fallback_families
            .for_bucket(bucket)
            .iter()
            .filter_map(|family| self.font_mgr.match_family_style(family, style))
            .find(|typeface| covers(typeface))
            .or_else(|| {
                self.font_mgr
                    .match_family_style_character("", style, &[], ch as i32)
                    .filter(|typeface| covers(typeface))
            })?;
        Some(self.register(typeface))
    }
}

impl FontCollection for SkiaFonts {
    fn match_font(&self, descriptor: &FontDescriptor) -> Font {
        let key = (descriptor.families.clone(), descriptor.weight, descriptor.slant);
        let cached = self.matched.borrow().get(&key).copied();
        let typeface = match cached {
            Some(typeface) => typeface,
            None => {
                let typeface = self.lookup(descriptor);
                if typeface.is_none() {
                    warn!("No typeface for {:?}", descriptor.families);
                }
                self.matched.borrow_mut().insert(key, typeface);
                typeface
            }
        };
        Font {
            typeface,
            size: descriptor.size,
        }
    }

    fn glyph_ids(&self, font: &Font, text: &str) -> Vec<u16> {
        match self.skia_font(font) {
            Some(sk_font) => sk_font.str_to_glyphs_vec(text),
            None => vec![MISSING_GLYPH; text.chars().count()],
        }
    }

    fn glyph_widths(&self, font: &Font, glyphs: &[u16]) -> Vec<f32> {
        let mut widths = vec![0.0; glyphs.len()];
        if let Some(sk_font) = self.skia_font(font) {
            sk_font.get_widths(glyphs, &mut widths);
        }
        widths
    }

    fn metrics(&self, font: &Font) -> FontMetrics {
        let Some(sk_font) = self.skia_font(font) else {
            return FontMetrics::empty();
        };
        let (_, metrics) = sk_font.metrics();
        FontMetrics {
            ascent: -metrics.ascent as f64,
            descent: metrics.descent as f64,
            x_height: metrics.x_height as f64,
            underline_thickness: metrics.underline_thickness().unwrap_or(1.0) as f64,
        }
    }

    fn fallback_typeface(&self, grapheme: &str, bucket: UnicodeBucket, descriptor: &FontDescriptor) -> Option<TypefaceId> {
        let key = (grapheme.to_string(), descriptor.weight, descriptor.slant);
        if let Some(cached) = self.fallbacks.borrow().get(&key) {
            return *cached;
        }
        let typeface = self.lookup_fallback(grapheme, bucket, descriptor);
        trace!("fallback for {:?} ({:?}): {:?}", grapheme, bucket, typeface);
        self.fallbacks.borrow_mut().insert(key, typeface);
        typeface
    }
}

fn to_structure_element(node: &TagNode) -> pdf::StructureElementNode<'static> {
    let mut element = pdf::StructureElementNode::new(&node.tag);
    element.set_node_id(node.id);
    for child in &node.children {
        element.append_child(to_structure_element(child));
    }
    element
}

/// Root of the PDF structure element tree, `None` when nothing is tagged
pub fn to_structure_root(tree: &StructureTree) -> Option<pdf::StructureElementNode<'static>> {
    match tree.roots.as_slice() {
        [] => None,
        [only] if only.tag == "Document" => Some(to_structure_element(only)),
        roots => {
            let mut root = pdf::StructureElementNode::new("Document");
            for node in roots {
                root.append_child(to_structure_element(node));
            }
            Some(root)
        }
    }
}

/// Canvas issuing draw calls on a skia canvas (a PDF page in practice)
pub struct SkiaCanvas<'a> {
    canvas: &'a skia_safe::Canvas,
    fonts: &'a SkiaFonts,
    size: Size,
    depth: usize,
    tag_ids: Option<&'a HashMap<NodeId, i32>>,
    // marked-content id of every open tag
    open_tags: Vec<i32>,
    replaying: usize,
}

impl<'a> SkiaCanvas<'a> {
    pub fn new(canvas: &'a skia_safe::Canvas, fonts: &'a SkiaFonts, size: Size) -> Self {
        Self {
            canvas,
            fonts,
            size,
            depth: 0,
            tag_ids: None,
            open_tags: Vec::new(),
            replaying: 0,
        }
    }

    /// Mark drawing inside tagged elements with their structure ids
    pub fn with_tag_ids(mut self, tag_ids: Option<&'a HashMap<NodeId, i32>>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn current_node_id(&self) -> i32 {
        self.open_tags.last().copied().unwrap_or(pdf::node_id::NOTHING)
    }
}

impl Canvas for SkiaCanvas<'_> {
    fn size(&self) -> Size {
        self.size
    }

    fn save(&mut self) {
        self.canvas.save();
        self.depth += 1;
    }

    fn restore(&mut self) {
        if self.depth == 0 {
            warn!("Unbalanced canvas restore");
            return;
        }
        self.canvas.restore();
        self.depth -= 1;
    }

    fn save_count(&self) -> usize {
        self.depth
    }

    fn concat(&mut self, transform: Affine) {
        self.canvas.concat(&to_skia_matrix(transform));
    }

    fn clip_path(&mut self, path: &BezPath, anti_alias: bool) {
        self.canvas
            .clip_path(&to_skia_path(path, Fill::NonZero), ClipOp::Intersect, anti_alias);
    }

    fn draw_path(&mut self, path: &BezPath, brush: &Brush) {
        let Some(paint) = to_skia_paint(brush) else {
            trace!("skipping path without a paint");
            return;
        };
        let fill = match brush.style {
            BrushStyle::Fill(fill) => fill,
            BrushStyle::Stroke(_) => Fill::NonZero,
        };
        self.canvas.draw_path(&to_skia_path(path, fill), &paint);
    }

    fn draw_text(&mut self, text: &str, origin: Point, font: &Font, brush: &Brush) {
        let Some(sk_font) = self.fonts.skia_font(font) else {
            return;
        };
        let Some(paint) = to_skia_paint(brush) else {
            return;
        };
        if let Some(blob) = TextBlob::from_str(text, &sk_font) {
            self.canvas
                .draw_text_blob(&blob, (origin.x as f32, origin.y as f32), &paint);
        }
    }

    fn draw_picture(&mut self, picture: &Arc<Picture>, transform: Affine) {
        // tags inside a recorded picture belong to another document
        self.replaying += 1;
        picture.replay(self, transform);
        self.replaying -= 1;
    }

    fn begin_tag(&mut self, node: NodeId, tag: Option<&str>) {
        let parent = self.current_node_id();
        let id = match (self.tag_ids, tag) {
            (Some(ids), Some(_)) if self.replaying == 0 => ids.get(&node).copied().unwrap_or(parent),
            _ => parent,
        };
        trace!("begin tag {:?} {:?} as {}", node, tag, id);
        pdf::set_node_id(self.canvas, id);
        self.open_tags.push(id);
    }

    fn end_tag(&mut self) {
        if self.open_tags.pop().is_none() {
            warn!("Unbalanced end tag");
            return;
        }
        pdf::set_node_id(self.canvas, self.current_node_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Stroke;

    #[test]
    fn matrix_maps_points_like_affine() {
        let affine = Affine::translate((10.0, 5.0)) * Affine::scale_non_uniform(2.0, 3.0);
        let mapped = to_skia_matrix(affine).map_point((1.0, 1.0));
        assert_eq!((mapped.x, mapped.y), (12.0, 8.0));
    }

    #[test]
    fn stroke_brush_sets_dash_and_width() {
        let stroke = Stroke::new(3.0).with_dashes(0.0, [4.0, 2.0]);
        let brush = Brush::stroke(PaintSource::Solid(peniko::Color::BLACK), stroke);
        let paint = to_skia_paint(&brush).unwrap();
        assert_eq!(paint.style(), PaintStyle::Stroke);
        assert_eq!(paint.stroke_width(), 3.0);
        assert!(paint.path_effect().is_some());
    }

    #[test]
    fn repeated_matches_hit_the_cache() {
        let fonts = SkiaFonts::new(&RenderConfig::default());
        let descriptor = FontDescriptor {
            families: vec!["serif".to_string()],
            weight: 700,
            slant: FontSlant::Italic,
            size: 12.0,
        };
        let first = fonts.match_font(&descriptor);
        let second = fonts.match_font(&descriptor);
        assert_eq!(first, second);
        assert_eq!(fonts.matched.borrow().len(), 1);
    }

    #[test]
    fn tags_map_to_structure_ids() {
        let mut surface = skia_safe::surfaces::raster_n32_premul((20, 20)).unwrap();
        let fonts = SkiaFonts::new(&RenderConfig::default());
        let ids = HashMap::from([(NodeId(7), 3), (NodeId(8), 4)]);
        let mut canvas = SkiaCanvas::new(surface.canvas(), &fonts, Size::new(20.0, 20.0)).with_tag_ids(Some(&ids));

        canvas.begin_tag(NodeId(7), Some("P"));
        assert_eq!(canvas.current_node_id(), 3);
        // untagged content stays with its tagged ancestor
        canvas.begin_tag(NodeId(9), None);
        assert_eq!(canvas.current_node_id(), 3);
        canvas.end_tag();
        canvas.begin_tag(NodeId(8), Some("Span"));
        assert_eq!(canvas.current_node_id(), 4);
        canvas.end_tag();
        canvas.end_tag();
        assert_eq!(canvas.current_node_id(), pdf::node_id::NOTHING);
    }

    #[test]
    fn recorded_tags_inherit_the_enclosing_id() {
        use crate::canvas::DisplayList;

        let mut recording = DisplayList::new(Size::new(10.0, 10.0));
        recording.begin_tag(NodeId(8), Some("P"));
        recording.end_tag();
        let picture = Arc::new(recording.finish());

        let mut surface = skia_safe::surfaces::raster_n32_premul((20, 20)).unwrap();
        let fonts = SkiaFonts::new(&RenderConfig::default());
        let ids = HashMap::from([(NodeId(7), 3), (NodeId(8), 4)]);
        let mut canvas = SkiaCanvas::new(surface.canvas(), &fonts, Size::new(20.0, 20.0)).with_tag_ids(Some(&ids));
        canvas.begin_tag(NodeId(7), Some("Figure"));
        canvas.draw_picture(&picture, Affine::IDENTITY);
        assert_eq!(canvas.current_node_id(), 3);
        canvas.end_tag();
        assert_eq!(canvas.save_count(), 0);
    }

    #[test]
    fn single_document_root_is_not_wrapped() {
        use crate::tree::{BoxGeometry, ElementPaint, StackingContext};

        let tagged = |id: u64, tag: &str| {
            let mut element = ElementPaint::new(NodeId(id), BoxGeometry::from_rect(kurbo::Rect::new(0.0, 0.0, 10.0, 10.0)));
            element.tag = Some(tag.to_string());
            element
        };
        let mut page = StackingContext::new(tagged(1, "Document"));
        page.non_inline_level.push(tagged(2, "P"));

        let root = to_structure_root(&StructureTree::build(&[page])).unwrap();
        assert_eq!(root.type_string(), "Document");
        assert_eq!(root.node_id(), 1);
        assert_eq!(root.child_vector().len(), 1);

        let pages = [StackingContext::new(tagged(1, "P")), StackingContext::new(tagged(1, "P"))];
        let wrapped = to_structure_root(&StructureTree::build(&pages)).unwrap();
        assert_eq!(wrapped.type_string(), "Document");
        assert_eq!(wrapped.child_vector().len(), 2);

        assert!(to_structure_root(&StructureTree::default()).is_none());
    }

    #[test]
    fn blurred_brush_has_mask_filter() {
        let brush = Brush::solid(peniko::Color::BLACK).with_blur(2.0);
        let paint = to_skia_paint(&brush).unwrap();
        assert!(paint.mask_filter().is_some());
    }
}
