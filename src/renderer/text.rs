// Text rendering: letter spacing, per-grapheme font fallback, decorations
// and text shadows
use kurbo::{Join, Point, Rect, Stroke};
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use super::font::{ResolvedFont, resolve_font};
use super::paint::{resolve_color_with_alpha, stroke_brush};
use crate::canvas::font::{Font, FontCollection, FontDescriptor, MISSING_GLYPH, UnicodeBucket};
use crate::canvas::{Brush, Canvas};
use crate::tree::style::{PaintOrderLayer, Styles, TextDecorationLine};
use crate::tree::TextRun;

/// Draw `text` with its baseline at `origin`, returning the advance.
///
/// Without letter spacing and with full glyph coverage the text is drawn as
/// one run. Otherwise every grapheme cluster is drawn on its own, using a
/// fallback typeface for clusters the font cannot draw.
pub fn render_text_with_letter_spacing(
    canvas: &mut dyn Canvas,
    fonts: &dyn FontCollection,
    text: &str,
    origin: Point,
    letter_spacing: f64,
    brush: &Brush,
    font: &Font,
    descriptor: &FontDescriptor,
) -> f64 {
    if letter_spacing == 0.0 && !fonts.has_missing_glyphs(font, text) {
        canvas.draw_text(text, origin, font, brush);
        return fonts.measure(font, text);
    }

    let mut x = origin.x;
    for grapheme in text.graphemes(true) {
        let glyphs = fonts.glyph_ids(font, grapheme);
        let covered = !font.is_empty() && !glyphs.contains(&MISSING_GLYPH);

        // Temporary fallback font, dropped at the end of this iteration
        let fallback;
        let resolved = if covered {
            font
        } else {
            let bucket = UnicodeBucket::classify(grapheme);
            fallback = match fonts.fallback_typeface(grapheme, bucket, descriptor) {
                Some(typeface) => Font::new(typeface, font.size),
                None => {
                    trace!("no fallback for {:?} ({:?})", grapheme, bucket);
                    Font::empty(font.size)
                }
            };
            &fallback
        };

        if !resolved.is_empty() {
            canvas.draw_text(grapheme, Point::new(x, origin.y), resolved, brush);
        }
        let width = if resolved.is_empty() {
            0.0
        } else {
            fonts.measure(resolved, grapheme)
        };
        x += width + letter_spacing;
    }
    x - origin.x
}

/// Paint the text runs of an element following its `paint-order`
pub fn render_text_runs(
    canvas: &mut dyn Canvas,
    fonts: &dyn FontCollection,
    runs: &[TextRun],
    styles: &Styles,
    global_alpha: f32,
) {
    if runs.is_empty() {
        return;
    }
    let resolved = resolve_font(fonts, &styles.font);

    for run in runs {
        for layer in &styles.paint_order {
            match layer {
                PaintOrderLayer::Fill => render_fill_pass(canvas, fonts, run, styles, &resolved, global_alpha),
                PaintOrderLayer::Stroke => render_stroke_pass(canvas, fonts, run, styles, &resolved, global_alpha),
                PaintOrderLayer::Markers => {}
            }
        }
    }
}

fn render_fill_pass(
    canvas: &mut dyn Canvas,
    fonts: &dyn FontCollection,
    run: &TextRun,
    styles: &Styles,
    resolved: &ResolvedFont,
    global_alpha: f32,
) {
    let origin = Point::new(run.bounds.x0, run.bounds.y0 + resolved.baseline);

    if !run.text.trim().is_empty() {
        for shadow in styles.text_shadows.iter().rev() {
            let color = resolve_color_with_alpha(&shadow.color, global_alpha);
            if color.components[3] <= 0.0 {
                continue;
            }
            let brush = Brush::solid(color).with_blur(shadow.blur / 2.0);
            let shadow_origin = Point::new(origin.x + shadow.offset_x, origin.y + shadow.offset_y);
            render_text_with_letter_spacing(
                canvas,
                fonts,
                &run.text,
                shadow_origin,
                styles.letter_spacing,
                &brush,
                &resolved.font,
                &resolved.descriptor,
            );
        }
    }

    let brush = Brush::solid(resolve_color_with_alpha(&styles.color, global_alpha));
    render_text_with_letter_spacing(
        canvas,
        fonts,
        &run.text,
        origin,
        styles.letter_spacing,
        &brush,
        &resolved.font,
        &resolved.descriptor,
    );

    render_text_decorations(canvas, run.bounds, styles, resolved, global_alpha);
}

fn render_stroke_pass(
    canvas: &mut dyn Canvas,
    fonts: &dyn FontCollection,
    run: &TextRun,
    styles: &Styles,
    resolved: &ResolvedFont,
    global_alpha: f32,
) {
    if styles.webkit_text_stroke_width <= 0.0 || run.text.trim().is_empty() {
        return;
    }
    let color = resolve_color_with_alpha(&styles.webkit_text_stroke_color, global_alpha);
    let stroke = Stroke::new(styles.webkit_text_stroke_width).with_join(Join::Miter);
    let origin = Point::new(run.bounds.x0, run.bounds.y0 + resolved.baseline);
    render_text_with_letter_spacing(
        canvas,
        fonts,
        &run.text,
        origin,
        styles.letter_spacing,
        &stroke_brush(color, stroke),
        &resolved.font,
        &resolved.descriptor,
    );
}

/// Rectangles for underline, overline and line-through across a run
pub fn decoration_rects(bounds: Rect, lines: TextDecorationLine, resolved: &ResolvedFont) -> Vec<Rect> {
    let thickness = resolved.metrics.underline_thickness.max(1.0);
    let mut rects = Vec::new();
    let mut push = |top: f64| {
        let rect = Rect::new(bounds.x0, top, bounds.x1, top + thickness);
        if rect.width() > 0.0 && rect.height() > 0.0 {
            rects.push(rect);
        }
    };

    if lines.contains(TextDecorationLine::UNDERLINE) {
        push((bounds.y0 + resolved.baseline).round());
    }
    if lines.contains(TextDecorationLine::OVERLINE) {
        push(bounds.y0.round());
    }
    if lines.contains(TextDecorationLine::LINE_THROUGH) {
        push((bounds.y0 + resolved.middle).ceil());
    }
    rects
}

fn render_text_decorations(
    canvas: &mut dyn Canvas,
    bounds: Rect,
    styles: &Styles,
    resolved: &ResolvedFont,
    global_alpha: f32,
) {
    if styles.text_decoration_line.is_empty() {
        return;
    }
    let color = styles.text_decoration_color.as_deref().unwrap_or(&styles.color);
    let brush = Brush::solid(resolve_color_with_alpha(color, global_alpha));
    for rect in decoration_rects(bounds, styles.text_decoration_line, resolved) {
        canvas.draw_rect(rect, &brush);
    }
}
