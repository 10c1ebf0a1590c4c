#![allow(dead_code)]

use std::sync::Arc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use kurbo::Rect;
use peniko::ImageAlphaType;
use stokes_print::canvas::font::{
    Font, FontCollection, FontDescriptor, FontMetrics, MISSING_GLYPH, TypefaceId, UnicodeBucket,
};
use stokes_print::canvas::{DisplayList, DrawOp};
use stokes_print::resource::{RasterImageData, Resource, ResourceCache, ResourceError};
use stokes_print::tree::{BoxGeometry, ElementPaint, NodeId, StackingContext, TextRun};

pub const LATIN: TypefaceId = TypefaceId(1);
pub const CJK: TypefaceId = TypefaceId(2);

/// Latin face with 8px advances and a CJK fallback face with 20px advances
pub struct FakeFonts;

impl FontCollection for FakeFonts {
    fn match_font(&self, descriptor: &FontDescriptor) -> Font {
        Font::new(LATIN, descriptor.size)
    }

    fn glyph_ids(&self, font: &Font, text: &str) -> Vec<u16> {
        text.chars()
            .map(|ch| match font.typeface {
                Some(LATIN) if ch.is_ascii() => ch as u16,
                Some(CJK) if !ch.is_ascii() => 4000,
                _ => MISSING_GLYPH,
            })
            .collect()
    }

    fn glyph_widths(&self, font: &Font, glyphs: &[u16]) -> Vec<f32> {
        let width = match font.typeface {
            Some(LATIN) => 8.0,
            Some(CJK) => 20.0,
            _ => 0.0,
        };
        vec![width; glyphs.len()]
    }

    fn metrics(&self, _font: &Font) -> FontMetrics {
        FontMetrics {
            ascent: 12.0,
            descent: 4.0,
            x_height: 8.0,
            underline_thickness: 1.0,
        }
    }

    fn fallback_typeface(&self, _grapheme: &str, bucket: UnicodeBucket, _descriptor: &FontDescriptor) -> Option<TypefaceId> {
        (bucket == UnicodeBucket::Cjk).then_some(CJK)
    }
}

/// Serves a 1x1 opaque red pixel for every url except `missing.png`
pub struct RedPixels;

impl ResourceCache for RedPixels {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Resource, ResourceError>> {
        async move {
            if url == "missing.png" {
                return Err(ResourceError::PreviouslyFailed(url.to_string()));
            }
            let pixel = RasterImageData::new(1, 1, vec![255, 0, 0, 255], ImageAlphaType::Alpha);
            Ok(Resource::Image(Arc::new(pixel)))
        }
        .boxed_local()
    }
}

pub fn element(id: u64, rect: Rect) -> ElementPaint {
    ElementPaint::new(NodeId(id), BoxGeometry::from_rect(rect))
}

/// Element carrying a structure tag and one line of text
pub fn tagged(id: u64, tag: &str) -> ElementPaint {
    let rect = Rect::new(0.0, id as f64 * 20.0, 100.0, id as f64 * 20.0 + 20.0);
    let mut element = element(id, rect);
    element.tag = Some(tag.to_string());
    element.text_runs = vec![TextRun {
        text: tag.to_string(),
        bounds: rect,
    }];
    element
}

pub fn stack(element: ElementPaint) -> StackingContext {
    StackingContext::new(element)
}

pub fn tags(canvas: &DisplayList) -> Vec<String> {
    canvas
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::BeginTag { tag, .. } => tag.clone(),
            _ => None,
        })
        .collect()
}

/// Save/restore balance of a recording at its end
pub fn balance(ops: &[DrawOp]) -> i64 {
    ops.iter().fold(0, |depth, op| match op {
        DrawOp::Save => depth + 1,
        DrawOp::Restore => depth - 1,
        _ => depth,
    })
}
