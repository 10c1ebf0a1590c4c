mod common;

use common::*;
use futures::executor::block_on;
use kurbo::{Affine, Point, Rect, Size};
use stokes_print::PageRenderer;
use stokes_print::canvas::{DisplayList, DrawOp, PaintSource};
use stokes_print::tree::{ContentKind, Effect, EffectTarget, PathSegment};

fn render(root: &stokes_print::tree::StackingContext, size: Size) -> DisplayList {
    let mut canvas = DisplayList::new(size);
    {
        let mut renderer = PageRenderer::new(&mut canvas, &FakeFonts, &RedPixels);
        block_on(renderer.render(root));
        assert_eq!(renderer.effect_depth(), 0);
    }
    canvas
}

#[test]
fn buckets_paint_in_css_order() {
    let mut root = stack(tagged(1, "root"));
    root.positive_z_index.push(stack(tagged(9, "positive")));
    root.zero_or_auto_z_index_or_transformed_or_opacity
        .push(stack(tagged(8, "positioned")));
    root.inline_level.push(tagged(7, "inline"));
    root.non_positioned_inline_level.push(stack(tagged(6, "inline-block")));
    root.non_positioned_floats.push(stack(tagged(5, "float")));
    root.non_inline_level.push(tagged(4, "block"));
    root.negative_z_index.push(stack(tagged(2, "negative-2")));
    root.negative_z_index.push(stack(tagged(3, "negative-1")));

    let canvas = render(&root, Size::new(200.0, 300.0));
    assert_eq!(
        tags(&canvas),
        vec![
            "negative-2",
            "negative-1",
            "root",
            "block",
            "float",
            "inline-block",
            "inline",
            "positioned",
            "positive",
        ]
    );
}

#[test]
fn invisible_contexts_are_skipped() {
    let mut root = stack(tagged(1, "root"));
    let mut hidden = tagged(2, "hidden");
    hidden.visible = false;
    let mut hidden_stack = stack(hidden);
    hidden_stack.positive_z_index.push(stack(tagged(3, "inside-hidden")));
    root.positive_z_index.push(hidden_stack);

    let canvas = render(&root, Size::new(200.0, 100.0));
    assert_eq!(tags(&canvas), vec!["root"]);
}

#[test]
fn effects_are_flushed_after_render() {
    let clip = vec![
        PathSegment::Vertex(Point::new(0.0, 0.0)),
        PathSegment::Vertex(Point::new(50.0, 0.0)),
        PathSegment::Vertex(Point::new(50.0, 50.0)),
        PathSegment::Vertex(Point::new(0.0, 50.0)),
    ];
    let mut child = tagged(2, "child");
    child.styles.background_color = "red".to_string();
    child.effects = vec![
        Effect::opacity(0.5),
        Effect::transform(Affine::rotate(0.3), Point::new(25.0, 25.0)),
        Effect::clip(clip, EffectTarget::CONTENT),
    ];
    let mut root = stack(tagged(1, "root"));
    root.zero_or_auto_z_index_or_transformed_or_opacity.push(stack(child));

    let canvas = render(&root, Size::new(100.0, 100.0));
    assert_eq!(balance(canvas.ops()), 0);
    assert!(canvas.ops().iter().filter(|op| matches!(op, DrawOp::Clip { .. })).count() >= 2);

    let background_alpha = canvas
        .ops()
        .iter()
        .find_map(|op| match op {
            DrawOp::Path { brush, .. } => brush.color().filter(|c| c.to_rgba8().r == 255).map(|c| c.components[3]),
            _ => None,
        })
        .unwrap();
    assert!((background_alpha - 0.5).abs() < 1e-6);
}

#[test]
fn fallback_glyphs_advance_by_their_own_width() {
    let mut element = tagged(1, "text");
    element.text_runs[0].text = "a漢b".to_string();
    let canvas = render(&stack(element), Size::new(100.0, 100.0));

    let xs: Vec<(String, f64)> = canvas
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, origin, .. } => Some((text.clone(), origin.x)),
            _ => None,
        })
        .collect();
    assert_eq!(
        xs,
        vec![("a".to_string(), 0.0), ("漢".to_string(), 8.0), ("b".to_string(), 28.0)]
    );
}

#[test]
fn iframe_is_rendered_in_isolation() {
    let mut inner = element(10, Rect::new(0.0, 0.0, 400.0, 200.0));
    inner.styles.background_color = "blue".to_string();
    inner.effects = vec![Effect::opacity(0.25)];

    let mut frame = element(2, Rect::new(10.0, 10.0, 210.0, 110.0));
    frame.content = Some(ContentKind::Iframe {
        tree: Box::new(stack(inner)),
        viewport: Size::new(400.0, 200.0),
        background_color: Some("white".to_string()),
    });
    let mut root = stack(element(1, Rect::new(0.0, 0.0, 300.0, 300.0)));
    root.non_inline_level.push(frame);

    let canvas = render(&root, Size::new(300.0, 300.0));
    let (picture, transform) = canvas
        .ops()
        .iter()
        .find_map(|op| match op {
            DrawOp::Picture { picture, transform } => Some((picture.clone(), *transform)),
            _ => None,
        })
        .unwrap();

    assert_eq!(transform.as_coeffs(), [0.5, 0.0, 0.0, 0.5, 10.0, 10.0]);
    assert_eq!(picture.bounds, Rect::new(0.0, 0.0, 400.0, 200.0));
    assert_eq!(balance(&picture.ops), 0);

    let colors: Vec<(u8, f32)> = picture
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Path { brush, .. } => brush.color().map(|c| (c.to_rgba8().b, c.components[3])),
            _ => None,
        })
        .collect();
    // white iframe background, then the blue box at the iframe's own opacity
    assert_eq!(colors.len(), 2);
    assert_eq!(colors[0].1, 1.0);
    assert!((colors[1].1 - 0.25).abs() < 1e-6);
}

#[test]
fn dashed_border_scenario() {
    let mut boxed = element(1, Rect::new(0.0, 0.0, 100.0, 20.0));
    boxed.geometry = stokes_print::tree::BoxGeometry::from_rects(
        Rect::new(0.0, 0.0, 100.0, 20.0),
        Rect::new(2.0, 2.0, 98.0, 18.0),
        Rect::new(2.0, 2.0, 98.0, 18.0),
    );
    for side in boxed.styles.borders.iter_mut() {
        side.style = stokes_print::tree::style::BorderStyle::Dashed;
        side.width = 2.0;
        side.color = "red".to_string();
    }
    let canvas = render(&stack(boxed), Size::new(120.0, 40.0));

    let strokes: Vec<(f64, Vec<f64>)> = canvas
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Path { brush, .. } => match &brush.style {
                stokes_print::canvas::BrushStyle::Stroke(stroke) => {
                    Some((stroke.width, stroke.dash_pattern.iter().copied().collect()))
                }
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(strokes.len(), 4);
    let (width, dashes) = &strokes[0];
    assert!((width - 5.1).abs() < 1e-9);
    assert_eq!(dashes, &vec![4.0, 2.0]);
    assert_eq!(canvas.ops().iter().filter(|op| matches!(op, DrawOp::Clip { .. })).count(), 4);
    assert_eq!(balance(canvas.ops()), 0);
}

#[test]
fn background_layers_paint_bottom_first() {
    use stokes_print::tree::style::{BackgroundImage, BackgroundLayer, ColorStop, GradientAngle};

    let mut boxed = element(1, Rect::new(0.0, 0.0, 100.0, 100.0));
    boxed.styles.background_layers = vec![
        BackgroundLayer::new(BackgroundImage::LinearGradient {
            angle: GradientAngle::Radians(std::f64::consts::PI),
            stops: vec![
                ColorStop { color: "transparent".to_string(), position: None },
                ColorStop { color: "black".to_string(), position: None },
            ],
        }),
        BackgroundLayer::new(BackgroundImage::Url("red.png".to_string())),
    ];
    let canvas = render(&stack(boxed), Size::new(100.0, 100.0));

    let sources: Vec<&PaintSource> = canvas
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Path { brush, .. } => Some(&brush.source),
            _ => None,
        })
        .collect();
    assert_eq!(sources.len(), 2);
    match sources[0] {
        PaintSource::Image(pattern) => assert_eq!(pattern.image.data.data()[..4], [255, 0, 0, 255]),
        other => panic!("expected the red image first, got {:?}", other),
    }
    assert!(matches!(sources[1], PaintSource::Linear(_)));
}
