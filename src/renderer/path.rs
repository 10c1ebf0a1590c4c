// Converts edge descriptors into drawable paths
use kurbo::{BezPath, Point, Size, Vec2};

use crate::tree::PathSegment;

/// Build a path from an edge list.
///
/// Each segment's start point is a `move_to` (first) or `line_to` (rest);
/// curves then continue with a `curve_to` to their end point. The path is
/// left open.
pub fn format_path(segments: &[PathSegment]) -> BezPath {
    let mut path = BezPath::new();
    append_path(&mut path, segments);
    path
}

/// Append an edge list as a new subpath of `path`
pub fn append_path(path: &mut BezPath, segments: &[PathSegment]) {
    for (index, segment) in segments.iter().enumerate() {
        let start = segment.start();
        if index == 0 {
            path.move_to(start);
        } else {
            path.line_to(start);
        }

        if let PathSegment::Bezier { start_control, end_control, end, .. } = segment {
            path.curve_to(*start_control, *end_control, *end);
        }
    }
}

/// Closed version of `format_path`, for fills and clips
pub fn closed_path(segments: &[PathSegment]) -> BezPath {
    let mut path = format_path(segments);
    if !segments.is_empty() {
        path.close_path();
    }
    path
}

/// Reverse the walking direction of an edge list
pub fn reverse_path(segments: &[PathSegment]) -> Vec<PathSegment> {
    segments.iter().rev().map(PathSegment::reverse).collect()
}

/// Shift and grow a four-corner outline.
///
/// Corners are moved by `(dx, dy)`, the right corners additionally by `dw`
/// and the bottom corners by `dh`.
pub fn transform_path(segments: &[PathSegment], dx: f64, dy: f64, dw: f64, dh: f64) -> Vec<PathSegment> {
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let delta = match index {
                0 => Vec2::new(dx, dy),
                1 => Vec2::new(dx + dw, dy),
                2 => Vec2::new(dx + dw, dy + dh),
                3 => Vec2::new(dx, dy + dh),
                _ => Vec2::ZERO,
            };
            segment.translate(delta)
        })
        .collect()
}

/// Closed rectangle covering the whole canvas
pub fn canvas_rect(size: Size) -> Vec<PathSegment> {
    vec![
        PathSegment::Vertex(Point::new(0.0, 0.0)),
        PathSegment::Vertex(Point::new(size.width, 0.0)),
        PathSegment::Vertex(Point::new(size.width, size.height)),
        PathSegment::Vertex(Point::new(0.0, size.height)),
    ]
}

/// Canvas rectangle with `hole` cut out: the hole is walked backwards so a
/// non-zero fill leaves it empty.
pub fn mask_path(size: Size, hole: &[PathSegment]) -> BezPath {
    let mut path = closed_path(&canvas_rect(size));
    append_path(&mut path, &reverse_path(hole));
    path.close_path();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    #[test]
    fn curves_follow_their_start_point() {
        let segments = [
            PathSegment::Vertex(Point::new(0.0, 0.0)),
            PathSegment::Bezier {
                start: Point::new(10.0, 0.0),
                start_control: Point::new(15.0, 0.0),
                end_control: Point::new(20.0, 5.0),
                end: Point::new(20.0, 10.0),
            },
        ];
        let path = format_path(&segments);
        let elements: Vec<PathEl> = path.elements().to_vec();
        assert_eq!(
            elements,
            vec![
                PathEl::MoveTo(Point::new(0.0, 0.0)),
                PathEl::LineTo(Point::new(10.0, 0.0)),
                PathEl::CurveTo(Point::new(15.0, 0.0), Point::new(20.0, 5.0), Point::new(20.0, 10.0)),
            ]
        );
    }

    #[test]
    fn first_curve_starts_with_move() {
        let segments = [PathSegment::Bezier {
            start: Point::new(1.0, 1.0),
            start_control: Point::new(2.0, 1.0),
            end_control: Point::new(3.0, 2.0),
            end: Point::new(3.0, 3.0),
        }];
        let path = format_path(&segments);
        assert_eq!(path.elements()[0], PathEl::MoveTo(Point::new(1.0, 1.0)));
        assert_eq!(path.elements().len(), 2);
    }

    #[test]
    fn transform_path_grows_right_and_bottom_corners() {
        let rect = canvas_rect(Size::new(10.0, 10.0));
        let grown = transform_path(&rect, -2.0, -2.0, 4.0, 4.0);
        assert_eq!(grown[0].start(), Point::new(-2.0, -2.0));
        assert_eq!(grown[2].start(), Point::new(12.0, 12.0));
    }
}
