// Gradient geometry: line direction, color stops and radial extents
use std::f64::consts::{FRAC_PI_2, TAU};

use kurbo::Point;

use super::paint::resolve_color_with_alpha;
use crate::canvas::GradientStop;
use crate::tree::style::{ColorStop, GradientAngle, RadialExtent, RadialShape};

/// Gradient line of a linear gradient inside a `width` x `height` tile
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientLine {
    pub length: f64,
    pub start: Point,
    pub end: Point,
}

/// Angle for `to <corner>`, perpendicular to the diagonal through the two
/// other corners
fn angle_from_corner(x: f64, y: f64, width: f64, height: f64) -> f64 {
    let toward_x = if x > 0.5 { 1.0 } else { -1.0 };
    let toward_y = if y > 0.5 { 1.0 } else { -1.0 };
    ((toward_x * height).atan2(-toward_y * width) + TAU) % TAU
}

/// Length and end points of the gradient line for a CSS angle
pub fn gradient_direction(angle: GradientAngle, width: f64, height: f64) -> GradientLine {
    let radian = match angle {
        GradientAngle::Radians(radian) => radian,
        GradientAngle::Corner { x, y } => angle_from_corner(x, y, width, height),
    };
    let length = (width * radian.sin()).abs() + (height * radian.cos()).abs();
    let half_width = width / 2.0;
    let half_height = height / 2.0;
    let half_length = length / 2.0;

    let y_diff = (radian - FRAC_PI_2).sin() * half_length;
    let x_diff = (radian - FRAC_PI_2).cos() * half_length;

    GradientLine {
        length,
        start: Point::new(half_width - x_diff, half_height - y_diff),
        end: Point::new(half_width + x_diff, half_height + y_diff),
    }
}

/// Resolve color stops to fractions of the gradient line.
///
/// A missing first position is 0 and a missing last one is 100%. A
/// position before its predecessor is clamped to it; runs of unpositioned
/// stops are spread evenly between their neighbours.
pub fn process_color_stops(stops: &[ColorStop], line_length: f64, global_alpha: f32) -> Vec<GradientStop> {
    let count = stops.len();
    let mut positions: Vec<Option<f64>> = Vec::with_capacity(count);
    let mut previous = 0.0;
    for (index, stop) in stops.iter().enumerate() {
        let position = match stop.position {
            Some(position) => Some(position.resolve(line_length)),
            None if index == 0 => Some(0.0),
            None if index == count - 1 => Some(line_length),
            None => None,
        };
        match position {
            Some(absolute) => {
                let clamped = absolute.max(previous);
                positions.push(Some(clamped));
                previous = clamped;
            }
            None => positions.push(None),
        }
    }

    let mut gap_begin: Option<usize> = None;
    for index in 0..count {
        match (positions[index], gap_begin) {
            (None, None) => gap_begin = Some(index),
            (Some(stop), Some(begin)) => {
                let gap_length = index - begin;
                let before_gap = positions[begin - 1].unwrap_or(0.0);
                let gap_value = (stop - before_gap) / (gap_length + 1) as f64;
                for g in 1..=gap_length {
                    positions[begin + g - 1] = Some(before_gap + gap_value * g as f64);
                }
                gap_begin = None;
            }
            _ => {}
        }
    }

    stops
        .iter()
        .zip(positions)
        .map(|(stop, position)| {
            let fraction = if line_length > 0.0 {
                position.unwrap_or(0.0) / line_length
            } else {
                0.0
            };
            GradientStop {
                offset: fraction.clamp(0.0, 1.0) as f32,
                color: resolve_color_with_alpha(&stop.color, global_alpha),
            }
        })
        .collect()
}

fn distance(x: f64, y: f64) -> f64 {
    x.hypot(y)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

fn find_corner(width: f64, height: f64, x: f64, y: f64, closest: bool) -> (f64, f64) {
    let corners = [(0.0, 0.0), (0.0, height), (width, 0.0), (width, height)];
    let mut best = corners[0];
    let mut best_distance = distance(x - best.0, y - best.1);
    for corner in &corners[1..] {
        let d = distance(x - corner.0, y - corner.1);
        if (closest && d < best_distance) || (!closest && d > best_distance) {
            best = *corner;
            best_distance = d;
        }
    }
    best
}

/// Horizontal and vertical radii of a radial gradient centered at `(x, y)`
/// inside a `width` x `height` tile
pub fn calculate_radius(
    shape: RadialShape,
    extent: RadialExtent,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> (f64, f64) {
    let sides_x = [x.abs(), (x - width).abs()];
    let sides_y = [y.abs(), (y - height).abs()];
    let corner_distances = [
        distance(x, y),
        distance(x, y - height),
        distance(x - width, y),
        distance(x - width, y - height),
    ];
    match (extent, shape) {
        (RadialExtent::ClosestSide, RadialShape::Circle) => {
            let r = min_of(&[sides_x[0], sides_x[1], sides_y[0], sides_y[1]]);
            (r, r)
        }
        (RadialExtent::ClosestSide, RadialShape::Ellipse) => (min_of(&sides_x), min_of(&sides_y)),
        (RadialExtent::FarthestSide, RadialShape::Circle) => {
            let r = max_of(&[sides_x[0], sides_x[1], sides_y[0], sides_y[1]]);
            (r, r)
        }
        (RadialExtent::FarthestSide, RadialShape::Ellipse) => (max_of(&sides_x), max_of(&sides_y)),
        (RadialExtent::ClosestCorner, RadialShape::Circle) => {
            let r = min_of(&corner_distances);
            (r, r)
        }
        (RadialExtent::FarthestCorner, RadialShape::Circle) => {
            let r = max_of(&corner_distances);
            (r, r)
        }
        (RadialExtent::ClosestCorner, RadialShape::Ellipse) => {
            ellipse_through_corner(min_of(&sides_y) / min_of(&sides_x), width, height, x, y, true)
        }
        (RadialExtent::FarthestCorner, RadialShape::Ellipse) => {
            ellipse_through_corner(max_of(&sides_y) / max_of(&sides_x), width, height, x, y, false)
        }
        (RadialExtent::Explicit(rx, ry), _) => {
            let rx_px = rx.resolve(width);
            let ry_px = ry.map(|ry| ry.resolve(height)).unwrap_or(rx_px);
            (rx_px, ry_px)
        }
    }
}

/// Ellipse with aspect ratio `ratio` (ry / rx) passing through a corner
fn ellipse_through_corner(ratio: f64, width: f64, height: f64, x: f64, y: f64, closest: bool) -> (f64, f64) {
    if !ratio.is_finite() || ratio <= 0.0 {
        return (0.0, 0.0);
    }
    let (cx, cy) = find_corner(width, height, x, y, closest);
    let rx = distance(cx - x, (cy - y) / ratio);
    (rx, ratio * rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::style::LengthPercentage;
    use std::f64::consts::PI;

    fn stop(color: &str, position: Option<f64>) -> ColorStop {
        ColorStop {
            color: color.to_string(),
            position: position.map(LengthPercentage::Percent),
        }
    }

    #[test]
    fn to_bottom_runs_top_to_bottom() {
        let line = gradient_direction(GradientAngle::Radians(PI), 100.0, 50.0);
        assert!((line.length - 50.0).abs() < 1e-9);
        assert!((line.start.x - 50.0).abs() < 1e-9);
        assert!(line.start.y.abs() < 1e-9);
        assert!((line.end.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn to_right_spans_the_width() {
        let line = gradient_direction(GradientAngle::Radians(PI / 2.0), 100.0, 50.0);
        assert!((line.length - 100.0).abs() < 1e-9);
        assert!(line.start.x.abs() < 1e-9);
        assert!((line.end.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn to_bottom_right_runs_toward_that_corner() {
        let line = gradient_direction(GradientAngle::Corner { x: 1.0, y: 1.0 }, 100.0, 50.0);
        assert!((line.length - 2.0 * 20f64.hypot(40.0)).abs() < 1e-9);
        assert!((line.start.x - 30.0).abs() < 1e-9);
        assert!((line.start.y + 15.0).abs() < 1e-9);
        assert!((line.end.x - 70.0).abs() < 1e-9);
        assert!((line.end.y - 65.0).abs() < 1e-9);
    }

    #[test]
    fn to_top_left_of_a_square_is_315_degrees() {
        let line = gradient_direction(GradientAngle::Corner { x: 0.0, y: 0.0 }, 40.0, 40.0);
        assert!(line.end.x < line.start.x);
        assert!(line.end.y < line.start.y);
        assert!((line.start.x - line.start.y).abs() < 1e-9);
        assert!((line.length - 40.0 * std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn unpositioned_stops_are_spread() {
        let stops = [stop("red", None), stop("green", None), stop("blue", None)];
        let processed = process_color_stops(&stops, 200.0, 1.0);
        let offsets: Vec<f32> = processed.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn gaps_start_from_the_previous_stop() {
        let stops = [
            stop("red", Some(40.0)),
            stop("green", None),
            stop("blue", Some(80.0)),
        ];
        let processed = process_color_stops(&stops, 100.0, 1.0);
        assert!((processed[1].offset - 0.6).abs() < 1e-6);
    }

    #[test]
    fn decreasing_stops_clamp_to_previous() {
        let stops = [stop("red", Some(50.0)), stop("blue", Some(20.0))];
        let processed = process_color_stops(&stops, 100.0, 1.0);
        assert_eq!(processed[1].offset, 0.5);
    }

    #[test]
    fn ellipse_farthest_corner_keeps_aspect() {
        let (rx, ry) = calculate_radius(RadialShape::Ellipse, RadialExtent::FarthestCorner, 50.0, 25.0, 100.0, 50.0);
        assert!((ry / rx - 0.5).abs() < 1e-9);
        let (cx, cy) = calculate_radius(RadialShape::Circle, RadialExtent::ClosestSide, 50.0, 25.0, 100.0, 50.0);
        assert_eq!((cx, cy), (25.0, 25.0));
    }
}
