//! Smooth curves through ordered points.
//!
//! Each segment `p1 → p2` becomes a cubic Bezier whose control points come
//! from the Catmull-Rom tangents of the flanking points `p0` and `p3`
//! (clamped at the ends of the sequence), scaled by one sixth. Both the fill
//! region and the stroked outline of a chart are traced through
//! [`trace_smooth`] so they stay pixel-coincident.

use tiny_skia::{Path, PathBuilder, Point};

/// One cubic Bezier segment ending at `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierSegment {
    pub c1: Point,
    pub c2: Point,
    pub to: Point,
}

/// Catmull-Rom → Bezier conversion for every consecutive pair of points.
///
/// Fewer than two points produce no segments.
pub fn catmull_rom_segments(points: &[Point]) -> Vec<BezierSegment> {
    if points.len() < 2 {
        return Vec::new();
    }
    let last = points.len() - 1;
    (0..last)
        .map(|i| {
            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[i + 1];
            let p3 = points[(i + 2).min(last)];
            BezierSegment {
                c1: Point::from_xy(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0),
                c2: Point::from_xy(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0),
                to: p2,
            }
        })
        .collect()
}

/// Append the smooth curve through `points` to `pb`.
///
/// Assumes the builder's current point is already `points[0]` (or that the
/// caller wants a connecting line to it, which `line_to` supplies).
pub fn trace_smooth(pb: &mut PathBuilder, points: &[Point]) {
    for seg in catmull_rom_segments(points) {
        pb.cubic_to(seg.c1.x, seg.c1.y, seg.c2.x, seg.c2.y, seg.to.x, seg.to.y);
    }
}

/// Open path through all points, for stroking.
///
/// Non-finite points are dropped first. Returns `None` with fewer than two
/// usable points; callers may render a single point as a dot instead.
pub fn smooth_path(points: &[Point]) -> Option<Path> {
    let points = finite_points(points);
    if points.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::with_capacity(points.len() + 1, points.len() * 3 + 1);
    pb.move_to(points[0].x, points[0].y);
    trace_smooth(&mut pb, &points);
    pb.finish()
}

/// Closed region between the curve and a horizontal baseline, for filling.
///
/// Starts on the baseline under the first point, follows the curve and drops
/// back to the baseline under the last point.
pub fn smooth_area(points: &[Point], baseline_y: f32, start_x: f32) -> Option<Path> {
    let points = finite_points(points);
    if points.len() < 2 || !baseline_y.is_finite() || !start_x.is_finite() {
        return None;
    }
    let mut pb = PathBuilder::with_capacity(points.len() + 3, points.len() * 3 + 3);
    pb.move_to(start_x, baseline_y);
    pb.line_to(points[0].x, points[0].y);
    trace_smooth(&mut pb, &points);
    let last = points[points.len() - 1];
    pb.line_to(last.x, baseline_y);
    pb.close();
    pb.finish()
}

fn finite_points(points: &[Point]) -> Vec<Point> {
    points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::PathSegment;

    fn pts(coords: &[(f32, f32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::from_xy(x, y)).collect()
    }

    fn endpoints(path: &Path) -> (Point, Point) {
        let mut first = None;
        let mut last = None;
        for seg in path.segments() {
            match seg {
                PathSegment::MoveTo(p) => {
                    first.get_or_insert(p);
                    last = Some(p);
                }
                PathSegment::LineTo(p) => last = Some(p),
                PathSegment::QuadTo(_, p) => last = Some(p),
                PathSegment::CubicTo(_, _, p) => last = Some(p),
                PathSegment::Close => {}
            }
        }
        (first.unwrap(), last.unwrap())
    }

    #[test]
    fn path_starts_and_ends_on_the_data() {
        let points = pts(&[(0.0, 10.0), (5.0, 2.0), (9.0, 7.5), (14.0, 1.0), (20.0, 4.0)]);
        let path = smooth_path(&points).unwrap();
        let (first, last) = endpoints(&path);
        assert_eq!(first, points[0]);
        assert_eq!(last, points[4]);
    }

    #[test]
    fn interior_control_points_use_one_sixth_tangents() {
        let points = pts(&[(0.0, 0.0), (6.0, 6.0), (12.0, 0.0), (18.0, 6.0)]);
        let segs = catmull_rom_segments(&points);
        assert_eq!(segs.len(), 3);
        // middle segment: p0=(0,0) p1=(6,6) p2=(12,0) p3=(18,6)
        assert_eq!(segs[1].c1, Point::from_xy(8.0, 6.0));
        assert_eq!(segs[1].c2, Point::from_xy(10.0, 0.0));
        assert_eq!(segs[1].to, points[2]);
    }

    #[test]
    fn ends_clamp_to_the_sequence() {
        let points = pts(&[(0.0, 0.0), (6.0, 6.0)]);
        let segs = catmull_rom_segments(&points);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].c1, Point::from_xy(1.0, 1.0));
        assert_eq!(segs[0].c2, Point::from_xy(5.0, 5.0));
    }

    #[test]
    fn same_input_same_output() {
        let points = pts(&[(0.0, 3.0), (1.0, 4.0), (2.0, 1.0)]);
        assert_eq!(catmull_rom_segments(&points), catmull_rom_segments(&points));
    }

    #[test]
    fn degenerate_inputs_draw_nothing() {
        assert!(smooth_path(&[]).is_none());
        assert!(smooth_path(&pts(&[(1.0, 1.0)])).is_none());
        assert!(catmull_rom_segments(&pts(&[(1.0, 1.0)])).is_empty());
        assert!(smooth_area(&pts(&[(1.0, 1.0)]), 10.0, 0.0).is_none());
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let points = pts(&[(0.0, 0.0), (f32::NAN, 1.0), (4.0, 2.0)]);
        let path = smooth_path(&points).unwrap();
        assert!(path.points().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn area_returns_to_baseline() {
        let points = pts(&[(10.0, 5.0), (20.0, 3.0), (30.0, 8.0)]);
        let area = smooth_area(&points, 50.0, 10.0).unwrap();
        let bounds = area.bounds();
        assert_eq!(bounds.bottom(), 50.0);
        assert_eq!(bounds.left(), 10.0);
        assert_eq!(bounds.right(), 30.0);
    }
}
