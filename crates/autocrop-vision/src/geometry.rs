// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plane geometry on quadrilaterals: area, degeneracy checks, corner angles,
// aspect ratio, and output extents.

use autocrop_core::error::{AutoCropError, Result};
use autocrop_core::{Point, Quadrilateral};

/// Minimum sine of the angle between two edges before three corners are
/// considered collinear (about 0.06 degrees).
const COLLINEAR_SINE: f32 = 1e-3;

/// Compute the area of a quadrilateral given by four vertices in perimeter
/// order using the shoelace formula.
pub fn shoelace_area(corners: &[Point; 4]) -> f32 {
    let n = corners.len();
    let mut area = 0.0f32;
    for i in 0..n {
        let j = (i + 1) % n;
        area += corners[i].x * corners[j].y;
        area -= corners[j].x * corners[i].y;
    }
    area.abs() / 2.0
}

/// Whether `a`, `b`, `c` lie on one line (or two of them coincide).
pub fn are_collinear(a: Point, b: Point, c: Point) -> bool {
    let ab = (b.x - a.x, b.y - a.y);
    let ac = (c.x - a.x, c.y - a.y);
    let scale = ab.0.hypot(ab.1) * ac.0.hypot(ac.1);
    if scale <= f32::EPSILON {
        return true;
    }
    let cross = ab.0 * ac.1 - ab.1 * ac.0;
    (cross / scale).abs() < COLLINEAR_SINE
}

/// Check that a quadrilateral can be mapped onto a rectangle.
///
/// Rejects non-finite coordinates, coincident corners, and any three corners
/// on a common line.
pub fn ensure_non_degenerate(quad: &Quadrilateral) -> Result<()> {
    if !quad.is_finite() {
        return Err(AutoCropError::InvalidGeometry(
            "corner coordinates are not finite".into(),
        ));
    }

    let corners = quad.perimeter();
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let c = corners[(i + 2) % 4];
        if are_collinear(a, b, c) {
            return Err(AutoCropError::InvalidGeometry(format!(
                "corners ({}, {}), ({}, {}), ({}, {}) are collinear",
                a.x, a.y, b.x, b.y, c.x, c.y
            )));
        }
    }
    Ok(())
}

/// Interior angle at each corner in degrees, in `[TL, TR, BR, BL]` order.
pub fn corner_angles(quad: &Quadrilateral) -> [f32; 4] {
    let corners = quad.perimeter();
    let mut angles = [0.0f32; 4];
    for (i, angle) in angles.iter_mut().enumerate() {
        let prev = corners[(i + 3) % 4];
        let here = corners[i];
        let next = corners[(i + 1) % 4];
        let u = (prev.x - here.x, prev.y - here.y);
        let v = (next.x - here.x, next.y - here.y);
        let norm = u.0.hypot(u.1) * v.0.hypot(v.1);
        *angle = if norm <= f32::EPSILON {
            0.0
        } else {
            ((u.0 * v.0 + u.1 * v.1) / norm).clamp(-1.0, 1.0).acos().to_degrees()
        };
    }
    angles
}

/// Largest deviation of any corner angle from a right angle, in degrees.
pub fn max_right_angle_deviation(quad: &Quadrilateral) -> f32 {
    corner_angles(quad)
        .iter()
        .map(|a| (a - 90.0).abs())
        .fold(0.0, f32::max)
}

/// Average width and height of the quadrilateral (mean of opposite edges).
pub fn mean_extent(quad: &Quadrilateral) -> (f32, f32) {
    let width = (quad.distance_top() + quad.distance_bottom()) / 2.0;
    let height = (quad.distance_left() + quad.distance_right()) / 2.0;
    (width, height)
}

/// Short side over long side, in `[0, 1]`. Zero for a collapsed shape.
pub fn aspect_ratio(quad: &Quadrilateral) -> f32 {
    let (width, height) = mean_extent(quad);
    let long = width.max(height);
    if long <= f32::EPSILON {
        return 0.0;
    }
    width.min(height) / long
}

/// Pixel size of the flattened output for a quadrilateral in pixel space:
/// the longer of each pair of opposite edges, rounded.
pub fn output_extent(quad: &Quadrilateral) -> (u32, u32) {
    let width = quad.distance_top().max(quad.distance_bottom());
    let height = quad.distance_left().max(quad.distance_right());
    (width.round() as u32, height.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Quadrilateral {
        Quadrilateral::new(
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x0, y1),
            Point::new(x1, y1),
        )
    }

    #[test]
    fn shoelace_area_rectangle() {
        let quad = rect(0.0, 0.0, 10.0, 5.0);
        let area = shoelace_area(&quad.perimeter());
        assert!((area - 50.0).abs() < 1e-3, "Expected 50.0, got {}", area);
    }

    #[test]
    fn rectangle_is_not_degenerate() {
        assert!(ensure_non_degenerate(&rect(100.0, 100.0, 900.0, 900.0)).is_ok());
    }

    #[test]
    fn three_collinear_corners_are_degenerate() {
        // Top-right lies on the diagonal between top-left and bottom-right.
        let quad = Quadrilateral::new(
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
        );
        assert!(matches!(
            ensure_non_degenerate(&quad),
            Err(AutoCropError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn coincident_corners_are_degenerate() {
        let p = Point::new(0.5, 0.5);
        let quad = Quadrilateral::new(p, p, Point::new(0.1, 0.1), Point::new(0.9, 0.1));
        assert!(ensure_non_degenerate(&quad).is_err());
    }

    #[test]
    fn nan_corner_is_degenerate() {
        let mut quad = rect(0.0, 0.0, 1.0, 1.0);
        quad.bottom_left.y = f32::NAN;
        assert!(ensure_non_degenerate(&quad).is_err());
    }

    #[test]
    fn right_angles_for_rectangle() {
        let angles = corner_angles(&rect(0.0, 0.0, 4.0, 2.0));
        for angle in angles {
            assert!((angle - 90.0).abs() < 1e-3, "angle {angle}");
        }
        assert!(max_right_angle_deviation(&rect(0.0, 0.0, 4.0, 2.0)) < 1e-3);
    }

    #[test]
    fn trapezoid_deviates_from_right_angles() {
        let quad = Quadrilateral::new(
            Point::new(2.0, 0.0),
            Point::new(8.0, 0.0),
            Point::new(0.0, 6.0),
            Point::new(10.0, 6.0),
        );
        let deviation = max_right_angle_deviation(&quad);
        // atan(2/6) is about 18.4 degrees.
        assert!((deviation - 18.43).abs() < 0.1, "deviation {deviation}");
        let sum: f32 = corner_angles(&quad).iter().sum();
        assert!((sum - 360.0).abs() < 1e-2);
    }

    #[test]
    fn aspect_ratio_is_short_over_long() {
        assert!((aspect_ratio(&rect(0.0, 0.0, 200.0, 100.0)) - 0.5).abs() < 1e-6);
        assert!((aspect_ratio(&rect(0.0, 0.0, 100.0, 200.0)) - 0.5).abs() < 1e-6);
        let p = Point::new(1.0, 1.0);
        assert_eq!(aspect_ratio(&Quadrilateral::new(p, p, p, p)), 0.0);
    }

    #[test]
    fn output_extent_uses_longer_edges() {
        let quad = Quadrilateral::new(
            Point::new(10.0, 0.0),
            Point::new(90.0, 0.0),
            Point::new(0.0, 50.0),
            Point::new(100.0, 50.0),
        );
        let (w, h) = output_extent(&quad);
        assert_eq!(w, 100);
        // Slanted sides are sqrt(10^2 + 50^2) ~ 50.99.
        assert_eq!(h, 51);
    }
}
