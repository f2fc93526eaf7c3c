use crate::{datatypes::Point, error::FloodgateError};

/// Euclidean distance between two points
pub fn length(a: &Point, b: &Point) -> f64 {
    f64::sqrt(f64::powi(b.x - a.x, 2) + f64::powi(b.y - a.y, 2))
}

/// Midpoint of the segment a-b
pub fn centroid(a: &Point, b: &Point) -> Point {
    Point {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Unit vector along a->b. Axis-aligned segments short-circuit to (0,1) and
/// (1,0) so no division happens on them.
///
/// # Arguments
/// * `a` - The first endpoint
/// * `b` - The second endpoint
///
/// # Returns
/// The normalized slope, or an error for coincident endpoints
pub fn normalized_slope(a: &Point, b: &Point) -> Result<Point, FloodgateError> {
    if a.x == b.x && a.y == b.y {
        return Err(FloodgateError::Geometry(format!(
            "Coincident endpoints at ({}, {})",
            a.x, a.y
        )));
    }

    if a.x == b.x {
        return Ok(Point { x: 0.0, y: 1.0 });
    }
    if a.y == b.y {
        return Ok(Point { x: 1.0, y: 0.0 });
    }

    let len = length(a, b);

    Ok(Point {
        x: (b.x - a.x) / len,
        y: (b.y - a.y) / len,
    })
}

/// Unit vector perpendicular to a->b, with the same axis-aligned special
/// casing as `normalized_slope`. The sign is convention-fixed; callers flip
/// it based on endpoint order where needed.
pub fn normal(a: &Point, b: &Point) -> Result<Point, FloodgateError> {
    if a.x == b.x && a.y == b.y {
        return Err(FloodgateError::Geometry(format!(
            "Coincident endpoints at ({}, {})",
            a.x, a.y
        )));
    }

    if a.x == b.x {
        return Ok(Point { x: 1.0, y: 0.0 });
    }
    if a.y == b.y {
        return Ok(Point { x: 0.0, y: 1.0 });
    }

    let len = length(a, b);

    Ok(Point {
        x: -(b.y - a.y) / len,
        y: (b.x - a.x) / len,
    })
}

/// Foot of the perpendicular from `q` onto the infinite line through a-b.
///
/// Horizontal and vertical segments are special-cased to avoid a division by
/// zero; the general case intersects the segment's line with its
/// perpendicular through `q`.
///
/// # Arguments
/// * `a` - The first endpoint of the edge
/// * `b` - The second endpoint of the edge
/// * `q` - The query point to project
///
/// # Returns
/// The projected point, or an error for coincident endpoints
pub fn closest_point_on_edge(a: &Point, b: &Point, q: &Point) -> Result<Point, FloodgateError> {
    if a.x == b.x && a.y == b.y {
        return Err(FloodgateError::Geometry(format!(
            "Coincident endpoints at ({}, {})",
            a.x, a.y
        )));
    }

    if a.y == b.y {
        return Ok(Point { x: q.x, y: a.y });
    }
    if a.x == b.x {
        return Ok(Point { x: a.x, y: q.y });
    }

    let m1 = (b.y - a.y) / (b.x - a.x);
    let m2 = -1.0 / m1;

    let x = (m1 * a.x - m2 * q.x - a.y + q.y) / (m1 - m2);
    let y = m2 * (x - q.x) + q.y;

    Ok(Point { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    #[test]
    fn length_of_3_4_5_triangle() {
        assert_relative_eq!(length(&point(1.0, 1.0), &point(4.0, 5.0)), 5.0);
    }

    #[test]
    fn centroid_is_midpoint() {
        let mid = centroid(&point(-2.0, 0.0), &point(0.0, 1.0));
        assert_relative_eq!(mid.x, -1.0);
        assert_relative_eq!(mid.y, 0.5);
    }

    #[test]
    fn slope_of_axis_aligned_segments() {
        let vertical = normalized_slope(&point(1.0, 0.0), &point(1.0, -3.0)).unwrap();
        assert_eq!((vertical.x, vertical.y), (0.0, 1.0));

        let horizontal = normalized_slope(&point(0.0, 2.0), &point(5.0, 2.0)).unwrap();
        assert_eq!((horizontal.x, horizontal.y), (1.0, 0.0));
    }

    #[test]
    fn slope_of_diagonal_is_unit() {
        let slope = normalized_slope(&point(0.0, 0.0), &point(3.0, 4.0)).unwrap();
        assert_relative_eq!(slope.x, 0.6);
        assert_relative_eq!(slope.y, 0.8);
        assert_relative_eq!(slope.x * slope.x + slope.y * slope.y, 1.0);
    }

    #[test]
    fn normal_is_perpendicular_to_slope() {
        let a = point(-1.3, 0.5);
        let b = point(-0.6, 1.0);
        let slope = normalized_slope(&a, &b).unwrap();
        let perp = normal(&a, &b).unwrap();
        assert_relative_eq!(slope.x * perp.x + slope.y * perp.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(perp.x * perp.x + perp.y * perp.y, 1.0);
    }

    #[test]
    fn normal_of_axis_aligned_segments() {
        let vertical = normal(&point(0.0, 0.0), &point(0.0, 2.0)).unwrap();
        assert_eq!((vertical.x, vertical.y), (1.0, 0.0));

        let horizontal = normal(&point(0.0, 0.0), &point(2.0, 0.0)).unwrap();
        assert_eq!((horizontal.x, horizontal.y), (0.0, 1.0));
    }

    #[test]
    fn coincident_endpoints_are_rejected() {
        let a = point(0.5, 0.5);
        assert!(normalized_slope(&a, &a).is_err());
        assert!(normal(&a, &a).is_err());
        assert!(closest_point_on_edge(&a, &a, &point(1.0, 1.0)).is_err());
    }

    #[test]
    fn closest_point_on_horizontal_segment_keeps_y() {
        let foot =
            closest_point_on_edge(&point(0.0, 2.0), &point(4.0, 2.0), &point(1.5, 7.0)).unwrap();
        assert_relative_eq!(foot.x, 1.5);
        assert_relative_eq!(foot.y, 2.0);
    }

    #[test]
    fn closest_point_on_vertical_segment_keeps_x() {
        let foot =
            closest_point_on_edge(&point(3.0, 0.0), &point(3.0, 5.0), &point(-1.0, 2.5)).unwrap();
        assert_relative_eq!(foot.x, 3.0);
        assert_relative_eq!(foot.y, 2.5);
    }

    #[test]
    fn closest_point_on_diagonal_is_the_perpendicular_foot() {
        let a = point(0.0, 0.0);
        let b = point(4.0, 4.0);
        let q = point(0.0, 2.0);

        let foot = closest_point_on_edge(&a, &b, &q).unwrap();
        assert_relative_eq!(foot.x, 1.0);
        assert_relative_eq!(foot.y, 1.0);

        // lies on the segment's infinite line
        assert_relative_eq!(foot.y - a.y, (b.y - a.y) / (b.x - a.x) * (foot.x - a.x));

        // and the connecting segment is perpendicular to it
        let dot = (b.x - a.x) * (q.x - foot.x) + (b.y - a.y) * (q.y - foot.y);
        assert_relative_eq!(dot, 0.0, epsilon = 1e-12);
    }
}
