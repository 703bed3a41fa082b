//! Curved connector geometry in screen coordinates (y grows downwards).
//!
//! Connectors follow the `arc3` style: a quadratic Bézier whose control
//! point sits at the chord midpoint, pushed sideways by `rad` times the
//! chord length. Positive `rad` bends the connector clockwise on screen when
//! walking from start to end, negative `rad` counter-clockwise.

pub type ScreenPoint = (f64, f64);

pub const CURVE_SAMPLES: usize = 48;

pub fn arc3_control(start: ScreenPoint, end: ScreenPoint, rad: f64) -> ScreenPoint {
    let mid = ((start.0 + end.0) / 2.0, (start.1 + end.1) / 2.0);
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    (mid.0 - rad * dy, mid.1 + rad * dx)
}

pub fn sample_arc3(start: ScreenPoint, end: ScreenPoint, rad: f64, samples: usize) -> Vec<ScreenPoint> {
    let control = arc3_control(start, end, rad);
    let samples = samples.max(2);
    (0..samples)
        .map(|i| {
            let t = i as f64 / (samples - 1) as f64;
            quadratic(start, control, end, t)
        })
        .collect()
}

/// Closed outline of a tapered wedge along the arc: `base_width` wide at the
/// start, narrowing to a point at the end.
pub fn wedge_outline(
    start: ScreenPoint,
    end: ScreenPoint,
    rad: f64,
    base_width: f64,
    samples: usize,
) -> Vec<ScreenPoint> {
    let control = arc3_control(start, end, rad);
    let centre = sample_arc3(start, end, rad, samples);
    let last = centre.len() - 1;

    let mut left = Vec::with_capacity(centre.len());
    let mut right = Vec::with_capacity(centre.len());
    for (i, &point) in centre.iter().enumerate() {
        let t = i as f64 / last as f64;
        let (tx, ty) = quadratic_tangent(start, control, end, t);
        let norm = (tx * tx + ty * ty).sqrt();
        let half = base_width * (1.0 - t) / 2.0;
        let (nx, ny) = if norm > f64::EPSILON {
            (-ty / norm, tx / norm)
        } else {
            (0.0, 0.0)
        };
        left.push((point.0 + nx * half, point.1 + ny * half));
        right.push((point.0 - nx * half, point.1 - ny * half));
    }

    right.reverse();
    left.extend(right);
    left
}

/// Triangular head whose tip sits on the arc end, aligned with the arc's
/// final tangent.
pub fn arrow_head(
    start: ScreenPoint,
    end: ScreenPoint,
    rad: f64,
    length: f64,
    width: f64,
) -> [ScreenPoint; 3] {
    let control = arc3_control(start, end, rad);
    let (tx, ty) = quadratic_tangent(start, control, end, 1.0);
    let norm = (tx * tx + ty * ty).sqrt();
    if norm <= f64::EPSILON {
        return [end, end, end];
    }
    let (ux, uy) = (tx / norm, ty / norm);
    let base = (end.0 - ux * length, end.1 - uy * length);
    let half = width / 2.0;
    [
        end,
        (base.0 - uy * half, base.1 + ux * half),
        (base.0 + uy * half, base.1 - ux * half),
    ]
}

fn quadratic(p0: ScreenPoint, c: ScreenPoint, p1: ScreenPoint, t: f64) -> ScreenPoint {
    let u = 1.0 - t;
    (
        u * u * p0.0 + 2.0 * u * t * c.0 + t * t * p1.0,
        u * u * p0.1 + 2.0 * u * t * c.1 + t * t * p1.1,
    )
}

fn quadratic_tangent(p0: ScreenPoint, c: ScreenPoint, p1: ScreenPoint, t: f64) -> ScreenPoint {
    let u = 1.0 - t;
    (
        2.0 * u * (c.0 - p0.0) + 2.0 * t * (p1.0 - c.0),
        2.0 * u * (c.1 - p0.1) + 2.0 * t * (p1.1 - c.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn control_point_offsets_perpendicular_to_chord() {
        let control = arc3_control((0.0, 0.0), (100.0, 0.0), 0.45);
        assert_relative_eq!(control.0, 50.0);
        assert_relative_eq!(control.1, 45.0);

        let flipped = arc3_control((0.0, 0.0), (100.0, 0.0), -0.45);
        assert_relative_eq!(flipped.1, -45.0);
    }

    #[test]
    fn samples_start_and_end_on_endpoints() {
        let points = sample_arc3((10.0, 20.0), (60.0, -5.0), 0.3, 16);
        assert_eq!(points.len(), 16);
        assert_relative_eq!(points[0].0, 10.0);
        assert_relative_eq!(points[0].1, 20.0);
        assert_relative_eq!(points[15].0, 60.0);
        assert_relative_eq!(points[15].1, -5.0);
    }

    #[test]
    fn zero_curvature_is_straight() {
        let points = sample_arc3((0.0, 0.0), (10.0, 10.0), 0.0, 8);
        for (x, y) in points {
            assert_relative_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn wedge_tapers_to_the_tip() {
        let outline = wedge_outline((0.0, 0.0), (100.0, 0.0), 0.0, 10.0, 11);
        assert_eq!(outline.len(), 22);
        assert_relative_eq!(outline[0].1, 5.0);
        assert_relative_eq!(outline[21].1, -5.0);
        assert_relative_eq!(outline[10].0, 100.0);
        assert_relative_eq!(outline[10].1, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn arrow_head_points_along_final_tangent() {
        let head = arrow_head((0.0, 0.0), (100.0, 0.0), 0.0, 10.0, 6.0);
        assert_eq!(head[0], (100.0, 0.0));
        assert_relative_eq!(head[1].0, 90.0);
        assert_relative_eq!(head[2].0, 90.0);
        assert_relative_eq!((head[1].1 - head[2].1).abs(), 6.0);
    }
}
