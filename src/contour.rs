use nalgebra::DMatrix;

pub type Segment = ((f64, f64), (f64, f64));

/// `count` interior levels strictly between `min` and `max`.
pub fn contour_levels(min: f64, max: f64, count: usize) -> Vec<f64> {
    if count == 0 || !(max > min) {
        return Vec::new();
    }
    let step = (max - min) / (count + 1) as f64;
    (1..=count).map(|k| min + step * k as f64).collect()
}

/// Iso-line of `z` at `level` by marching squares. `z[(row, col)]` sits at
/// `(xs[col], ys[row])`.
pub fn iso_segments(z: &DMatrix<f64>, xs: &[f64], ys: &[f64], level: f64) -> Vec<Segment> {
    let (rows, cols) = z.shape();
    let mut segments = Vec::new();
    if rows < 2 || cols < 2 || xs.len() != cols || ys.len() != rows {
        return segments;
    }

    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            // bottom-left, bottom-right, top-right, top-left
            let corners = [
                ((xs[c], ys[r]), z[(r, c)]),
                ((xs[c + 1], ys[r]), z[(r, c + 1)]),
                ((xs[c + 1], ys[r + 1]), z[(r + 1, c + 1)]),
                ((xs[c], ys[r + 1]), z[(r + 1, c)]),
            ];
            let case = corners
                .iter()
                .enumerate()
                .fold(0usize, |acc, (bit, (_, v))| {
                    acc | (usize::from(*v >= level) << bit)
                });

            let edge = |e: usize| {
                let (a, b) = (corners[e], corners[(e + 1) % 4]);
                interpolate(a, b, level)
            };
            let centre_above = corners.iter().map(|(_, v)| v).sum::<f64>() / 4.0 >= level;

            let pairs: &[(usize, usize)] = match case {
                1 | 14 => &[(3, 0)],
                2 | 13 => &[(0, 1)],
                3 | 12 => &[(3, 1)],
                4 | 11 => &[(1, 2)],
                6 | 9 => &[(0, 2)],
                7 | 8 => &[(2, 3)],
                5 if centre_above => &[(0, 1), (2, 3)],
                5 => &[(3, 0), (1, 2)],
                10 if centre_above => &[(3, 0), (1, 2)],
                10 => &[(0, 1), (2, 3)],
                _ => &[],
            };
            segments.extend(pairs.iter().map(|&(e0, e1)| (edge(e0), edge(e1))));
        }
    }
    segments
}

fn interpolate(a: ((f64, f64), f64), b: ((f64, f64), f64), level: f64) -> (f64, f64) {
    let ((pa, va), (pb, vb)) = (a, b);
    let t = if (vb - va).abs() < f64::EPSILON {
        0.5
    } else {
        ((level - va) / (vb - va)).clamp(0.0, 1.0)
    };
    (pa.0 + t * (pb.0 - pa.0), pa.1 + t * (pb.1 - pa.1))
}
