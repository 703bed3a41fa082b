use nalgebra::{DMatrix, Point2};
use serde::Serialize;

use crate::error::PlotError;

/// Multiplier of the negative-log size heuristic (`-1.25 * 75`).
pub const SIZE_SCALE_FACTOR: f64 = -1.25 * 7.5e1;

/// y coordinate shared by the source and sink states in the default layout.
pub const PINNED_Y: f64 = 0.5;

/// Opacity of direct flux edges when no alpha scale is applied.
pub const DEFAULT_EDGE_ALPHA: f64 = 0.75;

pub const ALPHA_RANGE: (f64, f64) = (0.5, 0.95);

/// Reaction-coordinate layout: x is the committor of each state. States
/// with committor exactly 0 or 1 sit at `PINNED_Y`; every other state gets
/// the next evenly spaced y offset, starting from zero.
pub fn default_positions(committor: &[f64]) -> Vec<Point2<f64>> {
    let n = committor.len();
    let step = 1.0 / n.saturating_sub(2).max(1) as f64;

    let mut offset = 0.0;
    committor
        .iter()
        .map(|&q| {
            if q == 0.0 || q == 1.0 {
                Point2::new(q, PINNED_Y)
            } else {
                let point = Point2::new(q, offset);
                offset += step;
                point
            }
        })
        .collect()
}

/// Marker size per state: `-93.75 / ln(p)`. Well populated states get large
/// markers; the transform is undefined outside `(0, 1)`.
pub fn size_scale(probabilities: &[f64]) -> Result<Vec<f64>, PlotError> {
    probabilities
        .iter()
        .enumerate()
        .map(|(index, &p)| {
            if p > 0.0 && p < 1.0 {
                Ok(SIZE_SCALE_FACTOR / p.ln())
            } else {
                Err(PlotError::Domain { index, value: p })
            }
        })
        .collect()
}

/// Linear map of flux magnitudes onto `ALPHA_RANGE`, fitted to the strictly
/// non-zero entries of a flux matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlphaScale {
    pub flux_min: f64,
    pub flux_max: f64,
}

impl AlphaScale {
    pub fn fit(net_flux: &DMatrix<f64>) -> Option<Self> {
        let mut nonzero = net_flux.iter().copied().filter(|&v| v != 0.0).peekable();
        nonzero.peek()?;

        let (flux_min, flux_max) = nonzero.fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v), hi.max(v)),
        );
        Some(Self { flux_min, flux_max })
    }

    pub fn transform(&self, flux: f64) -> f64 {
        let (lo, hi) = ALPHA_RANGE;
        let mut span = self.flux_max - self.flux_min;
        if span.abs() < f64::EPSILON {
            span = 1.0;
        }
        lo + (flux - self.flux_min) / span * (hi - lo)
    }
}

/// Number of pathway overlays to draw: the request (or every path) clamped
/// to what is available.
pub fn resolve_pathway_count(requested: Option<usize>, available: usize) -> usize {
    requested.unwrap_or(available).min(available)
}

pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![start];
    }

    let step = (end - start) / (count as f64 - 1.0);
    (0..count).map(|i| start + step * i as f64).collect()
}
