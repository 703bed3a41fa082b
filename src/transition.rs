//! Conditional transition densities `P(x(t+τ), x(t) | s(t) = i, s(t+τ) = j)`
//! estimated from labelled trajectories of a continuous observable.

use log::warn;
use nalgebra::DMatrix;
use serde::Deserialize;

use crate::contour::Segment;
use crate::error::PlotError;

/// Reference point highlighted on every density panel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextLabel {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPanel {
    /// Subplot column; unsampled targets leave their column empty.
    pub column: usize,
    pub target: usize,
    /// Normalised histogram, `density[(y_bin, x_bin)]`.
    pub density: DMatrix<f64>,
    pub range: (f64, f64),
    pub samples: usize,
}

impl TransitionPanel {
    /// Bin centres along either axis (both axes share `range`).
    pub fn bin_centres(&self) -> Vec<f64> {
        let bins = self.density.nrows();
        let (lo, hi) = self.range;
        let width = (hi - lo) / bins as f64;
        (0..bins).map(|k| lo + width * (k as f64 + 0.5)).collect()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (lo, hi) = self.range;
        (lo..=hi).contains(&x) && (lo..=hi).contains(&y)
    }

    /// Horizontal and vertical lines through `label`, cut to the panel
    /// window. A coordinate outside the window drops its line.
    pub fn reference_lines(&self, label: &TextLabel) -> Vec<Segment> {
        let (lo, hi) = self.range;
        let inside = |v: f64| (lo..=hi).contains(&v);
        let mut lines = Vec::with_capacity(2);
        if inside(label.y) {
            lines.push(((lo, label.y), (hi, label.y)));
        }
        if inside(label.x) {
            lines.push(((label.x, lo), (label.x, hi)));
        }
        lines
    }

    /// Data position of the `k`-th label name: `(0.9 * span, (k + 1) * 0.05 * span)`.
    pub fn name_anchor(&self, k: usize) -> (f64, f64) {
        let span = self.range.1 - self.range.0;
        (0.9 * span, (k + 1) as f64 * 0.05 * span)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionFigure {
    pub origin: usize,
    pub columns: usize,
    pub panels: Vec<TransitionPanel>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionMapOptions {
    pub lag: usize,
    pub bins: usize,
}

impl Default for TransitionMapOptions {
    fn default() -> Self {
        Self { lag: 1, bins: 100 }
    }
}

/// One figure per origin state, one panel per target state. Transitions
/// that never occur are reported and skipped.
pub fn conditional_transition_map(
    origin: &[usize],
    target: &[usize],
    data: &[Vec<f64>],
    labels: &[Vec<usize>],
    options: TransitionMapOptions,
) -> Result<Vec<TransitionFigure>, PlotError> {
    if data.len() != labels.len() {
        return Err(PlotError::invalid(format!(
            "size of data ({}) and labels ({}) do not match",
            data.len(),
            labels.len()
        )));
    }
    for (n, (series, states)) in data.iter().zip(labels).enumerate() {
        if series.len() != states.len() {
            return Err(PlotError::invalid(format!(
                "trajectory {n}: {} data points but {} labels",
                series.len(),
                states.len()
            )));
        }
    }
    if options.lag == 0 {
        return Err(PlotError::invalid("lag must be at least 1"));
    }
    if options.bins == 0 {
        return Err(PlotError::invalid("bins must be at least 1"));
    }

    let mut figures = Vec::with_capacity(origin.len());
    for &i in origin {
        let mut panels = Vec::new();
        for (column, &j) in target.iter().enumerate() {
            let pairs = collect_pairs(data, labels, i, j, options.lag);
            if pairs.is_empty() {
                warn!("[transition] Transition {i} to {j} not sampled.");
                continue;
            }
            let (density, range) = histogram_2d(&pairs, options.bins);
            panels.push(TransitionPanel {
                column,
                target: j,
                density,
                range,
                samples: pairs.len(),
            });
        }
        figures.push(TransitionFigure {
            origin: i,
            columns: target.len(),
            panels,
        });
    }
    Ok(figures)
}

fn collect_pairs(
    data: &[Vec<f64>],
    labels: &[Vec<usize>],
    from: usize,
    to: usize,
    lag: usize,
) -> Vec<(f64, f64)> {
    let mut pairs = Vec::new();
    for (series, states) in data.iter().zip(labels) {
        for t in 0..series.len().saturating_sub(lag) {
            if states[t] == from && states[t + lag] == to {
                pairs.push((series[t], series[t + lag]));
            }
        }
    }
    pairs
}

/// Normalised `bins × bins` histogram over the common range of both
/// coordinates. A degenerate range is widened by 0.5 on each side.
fn histogram_2d(pairs: &[(f64, f64)], bins: usize) -> (DMatrix<f64>, (f64, f64)) {
    let (mut lo, mut hi) = pairs.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), &(x, y)| (lo.min(x).min(y), hi.max(x).max(y)),
    );
    if hi - lo <= f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = hi - lo;
    let bin_of = |v: f64| (((v - lo) / width * bins as f64) as usize).min(bins - 1);

    let mut counts = DMatrix::<f64>::zeros(bins, bins);
    for &(x, y) in pairs {
        counts[(bin_of(y), bin_of(x))] += 1.0;
    }
    let total = pairs.len() as f64;
    (counts / total, (lo, hi))
}
