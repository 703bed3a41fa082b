//! Flux network diagram: macrostates laid out along the committor with
//! curved arrows for net flux and for the dominant reactive pathways.
//!
//! [`build_flux_diagram`] resolves every drawing primitive up front into a
//! [`FluxDiagram`]; `plotting::flux` paints it onto a `plotters` backend.

use log::debug;
use nalgebra::Point2;
use plotters::style::RGBColor;

use crate::error::PlotError;
use crate::layout::{self, AlphaScale, DEFAULT_EDGE_ALPHA};
use crate::model::FluxNetwork;
use crate::palette;

/// Converts a net flux value into an arrow weight (wedge base width).
pub const FLUX_WEIGHT_FACTOR: f64 = 5e4;
pub const EDGE_CURVATURE: f64 = 0.45;
pub const PATHWAY_CURVATURE: f64 = -0.45;
pub const PATHWAY_WEIGHT: f64 = 5.0;
pub const PATHWAY_ALPHA: f64 = 0.5;
pub const LABEL_FONT_RATIO: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct FluxDiagramOptions {
    /// Fraction of total pathway capacity to keep before rendering.
    pub fraction: f64,
    pub threshold: f64,
    pub n_pathways: Option<usize>,
    /// Overrides the committor layout.
    pub positions: Option<Vec<Point2<f64>>>,
    /// Overrides the stationary distribution used for marker sizes.
    pub mu: Option<Vec<f64>>,
    pub legend: bool,
    /// Fit an [`AlphaScale`] to the flux matrix.
    pub fancy_alpha: bool,
    /// Use the fitted alpha scale on direct edges instead of the constant.
    pub apply_alpha_scale: bool,
}

impl Default for FluxDiagramOptions {
    fn default() -> Self {
        Self {
            fraction: 1.0,
            threshold: 1e-4,
            n_pathways: None,
            positions: None,
            mu: None,
            legend: false,
            fancy_alpha: false,
            apply_alpha_scale: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateMarker {
    pub state: usize,
    pub position: Point2<f64>,
    pub size: f64,
    pub color: RGBColor,
    pub label: String,
    pub font_size: f64,
}

/// Direct net-flux arrow. It runs from the column state to the row state of
/// the flux entry it represents.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxEdge {
    pub from: usize,
    pub to: usize,
    pub flux: f64,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    pub curvature: f64,
    pub weight: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathwayArrow {
    pub pathway: usize,
    pub from: usize,
    pub to: usize,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    pub curvature: f64,
    pub weight: f64,
    pub color: RGBColor,
    pub alpha: f64,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FluxDiagram {
    pub source: usize,
    pub sink: usize,
    pub markers: Vec<StateMarker>,
    pub edges: Vec<FluxEdge>,
    pub pathway_arrows: Vec<PathwayArrow>,
    pub pathway_count: usize,
    pub legend: bool,
    pub alpha_scale: Option<AlphaScale>,
}

impl FluxDiagram {
    pub fn positions(&self) -> impl Iterator<Item = Point2<f64>> + '_ {
        self.markers.iter().map(|m| m.position)
    }

    pub fn legend_entries(&self) -> impl Iterator<Item = (&str, RGBColor)> + '_ {
        self.pathway_arrows
            .iter()
            .filter_map(|arrow| arrow.label.as_deref().map(|label| (label, arrow.color)))
    }

    /// `(start, end, curvature)` of every drawn connector, direct edges first.
    pub fn connectors(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>, f64)> + '_ {
        let edges = self.edges.iter().map(|e| (e.start, e.end, e.curvature));
        let arrows = self
            .pathway_arrows
            .iter()
            .map(|a| (a.start, a.end, a.curvature));
        edges.chain(arrows)
    }

    /// Data-space bounding box of all markers as `(x_min, x_max, y_min, y_max)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.positions().fold(
            (
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
            ),
            |(x0, x1, y0, y1), p| (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
        )
    }
}

pub fn build_flux_diagram(
    network: &FluxNetwork,
    options: &FluxDiagramOptions,
) -> Result<FluxDiagram, PlotError> {
    network.validate()?;
    let n = network.n_states;

    let pathways = network.pathways.truncate_to_fraction(options.fraction)?;
    let (source, sink) = pathways.endpoints()?;

    let positions = match &options.positions {
        Some(positions) => {
            PlotError::check_len("positions", n, positions.len())?;
            positions.clone()
        }
        None => layout::default_positions(&network.committor),
    };

    let probabilities = match &options.mu {
        Some(mu) => {
            PlotError::check_len("size scale probabilities", n, mu.len())?;
            mu.as_slice()
        }
        None => network.stationary_distribution.as_slice(),
    };
    let scale = layout::size_scale(probabilities)?;

    let alpha_scale = if options.fancy_alpha {
        AlphaScale::fit(&network.net_flux)
    } else {
        None
    };
    let edge_alpha = |flux: f64| match alpha_scale {
        Some(scale) if options.apply_alpha_scale => scale.transform(flux),
        _ => DEFAULT_EDGE_ALPHA,
    };

    let colors = palette::cycle(palette::rainbow, n);
    let markers: Vec<StateMarker> = (0..n)
        .map(|i| StateMarker {
            state: i,
            position: positions[i],
            size: scale[i],
            color: colors[i],
            label: state_label(i, source, sink),
            font_size: LABEL_FONT_RATIO * scale[i],
        })
        .collect();

    let mut edges = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let flux = network.net_flux[(i, j)];
            if i != j && flux > options.threshold {
                edges.push(FluxEdge {
                    from: j,
                    to: i,
                    flux,
                    start: positions[j],
                    end: positions[i],
                    curvature: EDGE_CURVATURE,
                    weight: FLUX_WEIGHT_FACTOR * flux,
                    alpha: edge_alpha(flux),
                });
            }
        }
    }

    let pathway_count = layout::resolve_pathway_count(options.n_pathways, pathways.len());
    let path_colors = palette::cycle(palette::coolwarm_r, pathway_count);
    let dominant_capacity = pathways.as_slice()[0].capacity;

    let mut pathway_arrows = Vec::new();
    for (k, path) in pathways.iter().take(pathway_count).enumerate() {
        let ratio = if dominant_capacity > 0.0 {
            path.capacity / dominant_capacity
        } else {
            0.0
        };
        for (step, (from, to)) in path.steps().enumerate() {
            pathway_arrows.push(PathwayArrow {
                pathway: k,
                from,
                to,
                start: positions[from],
                end: positions[to],
                curvature: PATHWAY_CURVATURE,
                weight: PATHWAY_WEIGHT,
                color: path_colors[k],
                alpha: PATHWAY_ALPHA,
                label: (step == 0).then(|| format!("({ratio:.3}, {:?})", path.states)),
            });
        }
    }

    debug!(
        "[flux] {} markers, {} direct edges, {} of {} pathways",
        markers.len(),
        edges.len(),
        pathway_count,
        pathways.len()
    );

    Ok(FluxDiagram {
        source,
        sink,
        markers,
        edges,
        pathway_arrows,
        pathway_count,
        legend: options.legend,
        alpha_scale,
    })
}

fn state_label(state: usize, source: usize, sink: usize) -> String {
    if state == source {
        "A".to_string()
    } else if state == sink {
        "B".to_string()
    } else {
        state.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PINNED_Y;
    use crate::model::{Pathway, Pathways};
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn three_state_network() -> FluxNetwork {
        let mut net_flux = DMatrix::zeros(3, 3);
        net_flux[(0, 1)] = 0.1;
        net_flux[(1, 2)] = 0.1;
        FluxNetwork {
            n_states: 3,
            net_flux,
            committor: vec![0.0, 0.5, 1.0],
            stationary_distribution: vec![0.3, 0.2, 0.5],
            pathways: vec![Pathway::new(vec![0, 1, 2], 0.1)].into_iter().collect(),
        }
    }

    fn four_state_network() -> FluxNetwork {
        FluxNetwork {
            n_states: 4,
            net_flux: DMatrix::from_element(4, 4, 1e-5),
            committor: vec![0.0, 0.3, 0.6, 1.0],
            stationary_distribution: vec![0.4, 0.1, 0.1, 0.4],
            pathways: Pathways::new(vec![
                Pathway::new(vec![0, 1, 3], 0.5),
                Pathway::new(vec![0, 2, 3], 0.25),
                Pathway::new(vec![0, 1, 2, 3], 0.05),
            ]),
        }
    }

    #[test]
    fn three_state_end_to_end() {
        let diagram = build_flux_diagram(&three_state_network(), &FluxDiagramOptions::default())
            .unwrap();

        assert_eq!(diagram.markers.len(), 3);
        assert_eq!(diagram.markers[0].position, Point2::new(0.0, PINNED_Y));
        assert_eq!(diagram.markers[2].position, Point2::new(1.0, PINNED_Y));
        assert_eq!(diagram.markers[1].position.x, 0.5);

        assert_eq!(diagram.edges.len(), 2);
        let pairs: Vec<(usize, usize)> = diagram.edges.iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(pairs, vec![(1, 0), (2, 1)]);
        assert!(diagram.edges.iter().all(|e| e.from != 2 || e.to != 0));
        for edge in &diagram.edges {
            assert_relative_eq!(edge.weight, 5e3);
            assert_relative_eq!(edge.alpha, DEFAULT_EDGE_ALPHA);
            assert_eq!(edge.curvature, EDGE_CURVATURE);
        }
    }

    #[test]
    fn labels_mark_source_and_sink() {
        let diagram = build_flux_diagram(&four_state_network(), &FluxDiagramOptions::default())
            .unwrap();
        let labels: Vec<&str> = diagram.markers.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "1", "2", "B"]);
        assert_eq!((diagram.source, diagram.sink), (0, 3));
        for marker in &diagram.markers {
            assert_relative_eq!(marker.font_size, 0.9 * marker.size);
        }
    }

    #[test]
    fn sub_threshold_flux_draws_markers_only() {
        let diagram = build_flux_diagram(&four_state_network(), &FluxDiagramOptions::default())
            .unwrap();
        assert_eq!(diagram.markers.len(), 4);
        assert!(diagram.edges.is_empty());
    }

    #[test]
    fn pathway_request_is_clamped() {
        let options = FluxDiagramOptions {
            n_pathways: Some(10),
            ..FluxDiagramOptions::default()
        };
        let diagram = build_flux_diagram(&four_state_network(), &options).unwrap();
        assert_eq!(diagram.pathway_count, 3);
        let drawn: std::collections::BTreeSet<usize> =
            diagram.pathway_arrows.iter().map(|a| a.pathway).collect();
        assert_eq!(drawn.len(), 3);
        assert_eq!(diagram.pathway_arrows.len(), 2 + 2 + 3);
    }

    #[test]
    fn pathway_request_limits_overlays() {
        let options = FluxDiagramOptions {
            n_pathways: Some(1),
            ..FluxDiagramOptions::default()
        };
        let diagram = build_flux_diagram(&four_state_network(), &options).unwrap();
        assert_eq!(diagram.pathway_count, 1);
        assert_eq!(diagram.pathway_arrows.len(), 2);
    }

    #[test]
    fn only_first_hop_of_each_path_is_labelled() {
        let diagram = build_flux_diagram(&four_state_network(), &FluxDiagramOptions::default())
            .unwrap();
        let labels: Vec<(&str, RGBColor)> = diagram.legend_entries().collect();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].0, "(1.000, [0, 1, 3])");
        assert_eq!(labels[1].0, "(0.500, [0, 2, 3])");
        assert_eq!(labels[2].0, "(0.100, [0, 1, 2, 3])");
        assert_eq!(labels[0].1, palette::coolwarm_r(0.0));
        assert_eq!(labels[2].1, palette::coolwarm_r(1.0));
    }

    #[test]
    fn fraction_drops_minor_pathways() {
        let options = FluxDiagramOptions {
            fraction: 0.9,
            ..FluxDiagramOptions::default()
        };
        let diagram = build_flux_diagram(&four_state_network(), &options).unwrap();
        assert_eq!(diagram.pathway_count, 2);
    }

    #[test]
    fn mismatched_positions_are_rejected() {
        let options = FluxDiagramOptions {
            positions: Some(vec![Point2::new(0.0, 0.0); 2]),
            ..FluxDiagramOptions::default()
        };
        let err = build_flux_diagram(&three_state_network(), &options).unwrap_err();
        assert_eq!(
            err,
            PlotError::ShapeMismatch {
                what: "positions",
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn mismatched_mu_is_rejected() {
        let options = FluxDiagramOptions {
            mu: Some(vec![0.5, 0.5]),
            ..FluxDiagramOptions::default()
        };
        assert!(matches!(
            build_flux_diagram(&three_state_network(), &options),
            Err(PlotError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn mu_override_changes_marker_sizes() {
        let options = FluxDiagramOptions {
            mu: Some(vec![0.9, 0.05, 0.05]),
            ..FluxDiagramOptions::default()
        };
        let diagram = build_flux_diagram(&three_state_network(), &options).unwrap();
        assert!(diagram.markers[0].size > diagram.markers[1].size);
        assert_relative_eq!(diagram.markers[1].size, diagram.markers[2].size);
    }

    #[test]
    fn fancy_alpha_is_fitted_but_not_applied_by_default() {
        let mut network = three_state_network();
        network.net_flux[(1, 2)] = 0.3;
        let options = FluxDiagramOptions {
            fancy_alpha: true,
            ..FluxDiagramOptions::default()
        };
        let diagram = build_flux_diagram(&network, &options).unwrap();
        assert!(diagram.alpha_scale.is_some());
        assert!(diagram.edges.iter().all(|e| e.alpha == DEFAULT_EDGE_ALPHA));

        let applied = FluxDiagramOptions {
            fancy_alpha: true,
            apply_alpha_scale: true,
            ..FluxDiagramOptions::default()
        };
        let diagram = build_flux_diagram(&network, &applied).unwrap();
        assert_relative_eq!(diagram.edges[0].alpha, 0.5);
        assert_relative_eq!(diagram.edges[1].alpha, 0.95);
    }

    #[test]
    fn connectors_list_edges_then_pathway_hops() {
        let diagram = build_flux_diagram(&three_state_network(), &FluxDiagramOptions::default())
            .unwrap();
        let connectors: Vec<_> = diagram.connectors().collect();
        assert_eq!(
            connectors.len(),
            diagram.edges.len() + diagram.pathway_arrows.len()
        );
        assert_eq!(connectors[0].2, EDGE_CURVATURE);
        assert_eq!(connectors.last().unwrap().2, PATHWAY_CURVATURE);
    }

    #[test]
    fn bounds_cover_all_markers() {
        let diagram = build_flux_diagram(&four_state_network(), &FluxDiagramOptions::default())
            .unwrap();
        let (x0, x1, y0, y1) = diagram.bounds();
        assert_eq!((x0, x1), (0.0, 1.0));
        assert_eq!(y0, 0.0);
        assert_eq!(y1, PINNED_Y);
    }
}
