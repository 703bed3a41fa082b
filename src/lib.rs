pub mod axes;
pub mod cli;
pub mod config;
pub mod contour;
pub mod curve;
pub mod error;
pub mod flux;
pub mod input;
pub mod layout;
pub mod model;
pub mod output;
pub mod palette;
pub mod pipeline;
pub mod plotting;
pub mod timescales;
pub mod transition;

pub use axes::{AxisSpec, AxisTicks};
pub use error::PlotError;
pub use flux::{FluxDiagram, FluxDiagramOptions, build_flux_diagram};
pub use model::{FluxNetwork, Pathway, Pathways};
pub use timescales::{TimescaleSeries, timescale_separation};
pub use transition::{TextLabel, TransitionFigure, TransitionMapOptions, conditional_transition_map};
