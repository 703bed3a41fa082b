use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::PlotError;

/// One reactive pathway from the source state to the sink state together
/// with the share of reactive flux it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    pub states: Vec<usize>,
    pub capacity: f64,
}

impl Pathway {
    pub fn new(states: Vec<usize>, capacity: f64) -> Self {
        Self { states, capacity }
    }

    pub fn source(&self) -> Option<usize> {
        self.states.first().copied()
    }

    pub fn sink(&self) -> Option<usize> {
        self.states.last().copied()
    }

    /// Consecutive `(from, to)` hops along the path.
    pub fn steps(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.states.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Pathway decomposition sorted by decreasing capacity; the first entry is
/// the dominant pathway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pathways {
    paths: Vec<Pathway>,
}

impl Pathways {
    pub fn new(paths: Vec<Pathway>) -> Self {
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pathway> {
        self.paths.iter()
    }

    pub fn as_slice(&self) -> &[Pathway] {
        &self.paths
    }

    pub fn total_capacity(&self) -> f64 {
        self.paths.iter().map(|p| p.capacity).sum()
    }

    /// Source (`A`) and sink (`B`) taken from the dominant pathway.
    pub fn endpoints(&self) -> Result<(usize, usize), PlotError> {
        let dominant = self
            .paths
            .first()
            .ok_or_else(|| PlotError::invalid("pathway list is empty"))?;
        match (dominant.source(), dominant.sink()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(PlotError::invalid("dominant pathway visits no states")),
        }
    }

    /// Keep the leading pathways until their cumulative capacity reaches
    /// `fraction` of the total capacity. At least one pathway is kept.
    pub fn truncate_to_fraction(&self, fraction: f64) -> Result<Pathways, PlotError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(PlotError::invalid(format!(
                "pathway fraction must be in (0, 1], got {fraction}"
            )));
        }
        if self.paths.is_empty() {
            return Ok(self.clone());
        }

        let target = fraction * self.total_capacity();
        let mut cumulative = 0.0;
        let mut kept = Vec::new();
        for path in &self.paths {
            cumulative += path.capacity;
            kept.push(path.clone());
            if cumulative >= target {
                break;
            }
        }
        Ok(Pathways::new(kept))
    }
}

impl FromIterator<Pathway> for Pathways {
    fn from_iter<I: IntoIterator<Item = Pathway>>(iter: I) -> Self {
        Pathways::new(iter.into_iter().collect())
    }
}

/// Transition path theory results for a coarse-grained model: everything
/// the flux diagram needs from the modelling side.
#[derive(Debug, Clone)]
pub struct FluxNetwork {
    pub n_states: usize,
    pub net_flux: DMatrix<f64>,
    pub committor: Vec<f64>,
    pub stationary_distribution: Vec<f64>,
    pub pathways: Pathways,
}

impl FluxNetwork {
    pub fn validate(&self) -> Result<(), PlotError> {
        let n = self.n_states;
        PlotError::check_len("net flux rows", n, self.net_flux.nrows())?;
        PlotError::check_len("net flux columns", n, self.net_flux.ncols())?;
        PlotError::check_len("committor", n, self.committor.len())?;
        PlotError::check_len(
            "stationary distribution",
            n,
            self.stationary_distribution.len(),
        )?;
        for path in self.pathways.iter() {
            if let Some(&index) = path.states.iter().find(|&&s| s >= n) {
                return Err(PlotError::IndexOutOfBounds {
                    what: "pathway state",
                    index,
                    len: n,
                });
            }
        }
        Ok(())
    }
}
