//! JSON input files consumed by the binary.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::{DMatrix, Point2};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::PlotError;
use crate::model::{FluxNetwork, Pathway, Pathways};
use crate::timescales::TimescaleSeries;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Unable to open {what} input {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {what} input {}", path.display()))
}

#[derive(Debug, Clone, Deserialize)]
struct FluxInputFile {
    net_flux: Vec<Vec<f64>>,
    committor: Vec<f64>,
    stationary_distribution: Vec<f64>,
    pathways: Vec<Pathway>,
    #[serde(default)]
    positions: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    mu: Option<Vec<f64>>,
}

/// Flux network plus the optional layout overrides stored next to it.
#[derive(Debug, Clone)]
pub struct FluxInput {
    pub network: FluxNetwork,
    pub positions: Option<Vec<Point2<f64>>>,
    pub mu: Option<Vec<f64>>,
}

pub fn load_flux_input(path: &Path) -> Result<FluxInput> {
    let raw: FluxInputFile = read_json(path, "flux")?;
    let n = raw.net_flux.len();
    for row in &raw.net_flux {
        PlotError::check_len("net flux row", n, row.len())
            .with_context(|| format!("Malformed flux matrix in {}", path.display()))?;
    }

    let net_flux = DMatrix::from_fn(n, n, |i, j| raw.net_flux[i][j]);
    Ok(FluxInput {
        network: FluxNetwork {
            n_states: n,
            net_flux,
            committor: raw.committor,
            stationary_distribution: raw.stationary_distribution,
            pathways: Pathways::new(raw.pathways),
        },
        positions: raw
            .positions
            .map(|points| points.into_iter().map(|[x, y]| Point2::new(x, y)).collect()),
        mu: raw.mu,
    })
}

#[derive(Debug, Clone, Deserialize)]
struct TimescaleInputFile {
    #[serde(default)]
    lags: Option<Vec<f64>>,
    timescales: Vec<Vec<f64>>,
    #[serde(default)]
    errors: Option<Vec<Vec<f64>>>,
    /// `null` entries stand for an infinite timescale.
    #[serde(default)]
    separation: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone)]
pub struct TimescaleInput {
    pub series: TimescaleSeries,
    /// Timescales at a single lag, slowest first.
    pub separation: Vec<f64>,
}

/// Without `lags` the sample indices are used. Without `separation` the
/// timescales at the last lag are used.
pub fn load_timescale_input(path: &Path) -> Result<TimescaleInput> {
    let raw: TimescaleInputFile = read_json(path, "timescale")?;

    let separation = match raw.separation {
        Some(values) => values
            .into_iter()
            .map(|v| v.unwrap_or(f64::INFINITY))
            .collect(),
        None => raw
            .timescales
            .iter()
            .filter_map(|process| process.last().copied())
            .collect(),
    };

    let mut series = match raw.lags {
        Some(lags) => TimescaleSeries::new(lags, Some(raw.timescales))?,
        None if raw.timescales.len() == 1 => {
            let single = raw.timescales.into_iter().flatten().collect();
            TimescaleSeries::new(single, None)?
        }
        None => {
            let len = raw.timescales.first().map_or(0, Vec::len);
            let lags = (0..len).map(|i| i as f64).collect();
            TimescaleSeries::new(lags, Some(raw.timescales))?
        }
    };
    if let Some(errors) = raw.errors {
        series = series
            .with_errors(errors)
            .with_context(|| format!("Timescale errors do not match in {}", path.display()))?;
    }

    Ok(TimescaleInput { series, separation })
}

/// Continuous observable and macrostate label per frame, one entry per
/// trajectory.
#[derive(Debug, Clone, Deserialize)]
pub struct TrajectoryInput {
    pub data: Vec<Vec<f64>>,
    pub labels: Vec<Vec<usize>>,
}

pub fn load_trajectory_input(path: &Path) -> Result<TrajectoryInput> {
    read_json(path, "trajectory")
}
