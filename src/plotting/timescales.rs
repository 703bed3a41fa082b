use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::{Projection, chart_builder, draw_axes, render_formats, scaled, to_local};
use crate::axes::{AxisSpec, AxisTicks};
use crate::config::{OutputConfig, PlotConfig};
use crate::timescales::TimescaleSeries;

const LAG_REGION: RGBColor = RGBColor(31, 119, 180);
const LAG_REGION_ALPHA: f64 = 0.35;
const ERROR_BAND_ALPHA: f64 = 0.25;
const LINE_WIDTH: f64 = 2.0;
const SEPARATION_MARKER_RADIUS: f64 = 6.0;
const SEPARATION_MAX_TICKS: usize = 10;

pub fn render_timescales(
    series: &TimescaleSeries,
    output: &OutputConfig,
    output_dir: &Path,
    plot: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    let written = render_formats(
        output,
        output_dir,
        "timescales",
        (plot.width_px, plot.height_px),
        |area| draw_timescales(area, series, plot),
        |area| draw_timescales(area, series, plot),
    )?;
    info!("[timescales] Rendered {} image file(s)", written.len());
    Ok(written)
}

pub fn render_timescale_separation(
    separation: &[(usize, f64)],
    xlim: Option<(f64, f64)>,
    output: &OutputConfig,
    output_dir: &Path,
    plot: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    let written = render_formats(
        output,
        output_dir,
        "timescale_separation",
        (plot.width_px, plot.height_px),
        |area| draw_timescale_separation(area, separation, xlim, plot),
        |area| draw_timescale_separation(area, separation, xlim, plot),
    )?;
    info!(
        "[timescales] Rendered {} separation image file(s)",
        written.len()
    );
    Ok(written)
}

/// Implied timescales against lag time, with the region below the lag line
/// shaded, optional error bands and an optional marker at the chosen lag.
pub fn draw_timescales<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &TimescaleSeries,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;

    let x0 = series.lags.iter().copied().fold(f64::INFINITY, f64::min);
    let mut x1 = series.lags.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if x1 <= x0 {
        x1 = x0 + 1.0;
    }
    let top = series.max_timescale() * 1.1;
    if !top.is_finite() || top <= 0.0 {
        bail!("implied timescales must contain a positive finite value");
    }

    let spec = AxisSpec {
        n_ticks: Some(6),
        precision: 1,
        ..AxisSpec::new([x0, x1, 0.0, top])
    }
    .with_labels(Some("lag time"), Some("implied timescale"));

    if series.log_scale {
        let bottom = smallest_positive(series).unwrap_or(1.0).min(top / 10.0) * 0.9;
        let ticks = AxisSpec {
            extent: [x0, x1, bottom, top],
            ..spec
        }
        .ticks()?
        .with_log_y();
        let chart =
            chart_builder(area, plot).build_cartesian_2d(x0..x1, (bottom..top).log_scale())?;
        paint_timescales(area, &|x: f64, y: f64| chart.backend_coord(&(x, y)), series, &ticks, plot)
    } else {
        let ticks = spec.ticks()?;
        let chart = chart_builder(area, plot).build_cartesian_2d(x0..x1, 0.0..top)?;
        paint_timescales(area, &|x: f64, y: f64| chart.backend_coord(&(x, y)), series, &ticks, plot)
    }
}

fn smallest_positive(series: &TimescaleSeries) -> Option<f64> {
    series
        .processes
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .reduce(f64::min)
}

fn paint_timescales<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    series: &TimescaleSeries,
    ticks: &AxisTicks,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (y_lo, y_hi) = ticks.y_range;
    let clamp = |v: f64| v.clamp(y_lo, y_hi);
    let at = |x: f64, y: f64| to_local(area, project(x, clamp(y)));

    // region below the lag line
    let mut region: Vec<(i32, i32)> = series.lags.iter().map(|&lag| at(lag, lag)).collect();
    region.extend(series.lags.iter().rev().map(|&lag| at(lag, y_lo)));
    area.draw(&Polygon::new(region, LAG_REGION.mix(LAG_REGION_ALPHA).filled()))?;

    if let Some(bands) = series.error_bands() {
        for band in bands {
            let mut outline: Vec<(i32, i32)> =
                band.iter().map(|&(lag, _, upper)| at(lag, upper)).collect();
            outline.extend(band.iter().rev().map(|&(lag, lower, _)| at(lag, lower)));
            area.draw(&Polygon::new(outline, BLACK.mix(ERROR_BAND_ALPHA).filled()))?;
        }
    }

    let width = scaled(LINE_WIDTH, plot).round().max(1.0) as u32;
    for process in &series.processes {
        let points: Vec<(i32, i32)> = series
            .lags
            .iter()
            .zip(process)
            .filter(|(_, its)| its.is_finite())
            .map(|(&lag, &its)| at(lag, its))
            .collect();
        area.draw(&PathElement::new(points, BLACK.stroke_width(width)))?;
    }

    if let Some((tau, from, to)) = series.tau_marker() {
        area.draw(&PathElement::new(
            vec![at(tau, from), at(tau, to)],
            BLACK.stroke_width(width),
        ))?;
    }

    draw_axes(area, project, ticks, plot)
}

/// Ratios of consecutive implied timescales as points at `1..=n`.
pub fn draw_timescale_separation<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    separation: &[(usize, f64)],
    xlim: Option<(f64, f64)>,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    if separation.is_empty() {
        bail!("timescale separation has no ratios to draw");
    }

    let ticks = separation_ticks(separation, xlim)?;
    let (x0, x1) = ticks.x_range;
    let (y0, y1) = ticks.y_range;
    let chart = chart_builder(area, plot).build_cartesian_2d(x0..x1, y0..y1)?;
    let project = |x: f64, y: f64| chart.backend_coord(&(x, y));

    let radius = scaled(SEPARATION_MARKER_RADIUS, plot).round().max(1.0) as i32;
    for &(k, ratio) in separation {
        let x = k as f64;
        if !ratio.is_finite() || x < x0.min(x1) || x > x0.max(x1) {
            continue;
        }
        area.draw(&Circle::new(
            to_local(area, project(x, ratio)),
            radius,
            BLACK.filled(),
        ))?;
    }

    draw_axes(area, &project, &ticks, plot)
}

/// Whole-number process ticks on x, one-decimal ratio ticks on y.
fn separation_ticks(separation: &[(usize, f64)], xlim: Option<(f64, f64)>) -> Result<AxisTicks> {
    let count = separation.len();
    let xlim = xlim.unwrap_or((0.5, count as f64 + 0.5));
    let top = separation
        .iter()
        .map(|&(_, ratio)| ratio)
        .filter(|r| r.is_finite())
        .fold(1.0_f64, f64::max)
        * 1.1;

    let ticks = AxisSpec {
        n_ticks: Some(6),
        precision: 1,
        xlim: Some(xlim),
        ..AxisSpec::new([1.0, (count as f64).max(2.0), 0.0, top])
    }
    .with_labels(Some("process"), Some("timescale separation"))
    .ticks()?
    .with_integer_x(count, SEPARATION_MAX_TICKS);
    Ok(ticks)
}
