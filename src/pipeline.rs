//! Runs every chart section enabled in the configuration and collects the
//! written files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::config::{AppConfig, FluxConfig, TimescalesConfig, TransitionConfig};
use crate::flux::{FluxDiagramOptions, build_flux_diagram};
use crate::input::{load_flux_input, load_timescale_input, load_trajectory_input};
use crate::output::{artifact_path, write_layout_json, write_separation_csv};
use crate::plotting;
use crate::timescales::timescale_separation;
use crate::transition::{TransitionMapOptions, conditional_transition_map};

pub fn run(app: &AppConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if let Some(flux) = &app.settings.flux {
        written.extend(run_flux(app, flux)?);
    }
    if let Some(timescales) = &app.settings.timescales {
        written.extend(run_timescales(app, timescales)?);
    }
    if let Some(transition) = &app.settings.transition {
        written.extend(run_transition(app, transition)?);
    }
    Ok(written)
}

pub fn run_flux(app: &AppConfig, config: &FluxConfig) -> Result<Vec<PathBuf>> {
    let input_path = app.resolve_input(&config.input);
    let input = load_flux_input(&input_path)?;
    let options = FluxDiagramOptions {
        fraction: config.fraction,
        threshold: config.threshold,
        n_pathways: config.n_pathways,
        positions: input.positions,
        mu: input.mu,
        legend: config.legend,
        fancy_alpha: config.fancy_alpha,
        apply_alpha_scale: config.apply_alpha_scale,
    };
    let diagram = build_flux_diagram(&input.network, &options)
        .with_context(|| format!("Cannot build flux diagram from {}", input_path.display()))?;
    info!(
        "[flux] {} states, {} edges above {:e}, {} pathway(s) from {} to {}",
        diagram.markers.len(),
        diagram.edges.len(),
        config.threshold,
        diagram.pathway_count,
        diagram.source,
        diagram.sink
    );

    let output = &app.settings.output;
    let output_dir = &app.resolved_output_dir;
    let mut written =
        plotting::render_flux_diagram(&diagram, output, output_dir, &app.settings.plot)?;
    if output.export_json {
        let path = artifact_path(output, output_dir, "flux_layout", "json");
        write_layout_json(&path, &diagram)?;
        written.push(path);
    }
    Ok(written)
}

pub fn run_timescales(app: &AppConfig, config: &TimescalesConfig) -> Result<Vec<PathBuf>> {
    let input_path = app.resolve_input(&config.input);
    let input = load_timescale_input(&input_path)?;
    let series = input
        .series
        .with_tau(config.tau)
        .with_log_scale(config.log_scale);
    info!(
        "[timescales] {} process(es) over {} lag(s)",
        series.processes.len(),
        series.lags.len()
    );

    let output = &app.settings.output;
    let output_dir = &app.resolved_output_dir;
    let plot = &app.settings.plot;
    let mut written = plotting::render_timescales(&series, output, output_dir, plot)?;

    if config.separation {
        let separation = timescale_separation(&input.separation).with_context(|| {
            format!("Cannot compute timescale separation from {}", input_path.display())
        })?;
        let xlim = config.separation_xlim.map(|[lo, hi]| (lo, hi));
        written.extend(plotting::render_timescale_separation(
            &separation,
            xlim,
            output,
            output_dir,
            plot,
        )?);
        if output.export_csv {
            let path = artifact_path(output, output_dir, "timescale_separation", "csv");
            write_separation_csv(&path, &separation)?;
            written.push(path);
        }
    }
    Ok(written)
}

pub fn run_transition(app: &AppConfig, config: &TransitionConfig) -> Result<Vec<PathBuf>> {
    let input_path = app.resolve_input(&config.input);
    let input = load_trajectory_input(&input_path)?;
    let options = TransitionMapOptions {
        lag: config.lag,
        bins: config.bins,
    };
    let figures = conditional_transition_map(
        &config.origin,
        &config.target,
        &input.data,
        &input.labels,
        options,
    )
    .with_context(|| format!("Cannot estimate transition maps from {}", input_path.display()))?;
    info!(
        "[transition] {} trajectory(ies), {} figure(s) with {} panel(s)",
        input.data.len(),
        figures.len(),
        figures.iter().map(|f| f.panels.len()).sum::<usize>()
    );

    plotting::render_transition_maps(
        &figures,
        &config.text_labels,
        &app.settings.output,
        &app.resolved_output_dir,
        &app.settings.plot,
    )
}
