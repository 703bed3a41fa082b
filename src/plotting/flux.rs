use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;
use nalgebra::Point2;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{
    Projection, as_f64, chart_builder, draw_axes, font, render_formats, scaled, to_local,
    to_pixels,
};
use crate::axes::{AxisSpec, padded_extent};
use crate::config::{OutputConfig, PlotConfig};
use crate::curve::{CURVE_SAMPLES, arrow_head, sample_arc3, wedge_outline};
use crate::flux::FluxDiagram;

/// Pixel width of a direct edge wedge per unit of arrow weight.
const WEDGE_WIDTH_PER_WEIGHT: f64 = 0.3;
const PATHWAY_LINE_WIDTH: f64 = 1.5;
const ARROW_HEAD_PER_WEIGHT: f64 = 3.0;
const LAYOUT_PADDING: f64 = 0.15;
const EXTENT_PASSES: usize = 4;

pub fn render_flux_diagram(
    diagram: &FluxDiagram,
    output: &OutputConfig,
    output_dir: &Path,
    plot: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    let size = (plot.width_px, plot.height_px);
    let written = render_formats(
        output,
        output_dir,
        "flux",
        size,
        |area| draw_flux_diagram(area, diagram, plot),
        |area| draw_flux_diagram(area, diagram, plot),
    )?;
    info!("[flux] Rendered {} image file(s)", written.len());
    Ok(written)
}

/// Paints the flux diagram onto `area`: direct edges and pathway overlays
/// first, then state markers and labels, then the legend.
pub fn draw_flux_diagram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    diagram: &FluxDiagram,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;

    let frame = chart_builder(area, plot)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)?
        .plotting_area()
        .dim_in_pixel();
    let extent = diagram_extent(diagram, frame, plot);
    let [ex0, ex1, ey0, ey1] = extent;
    let chart = chart_builder(area, plot).build_cartesian_2d(ex0..ex1, ey0..ey1)?;
    let project = |x: f64, y: f64| chart.backend_coord(&(x, y));

    let ticks = AxisSpec {
        n_ticks: Some(6),
        ..AxisSpec::new(extent)
    }
    .with_labels(Some("committor"), None)
    .ticks()?;
    draw_axes(area, &project, &ticks, plot)?;

    draw_edges(area, &project, diagram, plot)?;
    draw_pathways(area, &project, diagram, plot)?;
    draw_markers(area, &project, diagram, plot)?;

    if diagram.legend {
        draw_legend(area, &project, diagram, (ex1, ey1), plot)?;
    }
    Ok(())
}

/// Marker bounds grown until every connector arc and marker disc fits in a
/// plotting frame of `frame` pixels, then padded by `LAYOUT_PADDING`.
fn diagram_extent(diagram: &FluxDiagram, frame: (u32, u32), plot: &PlotConfig) -> [f64; 4] {
    let (x0, x1, y0, y1) = diagram.bounds();
    let base = padded_extent((x0, x1), (y0, y1), LAYOUT_PADDING);
    let (width, height) = (frame.0.max(1) as f64, frame.1.max(1) as f64);

    let mut extent = base;
    for _ in 0..EXTENT_PASSES {
        // data units per pixel; arcs bend in screen space where y grows down
        let ux = (extent[1] - extent[0]) / width;
        let uy = (extent[3] - extent[2]) / height;
        let to_screen = |p: Point2<f64>| (p.x / ux, -p.y / uy);

        let mut bounds = (x0, x1, y0, y1);
        let mut include = |x: f64, y: f64| {
            bounds = (
                bounds.0.min(x),
                bounds.1.max(x),
                bounds.2.min(y),
                bounds.3.max(y),
            );
        };
        for (start, end, rad) in diagram.connectors() {
            for (sx, sy) in sample_arc3(to_screen(start), to_screen(end), rad, CURVE_SAMPLES) {
                include(sx * ux, -sy * uy);
            }
        }
        for marker in &diagram.markers {
            let r = marker_radius(marker.size, plot) as f64;
            include(marker.position.x - r * ux, marker.position.y - r * uy);
            include(marker.position.x + r * ux, marker.position.y + r * uy);
        }

        let grown = padded_extent((bounds.0, bounds.1), (bounds.2, bounds.3), LAYOUT_PADDING);
        extent = [
            base[0].min(grown[0]),
            base[1].max(grown[1]),
            base[2].min(grown[2]),
            base[3].max(grown[3]),
        ];
    }
    extent
}

/// Marker sizes are diameters in points.
fn marker_radius(size: f64, plot: &PlotConfig) -> i32 {
    (scaled(size, plot) / 2.0).round().max(1.0) as i32
}

fn pixel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    x: f64,
    y: f64,
) -> (f64, f64) {
    as_f64(to_local(area, project(x, y)))
}

fn draw_edges<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    diagram: &FluxDiagram,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    for edge in &diagram.edges {
        let start = pixel(area, project, edge.start.x, edge.start.y);
        let end = pixel(area, project, edge.end.x, edge.end.y);
        let width = scaled(edge.weight * WEDGE_WIDTH_PER_WEIGHT, plot).max(1.0);
        let outline = wedge_outline(start, end, edge.curvature, width, CURVE_SAMPLES);
        area.draw(&Polygon::new(
            to_pixels(&outline),
            BLACK.mix(edge.alpha).filled(),
        ))?;
    }
    Ok(())
}

fn draw_pathways<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    diagram: &FluxDiagram,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let line_width = scaled(PATHWAY_LINE_WIDTH, plot).round().max(1.0) as u32;
    for arrow in &diagram.pathway_arrows {
        let start = pixel(area, project, arrow.start.x, arrow.start.y);
        let end = pixel(area, project, arrow.end.x, arrow.end.y);
        let style = arrow.color.mix(arrow.alpha);

        let path = sample_arc3(start, end, arrow.curvature, CURVE_SAMPLES);
        area.draw(&PathElement::new(
            to_pixels(&path),
            style.stroke_width(line_width),
        ))?;

        let head = scaled(arrow.weight * ARROW_HEAD_PER_WEIGHT, plot);
        let tip = arrow_head(start, end, arrow.curvature, head, head * 0.6);
        area.draw(&Polygon::new(to_pixels(&tip), style.filled()))?;
    }
    Ok(())
}

fn draw_markers<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    diagram: &FluxDiagram,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    for marker in &diagram.markers {
        let centre = to_local(area, project(marker.position.x, marker.position.y));
        let radius = marker_radius(marker.size, plot);
        area.draw(&Circle::new(centre, radius, marker.color.filled()))?;
        area.draw(&Circle::new(centre, radius, BLACK.stroke_width(1)))?;
    }

    for marker in &diagram.markers {
        let centre = to_local(area, project(marker.position.x, marker.position.y));
        let style = TextStyle::from(
            ("sans-serif", scaled(marker.font_size, plot).max(1.0))
                .into_font()
                .style(FontStyle::Bold),
        )
        .color(&WHITE)
        .pos(Pos::new(HPos::Center, VPos::Center));
        area.draw_text(&marker.label, &style, centre)?;
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    diagram: &FluxDiagram,
    upper_right: (f64, f64),
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let entries: Vec<(&str, RGBColor)> = diagram.legend_entries().collect();
    if entries.is_empty() {
        return Ok(());
    }

    let font_size = scaled(16.0, plot);
    let row = (font_size * 1.5).round() as i32;
    let swatch = (font_size * 2.0).round() as i32;
    let longest = entries.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let width = swatch + 18 + (longest as f64 * font_size * 0.55).round() as i32;
    let height = row * entries.len() as i32 + 10;

    let (right, top) = to_local(area, project(upper_right.0, upper_right.1));
    let (left, top) = (right - width - 10, top + 10);

    area.draw(&Rectangle::new(
        [(left, top), (left + width, top + height)],
        WHITE.mix(0.8).filled(),
    ))?;
    area.draw(&Rectangle::new(
        [(left, top), (left + width, top + height)],
        ShapeStyle::from(&BLACK),
    ))?;

    let style = font(font_size).pos(Pos::new(HPos::Left, VPos::Center));
    for (k, (label, color)) in entries.iter().enumerate() {
        let y = top + 5 + row * k as i32 + row / 2;
        area.draw(&PathElement::new(
            vec![(left + 6, y), (left + 6 + swatch, y)],
            color.mix(0.5).stroke_width(3),
        ))?;
        area.draw_text(label, &style, (left + 12 + swatch, y))?;
    }
    Ok(())
}
