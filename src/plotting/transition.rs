use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{
    Projection, chart_builder, draw_axes, draw_title, font, render_formats, scaled, to_local,
};
use crate::axes::AxisSpec;
use crate::config::{OutputConfig, PlotConfig};
use crate::contour::{contour_levels, iso_segments};
use crate::palette::{cycle, gray_r, rainbow};
use crate::transition::{TextLabel, TransitionFigure, TransitionPanel};

const FILL_LEVELS: usize = 30;
const FILL_ALPHA: f64 = 0.75;
const CONTOUR_LEVELS: usize = 10;
const DIAGONAL_DASHES: usize = 40;
const TITLE_FONT_BUDGET: f64 = 50.0;
const TITLE_AREA_PX: u32 = 60;

pub fn render_transition_maps(
    figures: &[TransitionFigure],
    text_labels: &[TextLabel],
    output: &OutputConfig,
    output_dir: &Path,
    plot: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (k, figure) in figures.iter().enumerate() {
        let name_labels = k + 1 == figures.len();
        let size = (plot.width_px * figure.columns.max(1) as u32 / 2, plot.height_px / 2);
        let suffix = format!("transition_{}", figure.origin);
        written.extend(render_formats(
            output,
            output_dir,
            &suffix,
            size,
            |area| draw_transition_figure(area, figure, text_labels, name_labels, plot),
            |area| draw_transition_figure(area, figure, text_labels, name_labels, plot),
        )?);
    }
    info!(
        "[transition] Rendered {} figure(s) into {} image file(s)",
        figures.len(),
        written.len()
    );
    Ok(written)
}

/// One row of panels, one per target state. Label names are written on the
/// last panel only when `name_labels` is set.
pub fn draw_transition_figure<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &TransitionFigure,
    text_labels: &[TextLabel],
    name_labels: bool,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    let columns = figure.columns.max(1);
    let cells = area.split_evenly((1, columns));
    let last_column = figure.panels.iter().map(|p| p.column).max();

    for panel in &figure.panels {
        let Some(cell) = cells.get(panel.column) else {
            continue;
        };
        let names = name_labels && Some(panel.column) == last_column;
        draw_panel(cell, figure, panel, columns, text_labels, names, plot)?;
    }
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    cell: &DrawingArea<DB, Shift>,
    figure: &TransitionFigure,
    panel: &TransitionPanel,
    columns: usize,
    text_labels: &[TextLabel],
    names: bool,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let title_px = scaled(TITLE_AREA_PX as f64, plot) as u32;
    let (title_area, body) = cell.split_vertically(title_px);
    let title = format!("P(χ(t+τ)={} | χ(t)={})", panel.target, figure.origin);
    draw_title(&title_area, &title, scaled(TITLE_FONT_BUDGET / columns as f64, plot))?;

    let (lo, hi) = panel.range;
    let chart = chart_builder(&body, plot).build_cartesian_2d(lo..hi, lo..hi)?;
    let project = |x: f64, y: f64| chart.backend_coord(&(x, y));

    draw_density(&body, &project, panel)?;
    draw_contours(&body, &project, panel)?;
    draw_diagonal(&body, &project, (lo, hi), plot)?;
    draw_text_labels(&body, &project, panel, text_labels, names, plot)?;

    let ylabel = (panel.column == 0).then_some("χ(t+τ)");
    let ticks = AxisSpec {
        n_ticks: Some(5),
        fontsize: 20.0,
        ..AxisSpec::new([lo, hi, lo, hi])
    }
    .with_labels(Some("χ(t)"), ylabel)
    .ticks()?;
    draw_axes(&body, &project, &ticks, plot)
}

/// Filled bins quantised to `FILL_LEVELS` grey levels.
fn draw_density<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    panel: &TransitionPanel,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let peak = panel.density.max();
    if peak <= 0.0 {
        return Ok(());
    }
    let bins = panel.density.nrows();
    let (lo, hi) = panel.range;
    let width = (hi - lo) / bins as f64;

    for row in 0..bins {
        for col in 0..bins {
            let value = panel.density[(row, col)];
            let level = (value / peak * FILL_LEVELS as f64).floor().min(FILL_LEVELS as f64);
            if level <= 0.0 {
                continue;
            }
            let shade = gray_r(level / FILL_LEVELS as f64);
            let x = lo + width * col as f64;
            let y = lo + width * row as f64;
            area.draw(&Rectangle::new(
                [
                    to_local(area, project(x, y + width)),
                    to_local(area, project(x + width, y)),
                ],
                shade.mix(FILL_ALPHA).filled(),
            ))?;
        }
    }
    Ok(())
}

fn draw_contours<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    panel: &TransitionPanel,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let centres = panel.bin_centres();
    for level in contour_levels(panel.density.min(), panel.density.max(), CONTOUR_LEVELS) {
        for ((x0, y0), (x1, y1)) in iso_segments(&panel.density, &centres, &centres, level) {
            area.draw(&PathElement::new(
                vec![
                    to_local(area, project(x0, y0)),
                    to_local(area, project(x1, y1)),
                ],
                ShapeStyle::from(&BLACK),
            ))?;
        }
    }
    Ok(())
}

fn draw_diagonal<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    (lo, hi): (f64, f64),
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let step = (hi - lo) / DIAGONAL_DASHES as f64;
    let width = scaled(2.0, plot).round().max(1.0) as u32;
    for k in (0..DIAGONAL_DASHES).step_by(2) {
        let a = lo + step * k as f64;
        let b = a + step;
        area.draw(&PathElement::new(
            vec![
                to_local(area, project(a, a)),
                to_local(area, project(b, b)),
            ],
            BLACK.mix(0.75).stroke_width(width),
        ))?;
    }
    Ok(())
}

/// Reference lines through each label point, kept inside the panel window.
/// Names are written only where their anchor falls inside the window.
fn draw_text_labels<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    panel: &TransitionPanel,
    text_labels: &[TextLabel],
    names: bool,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let colors = cycle(rainbow, text_labels.len());
    let width = scaled(2.0, plot).round().max(1.0) as u32;

    for (k, (label, color)) in text_labels.iter().zip(&colors).enumerate() {
        for ((x0, y0), (x1, y1)) in panel.reference_lines(label) {
            area.draw(&PathElement::new(
                vec![
                    to_local(area, project(x0, y0)),
                    to_local(area, project(x1, y1)),
                ],
                color.stroke_width(width),
            ))?;
        }

        let (x, y) = panel.name_anchor(k);
        if names && panel.contains(x, y) {
            let text = font(scaled(18.0, plot))
                .color(color)
                .pos(Pos::new(HPos::Left, VPos::Bottom));
            area.draw_text(&label.name, &text, to_local(area, project(x, y)))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plotting::testing::{count_pixels, is_white, render_to_buffer};
    use nalgebra::DMatrix;

    const SIZE: (u32, u32) = (600, 300);

    fn plot() -> PlotConfig {
        PlotConfig {
            width_px: SIZE.0,
            height_px: SIZE.1,
            font_scale: 0.5,
        }
    }

    /// Two columns with only the right one sampled, over `[0.5, 1]`.
    fn right_column_only() -> TransitionFigure {
        let mut density = DMatrix::zeros(4, 4);
        density[(1, 1)] = 0.5;
        density[(2, 2)] = 0.5;
        TransitionFigure {
            origin: 0,
            columns: 2,
            panels: vec![TransitionPanel {
                column: 1,
                target: 1,
                density,
                range: (0.5, 1.0),
                samples: 2,
            }],
        }
    }

    fn labels() -> Vec<TextLabel> {
        vec![
            TextLabel {
                name: "outside".to_string(),
                x: 0.0,
                y: 0.0,
            },
            TextLabel {
                name: "inside".to_string(),
                x: 0.75,
                y: 0.75,
            },
        ]
    }

    #[test]
    fn empty_column_stays_blank() {
        let figure = right_column_only();
        let buffer = render_to_buffer(SIZE, |area| {
            draw_transition_figure(area, &figure, &labels(), true, &plot())
        });

        let (width, height) = SIZE;
        let left = count_pixels(&buffer, width, (0, width / 2), (0, height), |p| !is_white(p));
        let right = count_pixels(&buffer, width, (width / 2, width), (0, height), |p| !is_white(p));
        assert_eq!(left, 0);
        assert!(right > 0);
    }

    #[test]
    fn figure_without_panels_is_white() {
        let figure = TransitionFigure {
            origin: 3,
            columns: 1,
            panels: Vec::new(),
        };
        let buffer = render_to_buffer((200, 200), |area| {
            draw_transition_figure(area, &figure, &[], false, &plot())
        });
        assert_eq!(count_pixels(&buffer, 200, (0, 200), (0, 200), |p| !is_white(p)), 0);
    }
}
