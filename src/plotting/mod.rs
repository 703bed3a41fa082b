//! `plotters` drawing for every chart. Each chart has a `draw_*` function
//! that paints onto a caller-supplied drawing area and a `render_*` function
//! that creates PNG/SVG files according to the output configuration.
//!
//! Charts are painted in pixel space: a chart context is only built to map
//! data coordinates onto the backend, and frame, ticks and shapes are drawn
//! directly on the root area.

pub mod flux;
pub mod timescales;
pub mod transition;

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::axes::AxisTicks;
use crate::config::{OutputConfig, PlotConfig};
use crate::output::{artifact_path, ensure_directory};

pub use flux::{draw_flux_diagram, render_flux_diagram};
pub use timescales::{
    draw_timescale_separation, draw_timescales, render_timescale_separation, render_timescales,
};
pub use transition::{draw_transition_figure, render_transition_maps};

const FONT_FAMILY: &str = "sans-serif";
const TICK_LENGTH_PX: i32 = 8;
const LEFT_LABEL_AREA: u32 = 80;
const BOTTOM_LABEL_AREA: u32 = 70;

pub(crate) type Projection<'a> = dyn Fn(f64, f64) -> (i32, i32) + 'a;

/// Renders one chart to every enabled image format, returning the written
/// paths. `png` and `svg` paint the same chart onto the two backends.
pub(crate) fn render_formats(
    output: &OutputConfig,
    output_dir: &Path,
    suffix: &str,
    size: (u32, u32),
    png: impl Fn(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
    svg: impl Fn(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if output.export_png {
        let path = artifact_path(output, output_dir, suffix, "png");
        ensure_directory(output_dir)?;
        {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            png(&root)?;
            root.present()
                .map_err(|e| anyhow!("Failed to write PNG {}: {e:?}", path.display()))?;
        }
        written.push(path);
    }

    if output.export_svg {
        let path = artifact_path(output, output_dir, suffix, "svg");
        ensure_directory(output_dir)?;
        {
            let root = SVGBackend::new(&path, size).into_drawing_area();
            svg(&root)?;
            root.present()
                .map_err(|e| anyhow!("Failed to write SVG {}: {e:?}", path.display()))?;
        }
        written.push(path);
    }

    Ok(written)
}

pub(crate) fn chart_builder<'a, 'b, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    plot: &PlotConfig,
) -> ChartBuilder<'a, 'b, DB> {
    let mut builder = ChartBuilder::on(area);
    builder
        .margin_top(scaled(20.0, plot) as u32)
        .margin_right(scaled(30.0, plot) as u32)
        .margin_left(scaled(10.0, plot) as u32)
        .margin_bottom(scaled(10.0, plot) as u32)
        .set_label_area_size(LabelAreaPosition::Left, scaled(LEFT_LABEL_AREA as f64, plot) as u32)
        .set_label_area_size(
            LabelAreaPosition::Bottom,
            scaled(BOTTOM_LABEL_AREA as f64, plot) as u32,
        );
    builder
}

pub(crate) fn scaled(points: f64, plot: &PlotConfig) -> f64 {
    points * plot.font_scale
}

pub(crate) fn font(size: f64) -> TextStyle<'static> {
    TextStyle::from((FONT_FAMILY, size.max(1.0)).into_font()).color(&BLACK)
}

/// Converts backend coordinates into coordinates local to `area`.
pub(crate) fn to_local<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, point: (i32, i32)) -> (i32, i32) {
    let (bx, by) = area.get_base_pixel();
    (point.0 - bx, point.1 - by)
}

pub(crate) fn draw_title<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    size: f64,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (width, _) = area.dim_in_pixel();
    let style = font(size).pos(Pos::new(HPos::Center, VPos::Top));
    area.draw_text(title, &style, (width as i32 / 2, 4))?;
    Ok(())
}

/// Frame, ticks, tick labels and axis labels for the data window described
/// by `ticks`.
pub(crate) fn draw_axes<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    project: &Projection<'_>,
    ticks: &AxisTicks,
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (x0, x1) = ticks.x_range;
    let (y0, y1) = ticks.y_range;
    let (left, bottom) = to_local(area, project(x0, y0));
    let (right, top) = to_local(area, project(x1, y1));

    area.draw(&PathElement::new(
        vec![
            (left, top),
            (right, top),
            (right, bottom),
            (left, bottom),
            (left, top),
        ],
        ShapeStyle::from(&BLACK),
    ))?;

    let tick_font = scaled(ticks.tick_font_size, plot);
    let label_font = scaled(ticks.label_font_size, plot);
    let bottom_style = font(tick_font).pos(Pos::new(HPos::Center, VPos::Top));
    let left_style = font(tick_font).pos(Pos::new(HPos::Right, VPos::Center));

    for tick in ticks.x.iter().filter(|t| within(t.value, ticks.x_range)) {
        let (x, _) = to_local(area, project(tick.value, y0));
        area.draw(&PathElement::new(
            vec![(x, bottom), (x, bottom + TICK_LENGTH_PX)],
            ShapeStyle::from(&BLACK),
        ))?;
        if !tick.label.is_empty() {
            area.draw_text(&tick.label, &bottom_style, (x, bottom + TICK_LENGTH_PX + 4))?;
        }
    }

    for tick in ticks.y.iter().filter(|t| within(t.value, ticks.y_range)) {
        let (_, y) = to_local(area, project(x0, tick.value));
        area.draw(&PathElement::new(
            vec![(left, y), (left - TICK_LENGTH_PX, y)],
            ShapeStyle::from(&BLACK),
        ))?;
        if !tick.label.is_empty() {
            area.draw_text(&tick.label, &left_style, (left - TICK_LENGTH_PX - 6, y))?;
        }
    }

    if let Some(label) = &ticks.xlabel {
        let style = font(label_font).pos(Pos::new(HPos::Center, VPos::Top));
        let y = bottom + TICK_LENGTH_PX + tick_font as i32 + 12;
        area.draw_text(label, &style, ((left + right) / 2, y))?;
    }

    if let Some(label) = &ticks.ylabel {
        let style = font(label_font)
            .transform(FontTransform::Rotate270)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let x = (left - TICK_LENGTH_PX - 3 * tick_font as i32).max(label_font as i32 / 2);
        area.draw_text(label, &style, (x, (top + bottom) / 2))?;
    }

    Ok(())
}

fn within(value: f64, (lo, hi): (f64, f64)) -> bool {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let slack = (hi - lo).abs() * 1e-9;
    value >= lo - slack && value <= hi + slack
}

pub(crate) fn to_pixels(points: &[(f64, f64)]) -> Vec<(i32, i32)> {
    points
        .iter()
        .map(|&(x, y)| (x.round() as i32, y.round() as i32))
        .collect()
}

pub(crate) fn as_f64(point: (i32, i32)) -> (f64, f64) {
    (point.0 as f64, point.1 as f64)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Paints onto an in-memory RGB bitmap and returns its pixels.
    pub fn render_to_buffer(
        (width, height): (u32, u32),
        draw: impl FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
    ) -> Vec<u8> {
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            draw(&root).unwrap();
            root.present().unwrap();
        }
        buffer
    }

    /// Pixels inside `[x0, x1) × [y0, y1)` matching `pred`.
    pub fn count_pixels(
        buffer: &[u8],
        width: u32,
        (x0, x1): (u32, u32),
        (y0, y1): (u32, u32),
        pred: impl Fn([u8; 3]) -> bool,
    ) -> usize {
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| ((y * width + x) * 3) as usize))
            .filter(|&i| pred([buffer[i], buffer[i + 1], buffer[i + 2]]))
            .count()
    }

    pub fn is_white(rgb: [u8; 3]) -> bool {
        rgb == [255, 255, 255]
    }
}
