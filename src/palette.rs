//! Colour cycles used by the charts. Each map takes a position in `[0, 1]`
//! and returns an opaque RGB colour; alpha is applied at draw time.

use plotters::style::RGBColor;

use crate::layout::linspace;

// Anchor points of the diverging cool-warm map, blue end first.
const COOLWARM: [(f64, (f64, f64, f64)); 5] = [
    (0.0, (59.0, 76.0, 192.0)),
    (0.25, (141.0, 176.0, 254.0)),
    (0.5, (221.0, 221.0, 221.0)),
    (0.75, (244.0, 154.0, 123.0)),
    (1.0, (180.0, 4.0, 38.0)),
];

pub fn rainbow(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let r = (2.0 * t - 0.5).abs();
    let g = (std::f64::consts::PI * t).sin();
    let b = (std::f64::consts::FRAC_PI_2 * t).cos();
    rgb(r, g, b)
}

/// Reversed cool-warm: red at 0, blue at 1.
pub fn coolwarm_r(t: f64) -> RGBColor {
    let t = 1.0 - t.clamp(0.0, 1.0);
    let upper = COOLWARM
        .iter()
        .position(|(anchor, _)| *anchor >= t)
        .unwrap_or(COOLWARM.len() - 1)
        .max(1);
    let (t0, c0) = COOLWARM[upper - 1];
    let (t1, c1) = COOLWARM[upper];
    let w = (t - t0) / (t1 - t0);
    RGBColor(
        lerp_channel(c0.0, c1.0, w),
        lerp_channel(c0.1, c1.1, w),
        lerp_channel(c0.2, c1.2, w),
    )
}

/// Reversed grey scale: white at 0, black at 1.
pub fn gray_r(t: f64) -> RGBColor {
    let level = 1.0 - t.clamp(0.0, 1.0);
    rgb(level, level, level)
}

/// `count` colours evenly spaced across a map, like sampling a matplotlib
/// colormap at `linspace(0, 1, count)`.
pub fn cycle(map: fn(f64) -> RGBColor, count: usize) -> Vec<RGBColor> {
    linspace(0.0, 1.0, count).into_iter().map(map).collect()
}

fn rgb(r: f64, g: f64, b: f64) -> RGBColor {
    RGBColor(to_channel(r), to_channel(g), to_channel(b))
}

fn to_channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn lerp_channel(a: f64, b: f64, w: f64) -> u8 {
    (a + (b - a) * w).round().clamp(0.0, 255.0) as u8
}
