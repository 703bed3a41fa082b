use crate::error::PlotError;
use crate::layout::linspace;

/// Tick placement and labelling for a 2D chart: evenly spaced ticks across
/// an extent, formatted to a fixed precision.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    /// `[x_min, x_max, y_min, y_max]`.
    pub extent: [f64; 4],
    pub precision: usize,
    /// `None` leaves the axes without ticks.
    pub n_ticks: Option<usize>,
    pub fontsize: f64,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub xticklabels: bool,
    pub yticklabels: bool,
}

impl AxisSpec {
    pub fn new(extent: [f64; 4]) -> Self {
        Self {
            extent,
            precision: 2,
            n_ticks: Some(7),
            fontsize: 25.0,
            xlim: None,
            ylim: None,
            xlabel: None,
            ylabel: None,
            xticklabels: true,
            yticklabels: true,
        }
    }

    pub fn with_labels(mut self, xlabel: Option<&str>, ylabel: Option<&str>) -> Self {
        self.xlabel = xlabel.map(str::to_string);
        self.ylabel = ylabel.map(str::to_string);
        self
    }

    pub fn ticks(&self) -> Result<AxisTicks, PlotError> {
        if self.n_ticks == Some(0) {
            return Err(PlotError::invalid("n_ticks must be positive when set"));
        }
        let [x0, x1, y0, y1] = self.extent;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) {
            return Err(PlotError::invalid(format!(
                "axis extent must be finite, got {:?}",
                self.extent
            )));
        }

        let make = |lo: f64, hi: f64, labelled: bool| -> Vec<Tick> {
            match self.n_ticks {
                None => Vec::new(),
                Some(count) => linspace(lo, hi, count)
                    .into_iter()
                    .map(|value| Tick {
                        value,
                        label: if labelled {
                            format!("{value:.prec$}", prec = self.precision)
                        } else {
                            String::new()
                        },
                    })
                    .collect(),
            }
        };

        Ok(AxisTicks {
            x_range: self.xlim.unwrap_or((x0, x1)),
            y_range: self.ylim.unwrap_or((y0, y1)),
            x: make(x0, x1, self.xticklabels),
            y: make(y0, y1, self.yticklabels),
            xlabel: self.xlabel.clone(),
            ylabel: self.ylabel.clone(),
            label_font_size: self.fontsize,
            tick_font_size: 0.75 * self.fontsize,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisTicks {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub x: Vec<Tick>,
    pub y: Vec<Tick>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub label_font_size: f64,
    pub tick_font_size: f64,
}

impl AxisTicks {
    /// Replace the y ticks with one tick per power of ten inside the y range.
    pub fn with_log_y(mut self) -> Self {
        let (lo, hi) = self.y_range;
        self.y = decade_ticks(lo, hi);
        self
    }

    /// Replace the x ticks with integer positions `1..=count`, at most
    /// `max_ticks` of them.
    pub fn with_integer_x(mut self, count: usize, max_ticks: usize) -> Self {
        self.x = integer_ticks(count, max_ticks);
        self
    }
}

/// Ticks on `1..=count` with the smallest integer stride that keeps at most
/// `max_ticks` of them.
pub fn integer_ticks(count: usize, max_ticks: usize) -> Vec<Tick> {
    if count == 0 || max_ticks == 0 {
        return Vec::new();
    }
    let stride = count.div_ceil(max_ticks);
    (1..=count)
        .step_by(stride)
        .map(|k| Tick {
            value: k as f64,
            label: k.to_string(),
        })
        .collect()
}

pub fn decade_ticks(lo: f64, hi: f64) -> Vec<Tick> {
    if !(lo > 0.0 && hi > lo) {
        return Vec::new();
    }
    let first = lo.log10().ceil() as i32;
    let last = hi.log10().floor() as i32;
    (first..=last)
        .map(|exp| Tick {
            value: 10f64.powi(exp),
            label: format!("1e{exp}"),
        })
        .collect()
}

/// Extent padded by `fraction` of its span on every side; a zero span is
/// widened by 0.5.
pub fn padded_extent(x: (f64, f64), y: (f64, f64), fraction: f64) -> [f64; 4] {
    let pad = |(lo, hi): (f64, f64)| {
        let span = hi - lo;
        if span.abs() < 1e-12 {
            (lo - 0.5, hi + 0.5)
        } else {
            (lo - span * fraction, hi + span * fraction)
        }
    };
    let (x0, x1) = pad(x);
    let (y0, y1) = pad(y);
    [x0, x1, y0, y1]
}
