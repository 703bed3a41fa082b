use crate::error::PlotError;

/// Implied timescales of one or more relaxation processes as a function of
/// lag time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimescaleSeries {
    pub lags: Vec<f64>,
    /// One series per process, each aligned with `lags`.
    pub processes: Vec<Vec<f64>>,
    pub errors: Option<Vec<Vec<f64>>>,
    pub tau: Option<f64>,
    pub log_scale: bool,
}

impl TimescaleSeries {
    /// With only `x`, lags are the sample indices and `x` holds the
    /// timescales; with `y`, `x` holds the lags.
    pub fn new(x: Vec<f64>, y: Option<Vec<Vec<f64>>>) -> Result<Self, PlotError> {
        let (lags, processes) = match y {
            None => ((0..x.len()).map(|i| i as f64).collect(), vec![x]),
            Some(processes) => (x, processes),
        };

        if lags.is_empty() {
            return Err(PlotError::invalid("timescale plot needs at least one lag"));
        }
        if processes.is_empty() {
            return Err(PlotError::invalid("timescale plot needs at least one process"));
        }
        for process in &processes {
            PlotError::check_len("implied timescales", lags.len(), process.len())?;
        }

        Ok(Self {
            lags,
            processes,
            errors: None,
            tau: None,
            log_scale: false,
        })
    }

    pub fn with_errors(mut self, errors: Vec<Vec<f64>>) -> Result<Self, PlotError> {
        PlotError::check_len("timescale errors", self.processes.len(), errors.len())?;
        for err in &errors {
            PlotError::check_len("timescale error series", self.lags.len(), err.len())?;
        }
        self.errors = Some(errors);
        Ok(self)
    }

    pub fn with_tau(mut self, tau: Option<f64>) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        self
    }

    pub fn max_timescale(&self) -> f64 {
        self.processes
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Vertical marker at the chosen lag: `(tau, 0, 1.1 * max timescale)`.
    pub fn tau_marker(&self) -> Option<(f64, f64, f64)> {
        let max = self.max_timescale();
        self.tau.map(|tau| (tau, 0.0, max + 0.1 * max))
    }

    /// `(lag, lower, upper)` band per process when errors are present.
    pub fn error_bands(&self) -> Option<Vec<Vec<(f64, f64, f64)>>> {
        let errors = self.errors.as_ref()?;
        Some(
            self.processes
                .iter()
                .zip(errors)
                .map(|(process, err)| {
                    self.lags
                        .iter()
                        .zip(process.iter().zip(err))
                        .map(|(&lag, (&its, &e))| (lag, its - e, its + e))
                        .collect()
                })
                .collect(),
        )
    }
}

/// Ratios of consecutive implied timescales, indexed from 1. A leading
/// infinite timescale (the stationary process) is dropped first.
pub fn timescale_separation(its: &[f64]) -> Result<Vec<(usize, f64)>, PlotError> {
    let its = match its.first() {
        Some(first) if first.is_infinite() => &its[1..],
        _ => its,
    };
    if its.len() < 2 {
        return Err(PlotError::invalid(format!(
            "timescale separation needs at least two finite timescales, got {}",
            its.len()
        )));
    }

    Ok(its
        .windows(2)
        .enumerate()
        .map(|(k, pair)| (k + 1, pair[0] / pair[1]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_argument_uses_indices_as_lags() {
        let series = TimescaleSeries::new(vec![5.0, 6.0, 6.5], None).unwrap();
        assert_eq!(series.lags, vec![0.0, 1.0, 2.0]);
        assert_eq!(series.processes, vec![vec![5.0, 6.0, 6.5]]);
    }

    #[test]
    fn explicit_lags_must_align() {
        let err = TimescaleSeries::new(vec![1.0, 2.0], Some(vec![vec![3.0]])).unwrap_err();
        assert!(matches!(err, PlotError::ShapeMismatch { .. }));
    }

    #[test]
    fn tau_marker_reaches_above_maximum() {
        let series = TimescaleSeries::new(vec![1.0, 2.0], Some(vec![vec![10.0, 20.0]]))
            .unwrap()
            .with_tau(Some(2.0));
        let (x, y0, y1) = series.tau_marker().unwrap();
        assert_eq!(x, 2.0);
        assert_eq!(y0, 0.0);
        assert_relative_eq!(y1, 22.0);
    }

    #[test]
    fn error_bands_bracket_timescales() {
        let series = TimescaleSeries::new(vec![1.0, 2.0], Some(vec![vec![10.0, 20.0]]))
            .unwrap()
            .with_errors(vec![vec![1.0, 2.0]])
            .unwrap();
        let bands = series.error_bands().unwrap();
        assert_eq!(bands[0], vec![(1.0, 9.0, 11.0), (2.0, 18.0, 22.0)]);
        assert!(series.clone().with_errors(vec![vec![1.0]]).is_err());
    }

    #[test]
    fn separation_drops_stationary_process() {
        let sep = timescale_separation(&[f64::INFINITY, 100.0, 50.0, 10.0]).unwrap();
        assert_eq!(sep, vec![(1, 2.0), (2, 5.0)]);
    }

    #[test]
    fn separation_keeps_finite_leading_value() {
        let sep = timescale_separation(&[40.0, 20.0]).unwrap();
        assert_eq!(sep, vec![(1, 2.0)]);
        assert!(timescale_separation(&[f64::INFINITY, 3.0]).is_err());
    }
}
