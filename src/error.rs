use thiserror::Error;

/// Failures raised by the layout and data-preparation code before anything
/// is drawn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotError {
    #[error("{what} has length {found}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{what} index {index} out of bounds for {len} macrostates")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("probability {value} at index {index} is outside (0, 1); size scale undefined")]
    Domain { index: usize, value: f64 },
}

impl PlotError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PlotError::InvalidArgument(message.into())
    }

    pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(PlotError::ShapeMismatch {
                what,
                expected,
                found,
            })
        }
    }
}
