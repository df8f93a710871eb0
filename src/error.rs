//! Error types for realtimeplot.
//!
//! Validation errors are returned at the call that caused them and never
//! deferred to render time. Resource errors only occur while constructing a
//! plot or exporting a frame.

use thiserror::Error;

use crate::view::Viewport;

/// Main error type for plotting operations.
#[derive(Error, Debug)]
pub enum PlotError {
    /// A sample fell outside the configured bounds of a bounded aggregation.
    #[error("sample ({x}, {y}) is outside [{}, {}] x [{}, {}]", bounds.x.min, bounds.x.max, bounds.y.min, bounds.y.max)]
    OutOfRange {
        /// Rejected X value.
        x: f64,
        /// Rejected Y value.
        y: f64,
        /// Configured bounds.
        bounds: Viewport,
    },

    /// An element of a batch could not be converted to a finite number.
    #[error("sample {index} is not a finite number: {value}")]
    InvalidSample {
        /// Position of the offending element within its batch.
        index: usize,
        /// Textual form of the rejected value.
        value: String,
    },

    /// A single sample could not be converted to a finite number.
    #[error("sample is not a finite number: {value}")]
    InvalidValue {
        /// Textual form of the rejected value.
        value: String,
    },

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The display surface could not be acquired.
    #[error("failed to acquire display surface: {0}")]
    Surface(String),

    /// The redraw thread could not be started.
    #[error("failed to start redraw thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// PNG encoding failed.
    #[error("failed to export frame: {0}")]
    Export(#[from] image::ImageError),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PlotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Range;

    #[test]
    fn out_of_range_message_names_bounds() {
        let err = PlotError::OutOfRange {
            x: 2.0,
            y: 0.5,
            bounds: Viewport::new(Range::new(0.0, 1.0), Range::new(0.0, 1.0)),
        };
        assert_eq!(err.to_string(), "sample (2, 0.5) is outside [0, 1] x [0, 1]");
    }

    #[test]
    fn single_sample_message_has_no_index() {
        let err = PlotError::InvalidValue {
            value: "inf".to_string(),
        };
        assert_eq!(err.to_string(), "sample is not a finite number: inf");
    }
}
