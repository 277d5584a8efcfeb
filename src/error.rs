//! Error types for simplicial layers.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or running simplicial layers.
#[derive(Error, Debug)]
pub enum Error {
    /// The input's simplex-count dimension does not match the incidence relation.
    #[error(
        "Shape of input features does not have the correct number of {simplices} {expected} (got {actual})"
    )]
    ShapeMismatch {
        /// Which simplices the row dimension counts, e.g. `faces`.
        simplices: &'static str,
        /// Simplex count the relation expects.
        expected: usize,
        /// Simplex count found on the input.
        actual: usize,
    },

    /// The input's channel count does not match a convolution's `in_channels`.
    #[error("expected {expected} input channels, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    /// A sparse entry lies outside the declared shape.
    #[error("incidence entry ({row}, {col}) is outside shape [{rows}, {cols}]")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// The sparse-matrix crate rejected a triplet layout.
    #[error("invalid sparse layout: {0}")]
    Sparse(#[from] nalgebra_sparse::SparseFormatError),

    /// Constructor arguments that cannot describe a layer.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An update function name that is not recognized.
    #[error("unknown update function `{0}` (expected sigmoid, relu, tanh or none)")]
    UnknownUpdateFunc(String),

    /// Failure inside the tensor library.
    #[error(transparent)]
    Candle(#[from] candle_core::Error),
}

impl Error {
    pub(crate) fn shape_mismatch(simplices: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            simplices,
            expected,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_names_expected_count() {
        let msg = Error::shape_mismatch("faces", 7, 3).to_string();
        assert!(msg.contains("number of faces 7"), "{msg}");
        assert!(msg.contains("got 3"), "{msg}");
    }

    #[test]
    fn candle_errors_convert() {
        let e: Error = candle_core::Error::Msg("boom".into()).into();
        assert!(matches!(e, Error::Candle(_)));
    }
}
