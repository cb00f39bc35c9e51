//! Error types for the raster scanning and net connection pipeline.

use thiserror::Error;

/// Errors that can occur while scanning layers or connecting nets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetlistError {
    /// A coordinate outside the layer (or not a finite number) was queried.
    #[error("invalid coordinate ({x}, {y}) for a {width}x{height} layer")]
    InvalidCoordinate {
        /// Queried column.
        x: f64,
        /// Queried row.
        y: f64,
        /// Layer width in pixels.
        width: u32,
        /// Layer height in pixels.
        height: u32,
    },

    /// A pixel buffer does not match the declared layer dimensions.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Number of bytes implied by the dimensions.
        expected: usize,
        /// Number of bytes supplied.
        actual: usize,
    },

    /// The declared layer dimensions cannot be represented.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// A scan or drill option is out of its accepted range.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// A layer required by the operation has not been scanned yet.
    #[error("missing layer: {0}")]
    MissingLayer(String),

    /// A net id that does not exist was requested.
    #[error("unknown net {0}")]
    UnknownNet(u32),

    /// Global nets were requested before the layers were connected.
    #[error("layers have not been connected")]
    NotConnected,

    /// More nets than a `u32` id can number.
    #[error("too many nets to number with 32-bit ids")]
    TooManyNets,
}
