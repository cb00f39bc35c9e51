//! Pixel sources feeding the layer scanner.

pub mod bitmap;

pub use bitmap::*;

use crate::error::NetlistError;

/// Read-only binary view of one board layer.
///
/// Implementations must answer consistently for the whole lifetime of a
/// scan. Coordinates satisfy `x < width()` and `y < height()`; anything else
/// is a caller error reported as [`NetlistError::InvalidCoordinate`].
pub trait PixelSource {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Whether the pixel at `(x, y)` is copper.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::InvalidCoordinate`] for out-of-range coordinates.
    fn pixel_at(&self, x: u32, y: u32) -> Result<bool, NetlistError>;
}

impl<P: PixelSource + ?Sized> PixelSource for &P {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn pixel_at(&self, x: u32, y: u32) -> Result<bool, NetlistError> {
        (**self).pixel_at(x, y)
    }
}
