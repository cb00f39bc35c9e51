//! Owned binary bitmap built from host pixel buffers.

use crate::error::NetlistError;

use super::PixelSource;

/// Default channel threshold: a pixel is copper when any channel exceeds it.
pub const DEFAULT_THRESHOLD: u8 = 10;

/// Binary pixel grid, one `bool` per pixel in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Bitmap {
    /// Wraps an already-binarized row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::SizeMismatch`] if `bits.len() != width * height`.
    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Result<Self, NetlistError> {
        let expected = pixel_count(width, height)?;
        if bits.len() != expected {
            return Err(NetlistError::SizeMismatch {
                expected,
                actual: bits.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    /// Binarizes an 8-bit grayscale buffer: a pixel is set when its value is
    /// strictly greater than `threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::SizeMismatch`] if `luma.len() != width * height`.
    pub fn from_luma(
        width: u32,
        height: u32,
        luma: &[u8],
        threshold: u8,
    ) -> Result<Self, NetlistError> {
        let expected = pixel_count(width, height)?;
        if luma.len() != expected {
            return Err(NetlistError::SizeMismatch {
                expected,
                actual: luma.len(),
            });
        }
        let bits = luma.iter().map(|&v| v > threshold).collect();
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    /// Binarizes an RGBA buffer: a pixel is set when any of its red, green or
    /// blue channels is strictly greater than `threshold`. Alpha is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::SizeMismatch`] if `rgba.len() != width * height * 4`.
    pub fn from_rgba(
        width: u32,
        height: u32,
        rgba: &[u8],
        threshold: u8,
    ) -> Result<Self, NetlistError> {
        let expected = pixel_count(width, height)?
            .checked_mul(4)
            .ok_or_else(|| overflow(width, height))?;
        if rgba.len() != expected {
            return Err(NetlistError::SizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        let bits = rgba
            .chunks_exact(4)
            .map(|px| px.iter().take(3).any(|&c| c > threshold))
            .collect();
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    /// Builds a bitmap from text rows where `'X'` marks a set pixel.
    ///
    /// The width is the longest row; shorter rows are padded with unset
    /// pixels. Handy for drawing small boards by hand.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::InvalidDimensions`] if a row or the row count
    /// does not fit in `u32`.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S]) -> Result<Self, NetlistError> {
        let longest = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        let width = u32::try_from(longest)
            .map_err(|_| NetlistError::InvalidDimensions(format!("row of {longest} pixels")))?;
        let height = u32::try_from(rows.len())
            .map_err(|_| NetlistError::InvalidDimensions(format!("{} rows", rows.len())))?;

        let mut bits = Vec::with_capacity(pixel_count(width, height)?);
        for row in rows {
            let row = row.as_ref();
            let padded = bits.len() + longest;
            bits.extend(row.chars().map(|c| c == 'X'));
            bits.resize(padded, false);
        }

        Ok(Self {
            width,
            height,
            bits,
        })
    }

    /// Number of set pixels.
    pub fn count_set(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

impl PixelSource for Bitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel_at(&self, x: u32, y: u32) -> Result<bool, NetlistError> {
        if x >= self.width || y >= self.height {
            return Err(NetlistError::InvalidCoordinate {
                x: f64::from(x),
                y: f64::from(y),
                width: self.width,
                height: self.height,
            });
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.bits
            .get(idx)
            .copied()
            .ok_or(NetlistError::InvalidCoordinate {
                x: f64::from(x),
                y: f64::from(y),
                width: self.width,
                height: self.height,
            })
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize, NetlistError> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| overflow(width, height))
}

fn overflow(width: u32, height: u32) -> NetlistError {
    NetlistError::InvalidDimensions(format!("{width}x{height} overflows the address space"))
}
