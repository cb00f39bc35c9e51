//! Horizontal runs of copper pixels.

use std::fmt;

use serde::Serialize;

/// Dense net identifier, starting at 1.
///
/// Local nets (one layer) and global nets (across layers) share this type;
/// the table that issued an id gives it meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NetId(u32);

impl NetId {
    /// The lowest net id.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw id. Returns `None` for 0, which is never a valid net.
    pub const fn new(raw: u32) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Returns the raw id.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Net id for a zero-based table slot, or `None` when the slot is past
    /// the last representable id.
    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .map(Self)
    }

    /// Zero-based table slot for this id.
    pub(crate) const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximal run of set pixels `[x_min, x_max]` on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Image row.
    pub row: u32,
    /// First set column (inclusive).
    pub x_min: u32,
    /// Last set column (inclusive).
    pub x_max: u32,
}

impl Segment {
    /// Whether `other`, lying on the row right above, shares at least one
    /// column with this segment.
    pub const fn touches(&self, other: &Self) -> bool {
        match other.row.checked_add(1) {
            Some(row) if row == self.row => other.x_max >= self.x_min && other.x_min <= self.x_max,
            _ => false,
        }
    }

    /// Whether abscissa `x` lies within `[x_min, x_max]`.
    pub fn contains_x(&self, x: f64) -> bool {
        f64::from(self.x_min) <= x && x <= f64::from(self.x_max)
    }

    /// Number of pixels covered.
    pub const fn width(&self) -> u32 {
        1 + self.x_max - self.x_min
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}-{}", self.row, self.x_min, self.x_max)
    }
}
