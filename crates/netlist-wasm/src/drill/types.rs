//! Drill layer types.

use serde::{Deserialize, Serialize};

use crate::error::NetlistError;
use crate::scan::{NetId, Segment};

/// A drilled hole found on the drill layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hole {
    /// X coordinate of the hole centre, in pixels (may be a half pixel).
    pub x: f64,
    /// Y coordinate of the hole centre, in pixels (may be a half pixel).
    pub y: f64,
    /// Drill-layer net the hole was derived from.
    pub net: NetId,
    /// Bounding box width in pixels.
    pub width: u32,
    /// Bounding box height in pixels.
    pub height: u32,
}

/// Options for telling holes apart from other drill-layer artwork.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrillOptions {
    /// Smallest accepted bounding box side, in pixels.
    pub min_side: u32,
    /// Largest accepted `|w - h| / (w + h)`, exclusive.
    pub squareness_tolerance: f64,
}

impl DrillOptions {
    /// Checks that the options describe a usable classifier.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::InvalidOption`] if `min_side` is zero or the
    /// tolerance is not within `(0, 1]`.
    pub fn validate(&self) -> Result<(), NetlistError> {
        if self.min_side == 0 {
            return Err(NetlistError::InvalidOption(
                "minSide must be at least 1".to_string(),
            ));
        }
        if !(self.squareness_tolerance > 0.0 && self.squareness_tolerance <= 1.0) {
            return Err(NetlistError::InvalidOption(format!(
                "squarenessTolerance {} is outside (0, 1]",
                self.squareness_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for DrillOptions {
    fn default() -> Self {
        Self {
            min_side: 2,
            squareness_tolerance: 0.05,
        }
    }
}

/// Inclusive pixel bounding box of a set of segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    /// Leftmost column.
    pub min_x: u32,
    /// Topmost row.
    pub min_y: u32,
    /// Rightmost column.
    pub max_x: u32,
    /// Bottom row.
    pub max_y: u32,
}

impl PixelBounds {
    /// Bounds of a single segment.
    pub const fn of(segment: &Segment) -> Self {
        Self {
            min_x: segment.x_min,
            min_y: segment.row,
            max_x: segment.x_max,
            max_y: segment.row,
        }
    }

    /// Expands the bounds to include `segment`.
    pub fn update(&mut self, segment: &Segment) {
        self.min_x = self.min_x.min(segment.x_min);
        self.min_y = self.min_y.min(segment.row);
        self.max_x = self.max_x.max(segment.x_max);
        self.max_y = self.max_y.max(segment.row);
    }

    /// Bounds of all `segments`, or `None` when there are none.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> Option<Self> {
        let mut segments = segments.into_iter();
        let mut bounds = Self::of(segments.next()?);
        for segment in segments {
            bounds.update(segment);
        }
        Some(bounds)
    }

    /// Width in pixels.
    pub const fn width(&self) -> u32 {
        1 + self.max_x - self.min_x
    }

    /// Height in pixels.
    pub const fn height(&self) -> u32 {
        1 + self.max_y - self.min_y
    }

    /// Centre of the box in pixel coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            (f64::from(self.min_x) + f64::from(self.max_x)) / 2.0,
            (f64::from(self.min_y) + f64::from(self.max_y)) / 2.0,
        )
    }
}
