//! Row index over the global segment list.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use super::segment::Segment;

/// The contiguous block of segments produced by one image row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scanline {
    /// Image row.
    pub row: u32,
    /// Index of the row's first segment in the global list.
    pub start: usize,
    /// Number of segments on the row.
    pub len: usize,
}

impl Scanline {
    /// Index range of this row's segments.
    pub const fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Whether this scanline is on the row directly above `row`.
    pub const fn is_directly_above(&self, row: u32) -> bool {
        match self.row.checked_add(1) {
            Some(next) => next == row,
            None => false,
        }
    }

    /// This row's segments, left to right.
    pub fn segments<'a>(&self, all: &'a [Segment]) -> &'a [Segment] {
        all.get(self.range()).unwrap_or_default()
    }

    /// Indices of this row's segments touching `segment`, left to right.
    ///
    /// `segment` must lie on the row right below this scanline.
    pub fn touching<'a>(
        &self,
        all: &'a [Segment],
        segment: &'a Segment,
    ) -> impl Iterator<Item = usize> + 'a {
        let start = self.start;
        self.segments(all)
            .iter()
            .enumerate()
            .filter(move |(_, candidate)| segment.touches(candidate))
            .map(move |(offset, _)| start + offset)
    }
}

impl fmt::Display for Scanline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-({},{})", self.row, self.start, self.len)
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::super::scanner::segment_rows;
    use super::*;
    use crate::raster::Bitmap;

    fn segmented(rows: &[&str]) -> (Vec<Segment>, Vec<Scanline>) {
        let bitmap = Bitmap::from_ascii(rows);
        assert!(bitmap.is_ok());
        bitmap
            .ok()
            .and_then(|b| segment_rows(&b).ok())
            .unwrap_or_default()
    }

    #[test]
    fn ut_scl_001_row_segments_are_left_to_right() {
        let (segments, scanlines) = segmented(&["XX XX XXX"]);
        assert_eq!(scanlines.len(), 1);
        let row: Vec<(u32, u32, u32)> = scanlines[0]
            .segments(&segments)
            .iter()
            .map(|s| (s.row, s.x_min, s.x_max))
            .collect();
        assert_eq!(row, vec![(0, 0, 1), (0, 3, 4), (0, 6, 8)]);
    }

    #[test]
    fn ut_scl_002_touching_segments_of_wide_run() {
        let (segments, scanlines) = segmented(&[
            "XX XX XXXXXXX XX XXXX XXXXX XXXXX X XXXX",
            "        XXXXXXXXXXXXXXXXXXXXXX",
        ]);
        let last = segments[segments.len() - 1];
        let touching: Vec<(u32, u32, u32)> = scanlines[0]
            .touching(&segments, &last)
            .map(|i| (segments[i].row, segments[i].x_min, segments[i].x_max))
            .collect();
        assert_eq!(
            touching,
            vec![(0, 6, 12), (0, 14, 15), (0, 17, 20), (0, 22, 26), (0, 28, 32)]
        );
    }

    #[test]
    fn ut_scl_003_directly_above() {
        let line = Scanline {
            row: 4,
            start: 0,
            len: 1,
        };
        assert!(line.is_directly_above(5));
        assert!(!line.is_directly_above(6));
        assert!(!line.is_directly_above(4));
    }

    #[test]
    fn bc_scl_001_range_outside_list_yields_no_segments() {
        let line = Scanline {
            row: 0,
            start: 10,
            len: 2,
        };
        assert!(line.segments(&[]).is_empty());
    }
}
