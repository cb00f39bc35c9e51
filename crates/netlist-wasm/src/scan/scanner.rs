//! Layer scanning: segmentation, net propagation, compaction and lookup.

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::NetlistError;
use crate::raster::{PixelSource, DEFAULT_THRESHOLD};

use super::propagate::{compact, propagate, Propagation};
use super::scanline::Scanline;
use super::segment::{NetId, Segment};

/// Options controlling how a layer is binarized and scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanOptions {
    /// Label merge strategy.
    pub propagation: Propagation,
    /// Channel value a pixel must exceed to count as copper.
    pub threshold: u8,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            propagation: Propagation::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Completed scan of one layer: its segments, row index and net table.
///
/// Net ids are dense, starting at 1, and numbered in scan order: net 1 owns
/// the first segment met top to bottom, left to right.
#[derive(Debug, Clone)]
pub struct LayerScan {
    width: u32,
    height: u32,
    segments: Vec<Segment>,
    scanlines: Vec<Scanline>,
    /// Net of each segment, parallel to `segments`.
    net_ids: Vec<NetId>,
    /// Segment indices of each net, in scan order; slot `k` is net `k + 1`.
    nets: Vec<Vec<usize>>,
}

impl LayerScan {
    /// Scans a layer with the default (eager) propagation.
    ///
    /// # Errors
    ///
    /// Propagates errors reported by the pixel source.
    pub fn scan<P: PixelSource + ?Sized>(source: &P) -> Result<Self, NetlistError> {
        Self::scan_with(source, Propagation::default())
    }

    /// Scans a layer using the given propagation strategy.
    ///
    /// # Errors
    ///
    /// Propagates errors reported by the pixel source. Returns
    /// [`NetlistError::TooManyNets`] if the layer has more nets than `u32` ids.
    #[instrument(skip_all, fields(width = source.width(), height = source.height(), propagation = ?propagation))]
    pub fn scan_with<P: PixelSource + ?Sized>(
        source: &P,
        propagation: Propagation,
    ) -> Result<Self, NetlistError> {
        let (segments, scanlines) = segment_rows(source)?;
        let labels = propagate(&segments, &scanlines, propagation);
        let (net_ids, net_count) = compact(&labels)?;

        let mut nets = vec![Vec::new(); net_count];
        for (index, net) in net_ids.iter().enumerate() {
            if let Some(members) = nets.get_mut(net.index()) {
                members.push(index);
            }
        }

        debug!(
            segments = segments.len(),
            rows = scanlines.len(),
            nets = net_count,
            "layer scanned"
        );

        Ok(Self {
            width: source.width(),
            height: source.height(),
            segments,
            scanlines,
            net_ids,
            nets,
        })
    }

    /// Layer width in pixels.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Layer height in pixels.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// All segments in scan order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Row index; only rows holding segments appear, in increasing order.
    pub fn scanlines(&self) -> &[Scanline] {
        &self.scanlines
    }

    /// Net of the segment at `index` in [`Self::segments`].
    pub fn net_of_segment(&self, index: usize) -> Option<NetId> {
        self.net_ids.get(index).copied()
    }

    /// Number of nets on this layer.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// All net ids, ascending.
    pub fn net_ids(&self) -> impl Iterator<Item = NetId> + '_ {
        (0..self.nets.len()).filter_map(NetId::from_index)
    }

    /// Segments of `net` in scan order, or `None` for an unknown id.
    pub fn segments_of_net(&self, net: NetId) -> Option<impl Iterator<Item = &Segment> + '_> {
        self.nets
            .get(net.index())
            .map(|members| members.iter().filter_map(|&i| self.segments.get(i)))
    }

    /// Net of the segment on row `floor(y)` whose `[x_min, x_max]` contains
    /// `x`.
    ///
    /// `x` is compared as given, so a point past a segment's last column
    /// (`x_max + 0.5`) is not on it. Returns `Ok(None)` when no segment
    /// contains the point.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::InvalidCoordinate`] if the point is not finite
    /// or lies outside the layer.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn net_at(&self, x: f64, y: f64) -> Result<Option<NetId>, NetlistError> {
        let inside = x.is_finite()
            && y.is_finite()
            && x >= 0.0
            && y >= 0.0
            && x < f64::from(self.width)
            && y < f64::from(self.height);
        if !inside {
            return Err(NetlistError::InvalidCoordinate {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        // Finite, non-negative and below a u32 bound.
        let row = y.floor() as u32;

        let Ok(found) = self.scanlines.binary_search_by_key(&row, |line| line.row) else {
            return Ok(None);
        };
        let Some(line) = self.scanlines.get(found) else {
            return Ok(None);
        };

        Ok(line
            .range()
            .zip(line.segments(&self.segments))
            .find(|(_, segment)| segment.contains_x(x))
            .and_then(|(index, _)| self.net_of_segment(index)))
    }
}

/// Splits every row into maximal runs of set pixels and indexes them by row.
///
/// # Errors
///
/// Propagates errors reported by the pixel source.
pub(crate) fn segment_rows<P: PixelSource + ?Sized>(
    source: &P,
) -> Result<(Vec<Segment>, Vec<Scanline>), NetlistError> {
    let width = source.width();
    let mut segments = Vec::new();
    let mut scanlines = Vec::new();

    for row in 0..source.height() {
        let start = segments.len();
        let mut open: Option<u32> = None;

        // One column past the edge counts as unset so the last run closes.
        for x in 0..=width {
            let set = x < width && source.pixel_at(x, row)?;
            match (open, set) {
                (None, true) => open = Some(x),
                (Some(x_min), false) => {
                    segments.push(Segment {
                        row,
                        x_min,
                        x_max: x - 1,
                    });
                    open = None;
                }
                _ => {}
            }
        }

        let len = segments.len() - start;
        if len > 0 {
            scanlines.push(Scanline { row, start, len });
        }
    }

    Ok((segments, scanlines))
}
