//! Whole-board pipeline: three scanned layers in, global nets out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::connect::{connect, GlobalNets, Layer};
use crate::drill::{find_holes, DrillOptions, Hole};
use crate::error::NetlistError;
use crate::raster::PixelSource;
use crate::scan::{LayerScan, NetId, ScanOptions, Segment};

/// Which board layer an image represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    /// Top copper.
    Top,
    /// Bottom copper, as seen from the top.
    Bottom,
    /// Drill holes.
    Drill,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Bottom => write!(f, "bottom"),
            Self::Drill => write!(f, "drill"),
        }
    }
}

impl FromStr for LayerKind {
    type Err = NetlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "drill" => Ok(Self::Drill),
            other => Err(NetlistError::InvalidOption(format!(
                "unknown layer `{other}`; expected top, bottom or drill"
            ))),
        }
    }
}

/// Options for a full board run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardOptions {
    /// Applied to all three layers.
    pub scan: ScanOptions,
    /// Hole classification.
    pub drill: DrillOptions,
}

/// Holes and global nets derived from already scanned layers.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    /// Holes found on the drill layer, in drill net order.
    pub holes: Vec<Hole>,
    /// Nets joined across layers.
    pub nets: GlobalNets,
    /// Drill and connection diagnostics, drill first.
    pub warnings: Vec<String>,
}

/// Finds the holes of `drill` and joins the nets of `top` and `bottom`
/// through them.
///
/// # Errors
///
/// Returns [`NetlistError::InvalidDimensions`] if the layers differ in size
/// and [`NetlistError::InvalidOption`] for invalid drill options.
#[instrument(skip_all)]
pub fn connect_layers(
    top: &LayerScan,
    drill: &LayerScan,
    bottom: &LayerScan,
    options: &DrillOptions,
) -> Result<Connection, NetlistError> {
    let size = (top.width(), top.height());
    for (name, layer) in [("drill", drill), ("bottom", bottom)] {
        if (layer.width(), layer.height()) != size {
            return Err(NetlistError::InvalidDimensions(format!(
                "{name} layer is {}x{}, top layer is {}x{}",
                layer.width(),
                layer.height(),
                size.0,
                size.1
            )));
        }
    }

    let drill_scan = find_holes(drill, options)?;
    let mut nets = connect(top, bottom, &drill_scan.holes)?;

    let mut warnings = drill_scan.warnings;
    warnings.append(&mut nets.warnings);

    Ok(Connection {
        holes: drill_scan.holes,
        nets,
        warnings,
    })
}

/// Scans of all three layers of a two-layer board and their connection.
#[derive(Debug, Clone)]
pub struct BoardNetlist {
    /// Top copper scan.
    pub top: LayerScan,
    /// Drill layer scan.
    pub drill: LayerScan,
    /// Bottom copper scan.
    pub bottom: LayerScan,
    /// Holes and global nets.
    pub connection: Connection,
}

impl BoardNetlist {
    /// Scans the three layers and connects them.
    ///
    /// # Errors
    ///
    /// Propagates pixel source errors and the errors of [`connect_layers`].
    pub fn build<P: PixelSource + ?Sized>(
        top: &P,
        drill: &P,
        bottom: &P,
        options: &BoardOptions,
    ) -> Result<Self, NetlistError> {
        let propagation = options.scan.propagation;
        let top = LayerScan::scan_with(top, propagation)?;
        let drill = LayerScan::scan_with(drill, propagation)?;
        let bottom = LayerScan::scan_with(bottom, propagation)?;
        let connection = connect_layers(&top, &drill, &bottom, &options.drill)?;
        Ok(Self {
            top,
            drill,
            bottom,
            connection,
        })
    }

    /// Scan of one copper layer.
    pub const fn layer(&self, layer: Layer) -> &LayerScan {
        match layer {
            Layer::Top => &self.top,
            Layer::Bottom => &self.bottom,
        }
    }

    /// Every segment of global net `net`, tagged with its layer.
    ///
    /// Returns `None` for an unknown id.
    pub fn segments_of_global_net(&self, net: NetId) -> Option<Vec<(Layer, Segment)>> {
        let members = self.connection.nets.members(net)?;
        let mut segments = Vec::new();
        for local in members {
            if let Some(run) = self.layer(local.layer).segments_of_net(local.net) {
                segments.extend(run.map(|segment| (local.layer, *segment)));
            }
        }
        Some(segments)
    }
}

/// Summary of one scanned layer returned to JavaScript.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerMeta {
    /// Layer this summary describes.
    pub kind: LayerKind,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of segments.
    pub segment_count: usize,
    /// Number of rows holding copper.
    pub scanline_count: usize,
    /// Number of nets.
    pub net_count: usize,
}

impl LayerMeta {
    /// Summarizes `scan`.
    pub fn of(kind: LayerKind, scan: &LayerScan) -> Self {
        Self {
            kind,
            width: scan.width(),
            height: scan.height(),
            segment_count: scan.segments().len(),
            scanline_count: scan.scanlines().len(),
            net_count: scan.net_count(),
        }
    }
}

/// Summary of a board connection returned to JavaScript.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMeta {
    /// Number of accepted holes.
    pub hole_count: usize,
    /// Number of global nets.
    pub global_net_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Warning messages.
    pub warnings: Vec<String>,
}

impl BoardMeta {
    /// Summarizes `connection`.
    pub fn of(connection: &Connection) -> Self {
        Self {
            hole_count: connection.holes.len(),
            global_net_count: connection.nets.len(),
            warning_count: connection.warnings.len(),
            warnings: connection.warnings.clone(),
        }
    }
}
