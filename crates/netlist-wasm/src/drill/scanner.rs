//! Hole detection on a scanned drill layer.
//!
//! Every drill-layer net is a candidate. Holes are round or square pads, so a
//! candidate is accepted when its bounding box is nearly square and not too
//! small. Anything else (board outline, labels, slots) is rejected with a
//! warning.

use tracing::{debug, instrument};

use crate::error::NetlistError;
use crate::scan::{LayerScan, NetId};

use super::types::{DrillOptions, Hole, PixelBounds};

/// Result of hole detection on one drill layer.
#[derive(Debug, Clone, Default)]
pub struct DrillScan {
    /// Accepted holes, in drill-layer net order.
    pub holes: Vec<Hole>,
    /// One message per rejected drill-layer net.
    pub warnings: Vec<String>,
}

/// Classifies every net of `drill` and returns the holes among them.
///
/// # Errors
///
/// Returns [`NetlistError::InvalidOption`] if `options` fail validation.
#[instrument(skip_all, fields(nets = drill.net_count()))]
pub fn find_holes(drill: &LayerScan, options: &DrillOptions) -> Result<DrillScan, NetlistError> {
    options.validate()?;

    let mut result = DrillScan::default();
    for net in drill.net_ids() {
        let Some(bounds) = drill.segments_of_net(net).and_then(PixelBounds::from_segments) else {
            continue;
        };
        match classify(net, &bounds, options) {
            Ok(hole) => result.holes.push(hole),
            Err(reason) => result.warnings.push(reason),
        }
    }

    debug!(
        holes = result.holes.len(),
        rejected = result.warnings.len(),
        "drill layer classified"
    );
    Ok(result)
}

fn classify(net: NetId, bounds: &PixelBounds, options: &DrillOptions) -> Result<Hole, String> {
    let width = bounds.width();
    let height = bounds.height();

    if width < options.min_side || height < options.min_side {
        return Err(format!(
            "drill net {net} skipped: {width}x{height} is smaller than {min}x{min}",
            min = options.min_side
        ));
    }

    let w = f64::from(width);
    let h = f64::from(height);
    if (w - h).abs() / (w + h) >= options.squareness_tolerance {
        return Err(format!(
            "drill net {net} skipped: {width}x{height} bounding box is not square"
        ));
    }

    let (x, y) = bounds.center();
    Ok(Hole {
        x,
        y,
        net,
        width,
        height,
    })
}
