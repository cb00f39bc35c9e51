#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::indexing_slicing)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Netlist extraction from rasterized PCB layers, compiled to WASM.
//!
//! Each copper layer is split into horizontal runs of copper, the runs are
//! grouped into nets, and the nets of the top and bottom layers are joined
//! through the holes found on the drill layer.

pub mod board;
pub mod connect;
pub mod drill;
pub mod error;
pub mod raster;
pub mod scan;

use std::cell::RefCell;

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::board::{BoardMeta, Connection, LayerKind, LayerMeta};
use crate::drill::DrillOptions;
use crate::error::NetlistError;
use crate::raster::Bitmap;
use crate::scan::{LayerScan, NetId, ScanOptions};

/// Layers and connection kept between calls from JavaScript.
#[derive(Debug)]
struct Session {
    top: Option<LayerScan>,
    bottom: Option<LayerScan>,
    drill: Option<LayerScan>,
    connection: Option<Connection>,
}

impl Session {
    const fn new() -> Self {
        Self {
            top: None,
            bottom: None,
            drill: None,
            connection: None,
        }
    }

    const fn layer(&self, kind: LayerKind) -> Option<&LayerScan> {
        match kind {
            LayerKind::Top => self.top.as_ref(),
            LayerKind::Bottom => self.bottom.as_ref(),
            LayerKind::Drill => self.drill.as_ref(),
        }
    }

    fn require(&self, kind: LayerKind) -> Result<&LayerScan, NetlistError> {
        self.layer(kind)
            .ok_or_else(|| NetlistError::MissingLayer(kind.to_string()))
    }

    fn store(&mut self, kind: LayerKind, scan: LayerScan) {
        let slot = match kind {
            LayerKind::Top => &mut self.top,
            LayerKind::Bottom => &mut self.bottom,
            LayerKind::Drill => &mut self.drill,
        };
        *slot = Some(scan);
        self.connection = None;
    }
}

thread_local! {
    static SESSION: RefCell<Session> = const { RefCell::new(Session::new()) };
}

fn to_js(err: &NetlistError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn options_from<T: Default + DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Initialize the WASM module. Sets up the panic hook for debugging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Scan one layer from an RGBA image.
///
/// `kind` is `"top"`, `"bottom"` or `"drill"`. `options` is an optional
/// `ScanOptions` object. Returns `LayerMeta` as a `JsValue` via
/// `serde-wasm-bindgen`. Scanning a layer discards any previous connection.
///
/// # Errors
///
/// Returns a descriptive error string for an unknown layer, bad options or a
/// buffer that does not match the dimensions.
#[wasm_bindgen]
pub fn scan_layer(
    kind: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let kind: LayerKind = kind.parse().map_err(|e| to_js(&e))?;
    let options: ScanOptions = options_from(options)?;
    let meta = scan_layer_internal(kind, width, height, rgba, &options).map_err(|e| to_js(&e))?;
    serde_wasm_bindgen::to_value(&meta).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Internal scan logic shared between the wasm export and native tests.
#[doc(hidden)]
pub fn scan_layer_internal(
    kind: LayerKind,
    width: u32,
    height: u32,
    rgba: &[u8],
    options: &ScanOptions,
) -> Result<LayerMeta, NetlistError> {
    let bitmap = Bitmap::from_rgba(width, height, rgba, options.threshold)?;
    let scan = LayerScan::scan_with(&bitmap, options.propagation)?;
    let meta = LayerMeta::of(kind, &scan);
    SESSION.with(|s| s.borrow_mut().store(kind, scan));
    Ok(meta)
}

/// Connect the scanned top and bottom layers through the drill layer.
///
/// `options` is an optional `DrillOptions` object. Returns `BoardMeta` as a
/// `JsValue`.
///
/// # Errors
///
/// Returns a descriptive error string if a layer is missing, the layers
/// differ in size or the options are invalid.
#[wasm_bindgen]
pub fn connect_layers(options: JsValue) -> Result<JsValue, JsValue> {
    let options: DrillOptions = options_from(options)?;
    let meta = connect_layers_internal(&options).map_err(|e| to_js(&e))?;
    serde_wasm_bindgen::to_value(&meta).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Internal connect logic shared between the wasm export and native tests.
#[doc(hidden)]
pub fn connect_layers_internal(options: &DrillOptions) -> Result<BoardMeta, NetlistError> {
    SESSION.with(|s| {
        let mut session = s.borrow_mut();
        let connection = board::connect_layers(
            session.require(LayerKind::Top)?,
            session.require(LayerKind::Drill)?,
            session.require(LayerKind::Bottom)?,
            options,
        )?;
        let meta = BoardMeta::of(&connection);
        session.connection = Some(connection);
        Ok(meta)
    })
}

/// Retrieve the segments of one net as flattened `[row, x_min, x_max, ...]`.
///
/// # Errors
///
/// Returns a descriptive error string for an unknown or unscanned layer or
/// an unknown net.
#[wasm_bindgen]
pub fn get_net_segments(kind: &str, net: u32) -> Result<Vec<u32>, JsValue> {
    let kind: LayerKind = kind.parse().map_err(|e| to_js(&e))?;
    get_net_segments_internal(kind, net).map_err(|e| to_js(&e))
}

/// Internal segment lookup shared between the wasm export and native tests.
#[doc(hidden)]
pub fn get_net_segments_internal(kind: LayerKind, net: u32) -> Result<Vec<u32>, NetlistError> {
    SESSION.with(|s| {
        let session = s.borrow();
        let scan = session.require(kind)?;
        let segments = NetId::new(net)
            .and_then(|id| scan.segments_of_net(id))
            .ok_or(NetlistError::UnknownNet(net))?;
        let mut flat = Vec::new();
        for segment in segments {
            flat.extend([segment.row, segment.x_min, segment.x_max]);
        }
        Ok(flat)
    })
}

/// Retrieve the layer nets forming one global net as flattened
/// `[layer, net, ...]`, where layer is 0 for top and 1 for bottom.
///
/// # Errors
///
/// Returns a descriptive error string before [`connect_layers`] has run or
/// for an unknown net.
#[wasm_bindgen]
pub fn get_global_net_members(net: u32) -> Result<Vec<u32>, JsValue> {
    get_global_net_members_internal(net).map_err(|e| to_js(&e))
}

/// Internal member lookup shared between the wasm export and native tests.
#[doc(hidden)]
pub fn get_global_net_members_internal(net: u32) -> Result<Vec<u32>, NetlistError> {
    SESSION.with(|s| {
        let session = s.borrow();
        let connection = session.connection.as_ref().ok_or(NetlistError::NotConnected)?;
        let members = NetId::new(net)
            .and_then(|id| connection.nets.members(id))
            .ok_or(NetlistError::UnknownNet(net))?;
        let mut flat = Vec::with_capacity(members.len() * 2);
        for local in members {
            flat.extend([local.layer.code(), local.net.get()]);
        }
        Ok(flat)
    })
}

/// Retrieve the hole centres of the last connection as flattened
/// `[x0, y0, x1, y1, ...]`.
///
/// Returns an empty array if the layers have not been connected.
#[wasm_bindgen]
pub fn get_holes() -> Vec<f64> {
    SESSION.with(|s| {
        s.borrow().connection.as_ref().map_or_else(Vec::new, |c| {
            let mut flat = Vec::with_capacity(c.holes.len() * 2);
            for hole in &c.holes {
                flat.push(hole.x);
                flat.push(hole.y);
            }
            flat
        })
    })
}

/// Net of `kind` under the point `(x, y)`, or `undefined` over bare board.
///
/// # Errors
///
/// Returns a descriptive error string for an unknown or unscanned layer or a
/// point outside the layer.
#[wasm_bindgen]
pub fn net_at(kind: &str, x: f64, y: f64) -> Result<Option<u32>, JsValue> {
    let kind: LayerKind = kind.parse().map_err(|e| to_js(&e))?;
    net_at_internal(kind, x, y).map_err(|e| to_js(&e))
}

/// Internal point lookup shared between the wasm export and native tests.
#[doc(hidden)]
pub fn net_at_internal(kind: LayerKind, x: f64, y: f64) -> Result<Option<u32>, NetlistError> {
    SESSION.with(|s| {
        let session = s.borrow();
        Ok(session.require(kind)?.net_at(x, y)?.map(NetId::get))
    })
}

/// Drop every scanned layer and the connection.
#[wasm_bindgen]
pub fn reset() {
    SESSION.with(|s| {
        *s.borrow_mut() = Session::new();
    });
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    /// RGBA buffer with white pixels where `rows` hold `'X'`.
    fn rgba(rows: &[&str]) -> (u32, u32, Vec<u8>) {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut data = Vec::new();
        for row in rows {
            for x in 0..width {
                let on = row.as_bytes().get(x) == Some(&b'X');
                let value = if on { 255 } else { 0 };
                data.extend([value, value, value, 255]);
            }
        }
        let width = u32::try_from(width).unwrap_or(0);
        let height = u32::try_from(rows.len()).unwrap_or(0);
        (width, height, data)
    }

    fn load(kind: LayerKind, rows: &[&str]) -> Result<LayerMeta, NetlistError> {
        let (width, height, data) = rgba(rows);
        scan_layer_internal(kind, width, height, &data, &ScanOptions::default())
    }

    #[test]
    fn ut_lib_001_scan_layer_reports_meta() {
        reset();
        let result = load(LayerKind::Top, &["XX  X", "XX  X"]);
        assert!(
            result.is_ok(),
            "expected Ok, got Err: {:?}",
            result.as_ref().err()
        );
        let Some(meta) = result.ok() else {
            return;
        };
        assert_eq!((meta.width, meta.height), (5, 2));
        assert_eq!(meta.segment_count, 4);
        assert_eq!(meta.scanline_count, 2);
        assert_eq!(meta.net_count, 2);
    }

    #[test]
    fn ut_lib_002_segments_and_points_of_scanned_layer() {
        reset();
        assert!(load(LayerKind::Bottom, &["XX  X", " X  X"]).is_ok());
        assert_eq!(
            get_net_segments_internal(LayerKind::Bottom, 1),
            Ok(vec![0, 0, 1, 1, 1, 1])
        );
        assert_eq!(net_at_internal(LayerKind::Bottom, 4.0, 1.5), Ok(Some(2)));
        assert_eq!(net_at_internal(LayerKind::Bottom, 0.5, 1.5), Ok(None));
        assert_eq!(
            get_net_segments_internal(LayerKind::Bottom, 3),
            Err(NetlistError::UnknownNet(3))
        );
        assert_eq!(
            get_net_segments_internal(LayerKind::Bottom, 0),
            Err(NetlistError::UnknownNet(0))
        );
    }

    #[test]
    fn ut_lib_003_connect_layers_through_session() {
        reset();
        assert!(load(LayerKind::Top, &["XXX ", "XXX ", "    "]).is_ok());
        assert!(load(LayerKind::Drill, &["    ", " XX ", " XX "]).is_ok());
        assert!(load(LayerKind::Bottom, &["    ", "XXXX", "   X"]).is_ok());

        let result = connect_layers_internal(&DrillOptions::default());
        assert!(
            result.is_ok(),
            "expected Ok, got Err: {:?}",
            result.as_ref().err()
        );
        let Some(meta) = result.ok() else {
            return;
        };
        assert_eq!(meta.hole_count, 1);
        assert_eq!(meta.global_net_count, 1);
        assert_eq!(get_holes(), vec![1.5, 1.5]);
        assert_eq!(get_global_net_members_internal(1), Ok(vec![0, 1, 1, 1]));
        assert_eq!(
            get_global_net_members_internal(2),
            Err(NetlistError::UnknownNet(2))
        );
    }

    #[test]
    fn bc_lib_001_queries_before_scanning() {
        reset();
        assert!(matches!(
            net_at_internal(LayerKind::Top, 0.0, 0.0),
            Err(NetlistError::MissingLayer(_))
        ));
        assert!(matches!(
            connect_layers_internal(&DrillOptions::default()),
            Err(NetlistError::MissingLayer(_))
        ));
        assert_eq!(
            get_global_net_members_internal(1),
            Err(NetlistError::NotConnected)
        );
        assert!(get_holes().is_empty());
    }

    #[test]
    fn bc_lib_002_rescanning_drops_connection() {
        reset();
        assert!(load(LayerKind::Top, &["XX", "XX"]).is_ok());
        assert!(load(LayerKind::Drill, &["XX", "XX"]).is_ok());
        assert!(load(LayerKind::Bottom, &["XX", "XX"]).is_ok());
        assert!(connect_layers_internal(&DrillOptions::default()).is_ok());
        assert_eq!(get_holes().len(), 2);

        assert!(load(LayerKind::Top, &["X ", " X"]).is_ok());
        assert!(get_holes().is_empty());
        assert_eq!(
            get_global_net_members_internal(1),
            Err(NetlistError::NotConnected)
        );
    }

    #[test]
    fn bc_lib_003_buffer_size_mismatch() {
        reset();
        let result =
            scan_layer_internal(LayerKind::Top, 2, 2, &[0; 15], &ScanOptions::default());
        assert_eq!(
            result.err(),
            Some(NetlistError::SizeMismatch {
                expected: 16,
                actual: 15
            })
        );
    }
}
