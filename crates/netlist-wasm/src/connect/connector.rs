//! Joins top and bottom layer nets through drilled holes.
//!
//! Holes are processed strictly in the order given. When a hole lands on two
//! nets that already belong to different global nets, the bottom net's
//! global net is folded into the top net's, whose id survives. Final ids
//! follow the order in which a sweep over top then bottom local nets first
//! meets each global net.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, trace};

use crate::drill::Hole;
use crate::error::NetlistError;
use crate::scan::LayerScan;

use super::types::{GlobalNets, Layer, LayerNet};

/// Incremental builder of [`GlobalNets`] for one pair of scanned layers.
#[derive(Debug)]
pub struct DrillConnector<'a> {
    top: &'a LayerScan,
    bottom: &'a LayerScan,
    /// Provisional global id of every local net joined so far.
    assigned: HashMap<LayerNet, u32>,
    /// Members of every live provisional global id, in join order.
    members: HashMap<u32, Vec<LayerNet>>,
    next_id: u32,
    warnings: Vec<String>,
}

impl<'a> DrillConnector<'a> {
    /// Starts connecting the nets of `top` and `bottom`.
    pub fn new(top: &'a LayerScan, bottom: &'a LayerScan) -> Self {
        Self {
            top,
            bottom,
            assigned: HashMap::new(),
            members: HashMap::new(),
            next_id: 1,
            warnings: Vec::new(),
        }
    }

    /// Records the connection made by one hole.
    ///
    /// A hole may touch copper on both, one or neither layer; touching
    /// neither connects nothing.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::InvalidCoordinate`] if the hole lies outside
    /// either layer and [`NetlistError::TooManyNets`] if provisional ids run
    /// out.
    pub fn add_hole(&mut self, hole: &Hole) -> Result<(), NetlistError> {
        let top = self
            .top
            .net_at(hole.x, hole.y)?
            .map(|net| LayerNet::new(Layer::Top, net));
        let bottom = self
            .bottom
            .net_at(hole.x, hole.y)?
            .map(|net| LayerNet::new(Layer::Bottom, net));

        trace!(x = hole.x, y = hole.y, ?top, ?bottom, "hole");

        let top_id = top.and_then(|n| self.assigned.get(&n).copied());
        let bottom_id = bottom.and_then(|n| self.assigned.get(&n).copied());

        match (top_id, bottom_id) {
            (None, None) => {
                if top.is_none() && bottom.is_none() {
                    self.warnings.push(format!(
                        "hole at ({}, {}) touches no copper on either layer",
                        hole.x, hole.y
                    ));
                    return Ok(());
                }
                let id = self.allocate()?;
                for local in top.into_iter().chain(bottom) {
                    self.join(local, id);
                }
                debug!(id, ?top, ?bottom, "new global net");
            }
            (Some(id), None) => {
                if let Some(local) = bottom {
                    self.join(local, id);
                    debug!(id, %local, "bottom net joined");
                }
            }
            (None, Some(id)) => {
                if let Some(local) = top {
                    self.join(local, id);
                    debug!(id, %local, "top net joined");
                }
            }
            (Some(survivor), Some(retired)) => {
                if survivor != retired {
                    self.merge(survivor, retired);
                    debug!(survivor, retired, "global nets merged");
                }
            }
        }

        Ok(())
    }

    /// Gives every local net not reached by any hole its own global net, then
    /// numbers global nets densely in the order the sweep over top nets, then
    /// bottom nets, first meets them.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::TooManyNets`] if provisional ids run out.
    pub fn finish(mut self) -> Result<GlobalNets, NetlistError> {
        let sweep: Vec<LayerNet> = self
            .top
            .net_ids()
            .map(|net| LayerNet::new(Layer::Top, net))
            .chain(
                self.bottom
                    .net_ids()
                    .map(|net| LayerNet::new(Layer::Bottom, net)),
            )
            .collect();

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for &local in &sweep {
            let id = match self.assigned.get(&local) {
                Some(&id) => id,
                None => {
                    let id = self.allocate()?;
                    self.join(local, id);
                    id
                }
            };
            if seen.insert(id) {
                order.push(id);
            }
        }

        let groups: Vec<Vec<LayerNet>> = order
            .into_iter()
            .filter_map(|id| self.members.remove(&id))
            .collect();
        debug!(nets = groups.len(), "global nets compacted");
        Ok(GlobalNets::from_groups(groups, self.warnings))
    }

    fn allocate(&mut self) -> Result<u32, NetlistError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(NetlistError::TooManyNets)?;
        self.members.insert(id, Vec::new());
        Ok(id)
    }

    fn join(&mut self, local: LayerNet, id: u32) {
        self.assigned.insert(local, id);
        self.members.entry(id).or_default().push(local);
    }

    fn merge(&mut self, survivor: u32, retired: u32) {
        let moved = self.members.remove(&retired).unwrap_or_default();
        for local in &moved {
            self.assigned.insert(*local, survivor);
        }
        self.members.entry(survivor).or_default().extend(moved);
    }
}

/// Connects `top` and `bottom` through `holes` and returns the global nets.
///
/// # Errors
///
/// Returns [`NetlistError::InvalidCoordinate`] if a hole lies outside either
/// layer and [`NetlistError::TooManyNets`] if the global nets cannot all be
/// numbered.
#[instrument(skip_all, fields(holes = holes.len()))]
pub fn connect(
    top: &LayerScan,
    bottom: &LayerScan,
    holes: &[Hole],
) -> Result<GlobalNets, NetlistError> {
    let mut connector = DrillConnector::new(top, bottom);
    for hole in holes {
        connector.add_hole(hole)?;
    }
    connector.finish()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::drill::{find_holes, DrillOptions};
    use crate::raster::Bitmap;
    use crate::scan::NetId;

    const TOP_BARS: [&str; 8] = [
        "",
        "  XX  XX",
        "  XX  XX",
        "  XX  XX",
        "  XX  XX",
        "  XX  XX",
        "  XX  XX",
        "",
    ];

    const BOTTOM_BARS: [&str; 8] = [
        "",
        "  XXXXXX",
        "  XXXXXX",
        "",
        "",
        "  XXXXXX",
        "  XXXXXX",
        "",
    ];

    fn scan(rows: &[&str]) -> Result<LayerScan, NetlistError> {
        Bitmap::from_ascii(rows).and_then(|b| LayerScan::scan(&b))
    }

    fn describe(nets: &GlobalNets) -> Vec<String> {
        nets.net_ids()
            .map(|id| {
                nets.members(id)
                    .unwrap_or_default()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect()
    }

    fn try_connect(
        top: &[&str],
        bottom: &[&str],
        drill: &[&str],
    ) -> Result<GlobalNets, NetlistError> {
        let top = scan(top)?;
        let bottom = scan(bottom)?;
        let holes = find_holes(&scan(drill)?, &DrillOptions::default())?.holes;
        connect(&top, &bottom, &holes)
    }

    fn connect_boards(top: &[&str], bottom: &[&str], drill: &[&str]) -> Option<GlobalNets> {
        let result = try_connect(top, bottom, drill);
        assert!(
            result.is_ok(),
            "expected Ok, got Err: {:?}",
            result.as_ref().err()
        );
        result.ok()
    }

    fn hole(x: f64, y: f64) -> Hole {
        Hole {
            x,
            y,
            net: NetId::FIRST,
            width: 2,
            height: 2,
        }
    }

    #[test]
    fn ut_con_001_four_vias_join_everything() {
        let Some(nets) = connect_boards(
            &TOP_BARS,
            &BOTTOM_BARS,
            &["", "  XX  XX", "  XX  XX", "", "", "  XX  XX", "  XX  XX", ""],
        ) else {
            return;
        };
        assert_eq!(describe(&nets), vec!["top:1,bottom:1,top:2,bottom:2"]);
    }

    #[test]
    fn ut_con_002_two_vias_make_two_nets() {
        let Some(nets) = connect_boards(
            &TOP_BARS,
            &BOTTOM_BARS,
            &["", "  XX", "  XX", "", "", "      XX", "      XX", ""],
        ) else {
            return;
        };
        assert_eq!(describe(&nets), vec!["top:1,bottom:1", "top:2,bottom:2"]);
    }

    #[test]
    fn ut_con_003_nets_without_vias_are_their_own_global_net() {
        let Some(nets) = connect_boards(
            &TOP_BARS,
            &BOTTOM_BARS,
            &["", "  XX", "  XX", "", "", "", "", ""],
        ) else {
            return;
        };
        assert_eq!(
            describe(&nets),
            vec!["top:1,bottom:1", "top:2", "bottom:2"]
        );
    }

    #[test]
    fn ut_con_004_merge_keeps_top_id_and_moves_all_members() {
        let top = scan(&["XX  XX", "XX  XX", "", "XXXXXX", "XXXXXX"]);
        let bottom = scan(&["XX  XX", "XX  XX", "XX  XX", "XX  XX", "XX  XX"]);
        assert!(top.is_ok() && bottom.is_ok());
        let (Ok(top), Ok(bottom)) = (top, bottom) else {
            return;
        };
        // Top nets: 1 left pad, 2 right pad, 3 lower bar.
        // Bottom nets: 1 left rail, 2 right rail.
        let holes = [hole(0.5, 0.5), hole(4.5, 0.5), hole(0.5, 3.5), hole(4.5, 3.5)];
        let result = connect(&top, &bottom, &holes);
        assert!(result.is_ok());
        let Ok(nets) = result else {
            return;
        };
        assert_eq!(
            describe(&nets),
            vec!["top:1,bottom:1,top:3,top:2,bottom:2"]
        );
        for raw in 1..=3 {
            let local = NetId::new(raw).map(|n| LayerNet::new(Layer::Top, n));
            assert!(local.is_some());
            if let Some(local) = local {
                assert_eq!(nets.global_net_of(local).map(NetId::get), Some(1));
            }
        }
    }

    #[test]
    fn ut_con_005_one_sided_hole_opens_global_net() {
        let top = scan(&["XX", "XX"]);
        let bottom = scan(&["  ", "  "]);
        assert!(top.is_ok() && bottom.is_ok());
        let (Ok(top), Ok(bottom)) = (top, bottom) else {
            return;
        };
        let result = connect(&top, &bottom, &[hole(0.5, 0.5), hole(1.0, 1.5)]);
        assert!(result.is_ok());
        if let Ok(nets) = result {
            assert_eq!(describe(&nets), vec!["top:1"]);
            assert!(nets.warnings.is_empty());
        }
    }

    #[test]
    fn ut_con_006_ids_follow_sweep_order_not_hole_order() {
        let top = scan(&["XX  XX", "XX  XX"]);
        let bottom = scan(&["XX  XX", "XX  XX"]);
        assert!(top.is_ok() && bottom.is_ok());
        let (Ok(top), Ok(bottom)) = (top, bottom) else {
            return;
        };
        let result = connect(&top, &bottom, &[hole(4.5, 0.5), hole(0.5, 0.5)]);
        assert!(result.is_ok());
        if let Ok(nets) = result {
            assert_eq!(describe(&nets), vec!["top:1,bottom:1", "top:2,bottom:2"]);
        }
    }

    #[test]
    fn ut_con_007_sweep_order_interleaves_connected_and_isolated_nets() {
        let top = scan(&["XX XX XX", "XX XX XX"]);
        let bottom = scan(&["XX    XX", "XX    XX"]);
        assert!(top.is_ok() && bottom.is_ok());
        let (Ok(top), Ok(bottom)) = (top, bottom) else {
            return;
        };
        let result = connect(&top, &bottom, &[hole(6.5, 0.5)]);
        assert!(result.is_ok());
        if let Ok(nets) = result {
            assert_eq!(
                describe(&nets),
                vec!["top:1", "top:2", "top:3,bottom:2", "bottom:1"]
            );
        }
    }

    #[test]
    fn bc_con_001_hole_in_bare_board_connects_nothing() {
        let top = scan(&["X  ", "   "]);
        let bottom = scan(&["   ", "  X"]);
        assert!(top.is_ok() && bottom.is_ok());
        let (Ok(top), Ok(bottom)) = (top, bottom) else {
            return;
        };
        let result = connect(&top, &bottom, &[hole(1.0, 1.0)]);
        assert!(result.is_ok());
        if let Ok(nets) = result {
            assert_eq!(describe(&nets), vec!["top:1", "bottom:1"]);
            assert_eq!(nets.warnings.len(), 1);
            assert!(nets.warnings[0].contains("no copper"));
        }
    }

    #[test]
    fn bc_con_002_empty_layers_have_no_nets() {
        let top = scan(&[""]);
        let bottom = scan(&[""]);
        assert!(top.is_ok() && bottom.is_ok());
        let (Ok(top), Ok(bottom)) = (top, bottom) else {
            return;
        };
        let result = connect(&top, &bottom, &[]);
        assert!(result.is_ok());
        if let Ok(nets) = result {
            assert!(nets.is_empty());
        }
    }

    #[test]
    fn bc_con_004_exhausted_provisional_ids_are_an_error() {
        let top = scan(&["XX", "XX"]);
        let bottom = scan(&["XX", "XX"]);
        assert!(top.is_ok() && bottom.is_ok());
        let (Ok(top), Ok(bottom)) = (top, bottom) else {
            return;
        };
        let mut connector = DrillConnector::new(&top, &bottom);
        connector.next_id = u32::MAX;
        assert_eq!(
            connector.add_hole(&hole(0.5, 0.5)),
            Err(NetlistError::TooManyNets)
        );
    }

    #[test]
    fn bc_con_003_hole_outside_layer_is_an_error() {
        let top = scan(&["XX", "XX"]);
        let bottom = scan(&["XX", "XX"]);
        assert!(top.is_ok() && bottom.is_ok());
        let (Ok(top), Ok(bottom)) = (top, bottom) else {
            return;
        };
        assert!(matches!(
            connect(&top, &bottom, &[hole(5.0, 0.5)]),
            Err(NetlistError::InvalidCoordinate { .. })
        ));
    }
}
