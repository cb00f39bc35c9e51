//! Cross-layer net types.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::scan::NetId;

/// Copper layer of a two-layer board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    /// Component side.
    Top,
    /// Solder side.
    Bottom,
}

impl Layer {
    /// Numeric code used in flattened buffers: 0 for top, 1 for bottom.
    pub const fn code(self) -> u32 {
        match self {
            Self::Top => 0,
            Self::Bottom => 1,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Bottom => write!(f, "bottom"),
        }
    }
}

/// A net local to one layer's scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerNet {
    /// Layer the net was scanned on.
    pub layer: Layer,
    /// Net id within that layer.
    pub net: NetId,
}

impl LayerNet {
    /// Creates a layer-local net reference.
    pub const fn new(layer: Layer, net: NetId) -> Self {
        Self { layer, net }
    }
}

impl fmt::Display for LayerNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.layer, self.net)
    }
}

/// Board-wide nets: each is the set of layer-local nets joined by holes.
///
/// Ids are dense, starting at 1. Every local net of both layers belongs to
/// exactly one global net.
#[derive(Debug, Clone, Default)]
pub struct GlobalNets {
    /// Slot `k` holds the members of global net `k + 1`, in join order.
    nets: Vec<Vec<LayerNet>>,
    lookup: HashMap<LayerNet, NetId>,
    /// Diagnostics gathered while connecting.
    pub warnings: Vec<String>,
}

impl GlobalNets {
    pub(crate) fn from_groups(nets: Vec<Vec<LayerNet>>, warnings: Vec<String>) -> Self {
        let mut lookup = HashMap::new();
        for (index, members) in nets.iter().enumerate() {
            let Some(id) = NetId::from_index(index) else {
                break;
            };
            for member in members {
                lookup.insert(*member, id);
            }
        }
        Self {
            nets,
            lookup,
            warnings,
        }
    }

    /// Number of global nets.
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    /// Whether there are no nets at all.
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    /// All global net ids, ascending.
    pub fn net_ids(&self) -> impl Iterator<Item = NetId> + '_ {
        (0..self.nets.len()).filter_map(NetId::from_index)
    }

    /// Layer-local nets forming `net`, or `None` for an unknown id.
    pub fn members(&self, net: NetId) -> Option<&[LayerNet]> {
        self.nets.get(net.index()).map(Vec::as_slice)
    }

    /// Global net a layer-local net belongs to.
    pub fn global_net_of(&self, local: LayerNet) -> Option<NetId> {
        self.lookup.get(&local).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(layer: Layer, raw: u32) -> Option<LayerNet> {
        NetId::new(raw).map(|net| LayerNet::new(layer, net))
    }

    #[test]
    fn ut_ctyp_001_layer_net_is_a_value_key() {
        let a = local(Layer::Top, 3);
        let b = local(Layer::Top, 3);
        let c = local(Layer::Bottom, 3);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.map(|n| n.to_string()), Some("top:3".to_string()));
        assert_eq!(c.map(|n| n.to_string()), Some("bottom:3".to_string()));
    }

    #[test]
    fn ut_ctyp_002_lookup_matches_groups() {
        let groups: Vec<Vec<LayerNet>> = vec![
            [local(Layer::Top, 1), local(Layer::Bottom, 2)]
                .into_iter()
                .flatten()
                .collect(),
            local(Layer::Bottom, 1).into_iter().collect(),
        ];
        let nets = GlobalNets::from_groups(groups, Vec::new());
        assert_eq!(nets.len(), 2);
        let ids: Vec<u32> = nets.net_ids().map(NetId::get).collect();
        assert_eq!(ids, vec![1, 2]);
        let bottom_two = local(Layer::Bottom, 2);
        assert!(bottom_two.is_some());
        if let Some(bottom_two) = bottom_two {
            assert_eq!(nets.global_net_of(bottom_two).map(NetId::get), Some(1));
        }
        let second = NetId::new(2).and_then(|id| nets.members(id));
        assert_eq!(second.map(<[LayerNet]>::len), Some(1));
        let third = NetId::new(3).and_then(|id| nets.members(id));
        assert!(third.is_none());
    }
}
