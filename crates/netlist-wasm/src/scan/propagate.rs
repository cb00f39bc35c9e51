//! Net propagation between vertically adjacent scanlines, and id compaction.
//!
//! Every segment starts with its own provisional label (its index in the
//! segment list). Walking rows top to bottom, a segment adopts the label of
//! the first segment it touches on the row directly above; every further
//! touching segment has its label merged into the adopted one. Two merge
//! strategies are available and both yield the same partition:
//!
//! - [`Propagation::Eager`] rewrites every earlier segment still carrying the
//!   retired label, sweeping back to index 0.
//! - [`Propagation::UnionFind`] records merges in a disjoint-set forest
//!   (union by rank, path halving) and resolves labels once at the end.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Deserialize;
use tracing::trace;

use crate::error::NetlistError;

use super::scanline::Scanline;
use super::segment::{NetId, Segment};

/// Strategy used to merge labels of touching segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Propagation {
    /// In-place back-propagation of retired labels.
    #[default]
    Eager,
    /// Disjoint-set forest over segment indices.
    UnionFind,
}

/// Computes one provisional label per segment. Segments sharing a label are
/// 4-connected.
pub(crate) fn propagate(
    segments: &[Segment],
    scanlines: &[Scanline],
    strategy: Propagation,
) -> Vec<usize> {
    match strategy {
        Propagation::Eager => propagate_eager(segments, scanlines),
        Propagation::UnionFind => propagate_union_find(segments, scanlines),
    }
}

fn propagate_eager(segments: &[Segment], scanlines: &[Scanline]) -> Vec<usize> {
    let mut labels = vec![0; segments.len()];
    let mut previous: Option<&Scanline> = None;

    for line in scanlines {
        let above = previous.filter(|p| p.is_directly_above(line.row));
        for (index, segment) in line.segments(segments).iter().enumerate() {
            let index = line.start + index;
            set_label(&mut labels, index, index);

            let Some(above) = above else {
                continue;
            };

            let mut adopted = None;
            for candidate in above.touching(segments, segment) {
                let candidate_label = labels.get(candidate).copied().unwrap_or(candidate);
                match adopted {
                    None => {
                        set_label(&mut labels, index, candidate_label);
                        adopted = Some(candidate_label);
                    }
                    Some(label) => {
                        if let Some(processed) = labels.get_mut(..=index) {
                            back_propagate(processed, label, candidate_label);
                        }
                    }
                }
            }
        }
        previous = Some(line);
    }

    labels
}

fn set_label(labels: &mut [usize], index: usize, label: usize) {
    if let Some(slot) = labels.get_mut(index) {
        *slot = label;
    }
}

/// Rewrites every label equal to `retired` into `survivor`, walking from the
/// end of `labels` back to index 0.
pub(crate) fn back_propagate(labels: &mut [usize], survivor: usize, retired: usize) {
    if survivor == retired {
        return;
    }
    trace!(survivor, retired, "back-propagating label");
    for label in labels.iter_mut().rev() {
        if *label == retired {
            *label = survivor;
        }
    }
}

fn propagate_union_find(segments: &[Segment], scanlines: &[Scanline]) -> Vec<usize> {
    let mut sets = DisjointSets::new(segments.len());
    let mut previous: Option<&Scanline> = None;

    for line in scanlines {
        if let Some(above) = previous.filter(|p| p.is_directly_above(line.row)) {
            for (index, segment) in line.segments(segments).iter().enumerate() {
                for candidate in above.touching(segments, segment) {
                    sets.union(line.start + index, candidate);
                }
            }
        }
        previous = Some(line);
    }

    (0..segments.len()).map(|i| sets.find(i)).collect()
}

#[derive(Debug)]
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn parent_of(&self, node: usize) -> usize {
        self.parent.get(node).copied().unwrap_or(node)
    }

    fn find(&mut self, mut node: usize) -> usize {
        loop {
            let parent = self.parent_of(node);
            if parent == node {
                return node;
            }
            let grandparent = self.parent_of(parent);
            if let Some(slot) = self.parent.get_mut(node) {
                *slot = grandparent;
            }
            node = grandparent;
        }
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let rank_a = self.rank.get(root_a).copied().unwrap_or(0);
        let rank_b = self.rank.get(root_b).copied().unwrap_or(0);
        let (child, root) = if rank_a < rank_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        if let Some(slot) = self.parent.get_mut(child) {
            *slot = root;
        }
        if rank_a == rank_b {
            if let Some(rank) = self.rank.get_mut(root) {
                *rank = rank.saturating_add(1);
            }
        }
    }
}

/// Renumbers labels densely from 1 in order of first appearance.
///
/// Returns the net id of every segment and the number of distinct nets.
///
/// # Errors
///
/// Returns [`NetlistError::TooManyNets`] if the nets cannot all be numbered.
pub(crate) fn compact(labels: &[usize]) -> Result<(Vec<NetId>, usize), NetlistError> {
    let mut first_seen: HashMap<usize, NetId> = HashMap::new();
    let mut ids = Vec::with_capacity(labels.len());
    for &label in labels {
        let next = first_seen.len();
        let id = match first_seen.entry(label) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                *entry.insert(NetId::from_index(next).ok_or(NetlistError::TooManyNets)?)
            }
        };
        ids.push(id);
    }
    Ok((ids, first_seen.len()))
}
