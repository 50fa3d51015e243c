use std::sync::{Arc, OnceLock};

use flame_tree_protocol::{FrameKey, ValueUnit};

use super::{CallTree, Frame, FrameId, FrameTable, NodeId, SymbolRemap};

/// The two call trees and the sample ledger of a finished profile.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallTrees {
    /// One branch per chronologically distinct call.
    pub(crate) append_order: CallTree,
    /// Identical call paths merged; children sorted heaviest first.
    pub(crate) grouped: CallTree,
    /// Append-order node at the top of the stack for each sample. The root
    /// stands for an idle (empty-stack) sample.
    pub(crate) samples: Vec<NodeId>,
    pub(crate) weights: Vec<f64>,
}

/// A finished, immutable call-tree profile.
///
/// Built by [`BatchBuilder`](crate::builders::BatchBuilder) or
/// [`StreamingBuilder`](crate::builders::StreamingBuilder). Cloning is
/// shallow: trees and frames are shared, and frames are copied on write
/// by [`Profile::remap_symbols`].
#[derive(Debug, Clone)]
pub struct Profile {
    pub(crate) name: String,
    pub(crate) unit: ValueUnit,
    pub(crate) total_weight: f64,
    pub(crate) frames: Arc<FrameTable>,
    pub(crate) trees: Arc<CallTrees>,
    total_non_idle_weight: OnceLock<f64>,
}

impl Profile {
    pub(crate) fn from_parts(
        name: String,
        unit: ValueUnit,
        total_weight: f64,
        frames: FrameTable,
        trees: CallTrees,
    ) -> Self {
        Self {
            name,
            unit,
            total_weight,
            frames: Arc::new(frames),
            trees: Arc::new(trees),
            total_non_idle_weight: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> ValueUnit {
        self.unit
    }

    /// Profile duration, idle time included.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Weight spent with a non-empty stack.
    pub fn total_non_idle_weight(&self) -> f64 {
        *self.total_non_idle_weight.get_or_init(|| {
            let grouped = &self.trees.grouped;
            grouped[grouped.root()]
                .children()
                .iter()
                .map(|&c| grouped[c].total_weight())
                .sum()
        })
    }

    pub fn format_value(&self, value: f64) -> String {
        self.unit.format_value(value)
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.frame(id)
    }

    pub fn frame_by_key(&self, key: &FrameKey) -> Option<(FrameId, &Frame)> {
        let id = self.frames.get(key)?;
        Some((id, &self.frames[id]))
    }

    /// Visit every interned frame in insertion order.
    pub fn for_each_frame(&self, mut f: impl FnMut(FrameId, &Frame)) {
        for (id, frame) in self.frames.iter() {
            f(id, frame);
        }
    }

    pub fn append_order_tree(&self) -> &CallTree {
        &self.trees.append_order
    }

    pub fn grouped_tree(&self) -> &CallTree {
        &self.trees.grouped
    }

    /// Top-of-stack append-order node per sample.
    pub fn samples(&self) -> &[NodeId] {
        &self.trees.samples
    }

    pub fn weights(&self) -> &[f64] {
        &self.trees.weights
    }

    pub fn is_empty(&self) -> bool {
        self.trees.samples.is_empty()
    }

    /// A new profile sharing this one's trees and frames.
    ///
    /// Caches keyed on the original stay valid when the clone is later
    /// remapped.
    pub fn shallow_clone(&self) -> Profile {
        self.clone()
    }

    /// Rewrite frame display symbols (post-hoc symbolication). Weights,
    /// keys and tree shape are untouched.
    pub fn remap_symbols(&mut self, mut remap: impl FnMut(&Frame) -> Option<SymbolRemap>) {
        let frames = Arc::make_mut(&mut self.frames);
        for frame in frames.iter_mut() {
            if let Some(symbols) = remap(frame) {
                frame.apply_remap(symbols);
            }
        }
    }
}
