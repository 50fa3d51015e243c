use std::collections::HashSet;

use flame_tree_protocol::{FrameInfo, ValueUnit};
use tracing::warn;

use super::{BuildError, ProfileParts, check_monotonic};
use crate::model::{FrameId, Profile, TreeOrder};

#[derive(Debug)]
struct PendingSample {
    stack: Vec<FrameInfo>,
    start: f64,
    timestamp: f64,
}

/// Builds a profile from whole stacks, outermost frame first.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    parts: ProfileParts,
    pending: Option<PendingSample>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.parts.name = name.into();
    }

    pub fn set_unit(&mut self, unit: ValueUnit) {
        self.parts.unit = unit;
    }

    /// Profile duration when the trace covers more than its samples (idle
    /// time). The built total is never less than the sum of sample weights.
    pub fn set_total_weight(&mut self, total_weight: f64) {
        self.parts.total_weight = total_weight;
    }

    /// Intern a frame ahead of any sample that uses it.
    pub fn add_frame(&mut self, info: &FrameInfo) -> FrameId {
        self.parts.frames.get_or_insert(info)
    }

    /// Record one sample. An empty stack is idle time.
    ///
    /// Zero weights are ignored. Negative weights are accepted but produce
    /// meaningless percentages downstream.
    pub fn append_sample(&mut self, stack: &[FrameInfo], weight: f64) -> Result<(), BuildError> {
        if weight.is_nan() {
            return Err(BuildError::InvalidWeight { weight });
        }
        if weight == 0.0 {
            return Ok(());
        }
        if weight < 0.0 {
            warn!(weight, depth = stack.len(), "negative sample weight");
        }

        let frames: Vec<FrameId> = stack
            .iter()
            .map(|info| self.parts.frames.get_or_insert(info))
            .collect();
        self.append_append_order(&frames, weight);
        self.append_grouped(&frames, weight);
        Ok(())
    }

    /// Record a sample observed at `timestamp`. Each sample covers the span
    /// between the midpoints with its neighbours, so weights are only known
    /// once the next timestamp (or [`build`](Self::build)) arrives.
    pub fn append_sample_with_timestamp(
        &mut self,
        stack: &[FrameInfo],
        timestamp: f64,
    ) -> Result<(), BuildError> {
        let Some(pending) = self.pending.take() else {
            self.pending = Some(PendingSample {
                stack: stack.to_vec(),
                start: timestamp,
                timestamp,
            });
            return Ok(());
        };

        if let Err(err) = check_monotonic(pending.timestamp, timestamp) {
            self.pending = Some(pending);
            return Err(err);
        }

        let end = (timestamp + pending.timestamp) / 2.0;
        self.append_sample(&pending.stack, end - pending.start)?;
        self.pending = Some(PendingSample {
            stack: stack.to_vec(),
            start: end,
            timestamp,
        });
        Ok(())
    }

    pub fn build(mut self) -> Profile {
        if let Some(pending) = self.pending.take() {
            let weight = if self.parts.trees.samples.is_empty() {
                // A lone timestamp carries no duration, so units are meaningless.
                self.parts.unit = ValueUnit::None;
                1.0
            } else {
                pending.timestamp - pending.start
            };
            if let Err(err) = self.append_sample(&pending.stack, weight) {
                warn!(%err, "dropping final timestamped sample");
            }
        }
        self.parts.finish()
    }

    fn append_append_order(&mut self, frames: &[FrameId], weight: f64) {
        let parts = &mut self.parts;
        let tree = &mut parts.trees.append_order;

        let mut node = tree.root();
        for &frame in frames {
            node = tree.descend(node, frame, TreeOrder::AppendOrder);
            tree[node].add_total_weight(weight);
        }
        tree[node].add_self_weight(weight);
        // Anything called from here later is a new call, not a continuation.
        tree.freeze_children(node);

        if let Some(&leaf) = frames.last() {
            parts.frames[leaf].add_self_weight(weight);
        }
        // A frame recurring in one stack still counts once for this sample.
        let mut seen = HashSet::with_capacity(frames.len());
        for &frame in frames {
            if seen.insert(frame) {
                parts.frames[frame].add_total_weight(weight);
            }
        }

        let ledger = &mut parts.trees;
        if ledger.samples.last() == Some(&node)
            && let Some(last) = ledger.weights.last_mut()
        {
            *last += weight;
        } else {
            ledger.samples.push(node);
            ledger.weights.push(weight);
        }
    }

    fn append_grouped(&mut self, frames: &[FrameId], weight: f64) {
        let tree = &mut self.parts.trees.grouped;
        let mut node = tree.root();
        for &frame in frames {
            node = tree.descend(node, frame, TreeOrder::Grouped);
            tree[node].add_total_weight(weight);
        }
        tree[node].add_self_weight(weight);
    }
}
