use std::collections::HashMap;

use flame_tree_protocol::{FrameInfo, ValueUnit};

use super::{BuildError, ProfileParts, check_monotonic};
use crate::model::{CallTree, FrameId, NodeId, Profile, TreeOrder};

/// Builds a profile from balanced enter/leave events carrying a
/// non-decreasing cumulative value (time, bytes allocated, ...).
///
/// Weight between two events is charged to whatever was open during that
/// interval, before the stacks change for the new event.
#[derive(Debug)]
pub struct StreamingBuilder {
    parts: ProfileParts,
    /// Open nodes in the append-order tree, root at the bottom.
    append_stack: Vec<NodeId>,
    /// Open nodes in the grouped tree, root at the bottom.
    grouped_stack: Vec<NodeId>,
    frame_stack: Vec<FrameId>,
    /// How many times each frame is currently open.
    open_frames: HashMap<FrameId, usize>,
    last_value: f64,
}

impl Default for StreamingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingBuilder {
    pub fn new() -> Self {
        let parts = ProfileParts::default();
        let append_stack = vec![parts.trees.append_order.root()];
        let grouped_stack = vec![parts.trees.grouped.root()];
        Self {
            parts,
            append_stack,
            grouped_stack,
            frame_stack: Vec::new(),
            open_frames: HashMap::new(),
            last_value: 0.0,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.parts.name = name.into();
    }

    pub fn set_unit(&mut self, unit: ValueUnit) {
        self.parts.unit = unit;
    }

    /// Profile duration when the trace extends past its last event.
    pub fn set_total_weight(&mut self, total_weight: f64) {
        self.parts.total_weight = total_weight;
    }

    /// Intern a frame ahead of any event that uses it.
    pub fn add_frame(&mut self, info: &FrameInfo) -> FrameId {
        self.parts.frames.get_or_insert(info)
    }

    /// Number of frames currently open.
    pub fn depth(&self) -> usize {
        self.frame_stack.len()
    }

    pub fn enter_frame(&mut self, info: &FrameInfo, value: f64) -> Result<(), BuildError> {
        check_monotonic(self.last_value, value)?;
        let frame = self.parts.frames.get_or_insert(info);
        let delta = value - self.last_value;
        self.charge_frames(delta);

        let trees = &mut self.parts.trees;

        let tree = &mut trees.append_order;
        tree.add_weight_along(&self.append_stack, delta);
        let top = stack_top(&self.append_stack, tree);
        if delta > 0.0 {
            trees.samples.push(top);
            trees.weights.push(delta);
        }
        let node = tree.descend(top, frame, TreeOrder::AppendOrder);
        self.append_stack.push(node);

        let tree = &mut trees.grouped;
        tree.add_weight_along(&self.grouped_stack, delta);
        let top = stack_top(&self.grouped_stack, tree);
        let node = tree.descend(top, frame, TreeOrder::Grouped);
        self.grouped_stack.push(node);

        self.frame_stack.push(frame);
        *self.open_frames.entry(frame).or_insert(0) += 1;
        self.advance(value);
        Ok(())
    }

    pub fn leave_frame(&mut self, info: &FrameInfo, value: f64) -> Result<(), BuildError> {
        check_monotonic(self.last_value, value)?;
        let Some(&open) = self.frame_stack.last() else {
            return Err(BuildError::StackUnderflow {
                key: info.key.clone(),
                value,
            });
        };
        if self.parts.frames.get(&info.key) != Some(open) {
            return Err(BuildError::FrameMismatch {
                leaving: info.name.clone(),
                open: self.parts.frames[open].name().clone(),
                value,
            });
        }

        let delta = value - self.last_value;
        self.charge_frames(delta);

        let trees = &mut self.parts.trees;

        let tree = &mut trees.append_order;
        tree.add_weight_along(&self.append_stack, delta);
        if let Some(leaving) = self.append_stack.pop() {
            // Re-entering the same frame later is a new call.
            tree[leaving].freeze();
            if delta > 0.0 {
                trees.samples.push(leaving);
                trees.weights.push(delta);
            }
        }

        trees.grouped.add_weight_along(&self.grouped_stack, delta);
        self.grouped_stack.pop();

        self.frame_stack.pop();
        if let Some(count) = self.open_frames.get_mut(&open) {
            *count -= 1;
            if *count == 0 {
                self.open_frames.remove(&open);
            }
        }
        self.advance(value);
        Ok(())
    }

    pub fn build(self) -> Result<Profile, BuildError> {
        if !self.frame_stack.is_empty() {
            return Err(BuildError::UnbalancedFrames {
                open: self.frame_stack.len(),
            });
        }
        Ok(self.parts.finish())
    }

    /// Charge `delta` to every distinct open frame's total and to the
    /// innermost frame's self weight.
    fn charge_frames(&mut self, delta: f64) {
        let frames = &mut self.parts.frames;
        for &frame in self.open_frames.keys() {
            frames[frame].add_total_weight(delta);
        }
        if let Some(&top) = self.frame_stack.last() {
            frames[top].add_self_weight(delta);
        }
    }

    fn advance(&mut self, value: f64) {
        self.last_value = value;
        self.parts.total_weight = self.parts.total_weight.max(value);
    }
}

fn stack_top(stack: &[NodeId], tree: &CallTree) -> NodeId {
    stack.last().copied().unwrap_or_else(|| tree.root())
}
