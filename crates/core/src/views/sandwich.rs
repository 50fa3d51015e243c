use flame_tree_protocol::{FrameInfo, FrameKey};
use tracing::warn;

use crate::builders::{BatchBuilder, BuildError};
use crate::model::{FrameId, NodeId, Profile};

impl Profile {
    /// Callers of one frame, inverted: the frame is the root and each
    /// caller chain hangs below it, weighted by the call's total weight.
    ///
    /// Only the outermost occurrence on any stack counts, so recursive
    /// calls are not double-counted. An unknown key yields an empty profile.
    pub fn inverted_profile_for_callers_of(&self, key: &FrameKey) -> Result<Profile, BuildError> {
        let mut builder = self.derived_builder();
        let Some(focal) = self.focal_frame(key) else {
            return Ok(builder.build());
        };

        let tree = &self.trees.append_order;
        for id in self.outermost_calls(focal) {
            let stack: Vec<FrameInfo> = tree
                .path_to_root(id)
                .filter_map(|n| tree[n].frame())
                .map(|f| self.frames[f].info().clone())
                .collect();
            builder.append_sample(&stack, tree[id].total_weight())?;
        }
        Ok(builder.build())
    }

    /// Everything called from one frame, rooted at that frame. Each node
    /// below an outermost occurrence contributes its self weight.
    pub fn profile_for_callees_of(&self, key: &FrameKey) -> Result<Profile, BuildError> {
        let mut builder = self.derived_builder();
        let Some(focal) = self.focal_frame(key) else {
            return Ok(builder.build());
        };

        let mut stack = Vec::new();
        for id in self.outermost_calls(focal) {
            self.append_subtree(id, &mut stack, &mut builder)?;
        }
        Ok(builder.build())
    }

    fn derived_builder(&self) -> BatchBuilder {
        let mut builder = BatchBuilder::new();
        builder.set_name(self.name.clone());
        builder.set_unit(self.unit);
        builder
    }

    fn focal_frame(&self, key: &FrameKey) -> Option<FrameId> {
        let found = self.frames.get(key);
        if found.is_none() {
            warn!(%key, profile = %self.name, "no frame with this key");
        }
        found
    }

    /// Append-order nodes for `frame` with no ancestor of the same frame,
    /// in depth-first order.
    fn outermost_calls(&self, frame: FrameId) -> Vec<NodeId> {
        let tree = &self.trees.append_order;
        let mut found = Vec::new();
        let mut pending = vec![tree.root()];
        while let Some(id) = pending.pop() {
            let node = &tree[id];
            if node.frame() == Some(frame) {
                found.push(id);
                continue;
            }
            pending.extend(node.children().iter().rev());
        }
        found
    }

    /// Emit one sample per node below `id` (inclusive), weighted by its
    /// self weight. Iterative, so arbitrarily deep stacks are fine.
    fn append_subtree(
        &self,
        id: NodeId,
        stack: &mut Vec<FrameInfo>,
        builder: &mut BatchBuilder,
    ) -> Result<(), BuildError> {
        let tree = &self.trees.append_order;
        let mut pending = vec![Walk::Enter(id)];
        while let Some(step) = pending.pop() {
            let Walk::Enter(id) = step else {
                stack.pop();
                continue;
            };
            let node = &tree[id];
            let Some(frame) = node.frame() else {
                continue;
            };
            stack.push(self.frames[frame].info().clone());
            builder.append_sample(stack, node.self_weight())?;
            pending.push(Walk::Exit);
            pending.extend(node.children().iter().rev().map(|&c| Walk::Enter(c)));
        }
        Ok(())
    }
}

enum Walk {
    Enter(NodeId),
    Exit,
}
