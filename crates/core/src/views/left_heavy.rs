use super::CallVisitor;
use crate::model::{NodeId, Profile};

impl Profile {
    /// Replay the grouped tree depth-first: identical stacks are merged and
    /// siblings come heaviest first. Each child starts where the previous
    /// sibling ended.
    pub fn for_each_call_grouped(&self, visitor: &mut impl CallVisitor) {
        let tree = &self.trees.grouped;
        let mut pending = vec![Step::Open(tree.root(), 0.0)];
        while let Some(step) = pending.pop() {
            match step {
                Step::Open(id, start) => {
                    let node = &tree[id];
                    if let Some(frame) = node.frame().and_then(|f| self.frames.frame(f)) {
                        visitor.open_frame(node, frame, start);
                    }
                    pending.push(Step::Close(id, start + node.total_weight()));

                    // Offsets run forward, the worklist pops backward.
                    let first = pending.len();
                    let mut offset = start;
                    for &child in node.children() {
                        pending.push(Step::Open(child, offset));
                        offset += tree[child].total_weight();
                    }
                    pending[first..].reverse();
                }
                Step::Close(id, end) => {
                    let node = &tree[id];
                    if let Some(frame) = node.frame().and_then(|f| self.frames.frame(f)) {
                        visitor.close_frame(node, frame, end);
                    }
                }
            }
        }
    }
}

enum Step {
    Open(NodeId, f64),
    Close(NodeId, f64),
}
