use std::collections::HashSet;
use std::sync::Arc;

use super::time_order::{Transition, replay_samples};
use crate::builders::{BuildError, StreamingBuilder};
use crate::model::{FrameId, Profile};

impl Profile {
    /// Collapse recursion: a frame re-entered while already on the stack is
    /// absorbed into its outer call, together with the matching leave.
    ///
    /// Frames keep their original self/total weights; only the trees and
    /// sample ledger are rebuilt. Frames are interned in the original order.
    pub fn flatten_recursion(&self) -> Result<Profile, BuildError> {
        let mut builder = StreamingBuilder::new();
        builder.set_name(self.name.clone());
        builder.set_unit(self.unit);
        for (_, frame) in self.frames.iter() {
            builder.add_frame(frame.info());
        }

        let tree = &self.trees.append_order;
        // `None` marks a suppressed re-entry.
        let mut stack: Vec<Option<FrameId>> = Vec::new();
        let mut open: HashSet<FrameId> = HashSet::new();
        replay_samples(
            tree,
            &self.trees.samples,
            &self.trees.weights,
            |transition, id, value| {
                let Some(frame) = tree[id].frame() else {
                    return Ok(());
                };
                match transition {
                    Transition::Open if open.insert(frame) => {
                        stack.push(Some(frame));
                        builder.enter_frame(self.frames[frame].info(), value)
                    }
                    Transition::Open => {
                        stack.push(None);
                        Ok(())
                    }
                    Transition::Close => match stack.pop().flatten() {
                        Some(frame) => {
                            open.remove(&frame);
                            builder.leave_frame(self.frames[frame].info(), value)
                        }
                        None => Ok(()),
                    },
                }
            },
        )?;
        builder.set_total_weight(self.total_weight);

        let mut flattened = builder.build()?;
        let frames = Arc::make_mut(&mut flattened.frames);
        for (id, original) in self.frames.iter() {
            frames[id].overwrite_weights_with(original);
        }
        Ok(flattened)
    }
}
