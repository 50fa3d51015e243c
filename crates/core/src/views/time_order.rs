use std::convert::Infallible;

use super::CallVisitor;
use crate::model::{CallTree, NodeId, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Open,
    Close,
}

/// Turn a sample ledger back into balanced open/close transitions.
///
/// For each sample, the stack is diffed against the previous one at their
/// lowest common ancestor: frames below it close, frames from it down to
/// the new top open (outermost first). Stacks are shallow, so the ancestor
/// search is a linear scan of the open stack.
pub(crate) fn replay_samples<E>(
    tree: &CallTree,
    samples: &[NodeId],
    weights: &[f64],
    mut emit: impl FnMut(Transition, NodeId, f64) -> Result<(), E>,
) -> Result<(), E> {
    let mut open: Vec<NodeId> = Vec::new();
    let mut to_open: Vec<NodeId> = Vec::new();
    let mut value = 0.0;

    for (&top, &weight) in samples.iter().zip(weights) {
        let lca = std::iter::successors(Some(top), |&n| tree[n].parent())
            .find(|&n| tree[n].is_root() || open.contains(&n));

        while let Some(&last) = open.last() {
            if Some(last) == lca {
                break;
            }
            open.pop();
            emit(Transition::Close, last, value)?;
        }

        to_open.clear();
        to_open.extend(tree.path_to_root(top).take_while(|&n| Some(n) != lca));
        for &node in to_open.iter().rev() {
            emit(Transition::Open, node, value)?;
            open.push(node);
        }

        value += weight;
    }

    while let Some(node) = open.pop() {
        emit(Transition::Close, node, value)?;
    }
    Ok(())
}

impl Profile {
    /// Replay the profile chronologically as nested open/close events,
    /// reconstructed from the sample ledger.
    pub fn for_each_call(&self, visitor: &mut impl CallVisitor) {
        let tree = &self.trees.append_order;
        let Ok(()) = replay_samples(
            tree,
            &self.trees.samples,
            &self.trees.weights,
            |transition, id, value| {
                let node = &tree[id];
                if let Some(frame) = node.frame().and_then(|f| self.frames.frame(f)) {
                    match transition {
                        Transition::Open => visitor.open_frame(node, frame, value),
                        Transition::Close => visitor.close_frame(node, frame, value),
                    }
                }
                Ok::<(), Infallible>(())
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use flame_tree_protocol::FrameInfo;

    use crate::builders::{BatchBuilder, StreamingBuilder};
    use crate::model::Profile;
    use crate::test_util::{frame, stack_list};

    fn scenario_frames() -> [FrameInfo; 5] {
        ["a", "b", "c", "d", "e"].map(frame)
    }

    fn verify_profile(profile: &Profile) {
        let mut keys: Vec<String> = Vec::new();
        profile.for_each_frame(|_, f| keys.push(f.key().to_string()));
        keys.sort();
        assert_eq!(keys, ["a", "b", "c", "d", "e"]);

        assert_eq!(
            stack_list(profile, false),
            [
                "a 1", "a;b 2", "a;b;d 1", "a;b;c 1", " 1", "a 1", "a;b 1", "a;b;b 1", "a;b;e 1",
                "a 1",
            ]
        );
        assert_eq!(
            stack_list(profile, true),
            ["a;b;d 1", "a;b;c 1", "a;b;b 1", "a;b;e 1", "a;b 3", "a 3"]
        );

        let flattened = profile.flatten_recursion().unwrap();
        assert_eq!(
            stack_list(&flattened, false),
            [
                "a 1", "a;b 2", "a;b;d 1", "a;b;c 1", " 1", "a 1", "a;b 2", "a;b;e 1", "a 1",
            ]
        );
        assert_eq!(
            stack_list(&flattened, true),
            ["a;b;d 1", "a;b;c 1", "a;b;e 1", "a;b 4", "a 3"]
        );
    }

    #[test]
    fn batch_builder_scenario() {
        let [a, b, c, d, e] = scenario_frames();
        let samples = [
            vec![a.clone()],
            vec![a.clone(), b.clone()],
            vec![a.clone(), b.clone()],
            vec![a.clone(), b.clone(), d.clone()],
            vec![a.clone(), b.clone(), c.clone()],
            vec![],
            vec![a.clone()],
            vec![a.clone(), b.clone()],
            vec![a.clone(), b.clone(), b.clone()],
            vec![a.clone(), b.clone(), e.clone()],
            vec![a.clone()],
        ];

        let mut builder = BatchBuilder::new();
        for stack in &samples {
            builder.append_sample(stack, 1.0).unwrap();
        }
        builder.append_sample(&[], 4.0).unwrap();
        let profile = builder.build();

        assert_eq!(profile.total_weight(), 15.0);
        assert_eq!(profile.total_non_idle_weight(), 10.0);
        verify_profile(&profile);
    }

    #[test]
    fn streaming_builder_scenario() {
        let [a, b, c, d, e] = scenario_frames();
        let mut builder = StreamingBuilder::new();
        builder.enter_frame(&a, 0.0).unwrap();
        builder.enter_frame(&b, 1.0).unwrap();
        builder.enter_frame(&d, 3.0).unwrap();
        builder.leave_frame(&d, 4.0).unwrap();
        builder.enter_frame(&c, 4.0).unwrap();
        builder.leave_frame(&c, 5.0).unwrap();
        builder.leave_frame(&b, 5.0).unwrap();
        builder.leave_frame(&a, 5.0).unwrap();
        builder.enter_frame(&a, 6.0).unwrap();
        builder.enter_frame(&b, 7.0).unwrap();
        builder.enter_frame(&b, 8.0).unwrap();
        builder.leave_frame(&b, 9.0).unwrap();
        builder.enter_frame(&e, 9.0).unwrap();
        builder.leave_frame(&e, 10.0).unwrap();
        builder.leave_frame(&b, 10.0).unwrap();
        builder.leave_frame(&a, 11.0).unwrap();

        let profile = builder.build().unwrap();
        assert_eq!(profile.total_weight(), 11.0);
        verify_profile(&profile);
    }

    #[test]
    fn frame_totals_count_each_sample_once() {
        let [a, b, ..] = scenario_frames();
        let mut builder = BatchBuilder::new();
        builder.append_sample(&[a.clone(), b.clone(), a.clone(), b.clone()], 2.0).unwrap();
        builder.append_sample(&[b.clone()], 3.0).unwrap();
        let profile = builder.build();

        let mut totals = Vec::new();
        profile.for_each_frame(|_, f| totals.push((f.key().to_string(), f.total_weight())));
        assert_eq!(totals, [("a".to_string(), 2.0), ("b".to_string(), 5.0)]);
    }

    #[test]
    fn empty_profile_emits_nothing() {
        let profile = BatchBuilder::new().build();
        assert!(stack_list(&profile, false).is_empty());
        assert!(stack_list(&profile, true).is_empty());
        assert_eq!(profile.total_weight(), 0.0);
    }
}
