//! Export to and import from the persisted [`ProfileFile`] document.
//!
//! Export writes the interned frames, the append-order tree (root omitted)
//! and the sample ledger. Import validates the document, rebuilds the
//! append-order tree it describes and replays the ledger through a
//! [`StreamingBuilder`], so the imported profile reproduces the same
//! chronological call sequence.

use flame_tree_protocol::{NodeRecord, ProfileFile};
use thiserror::Error;
use tracing::debug;

use crate::builders::{BuildError, StreamingBuilder};
use crate::model::{CallTree, FrameId, NodeId, Profile};
use crate::views::time_order::{Transition, replay_samples};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{samples} samples but {weights} weights")]
    LengthMismatch { samples: usize, weights: usize },
    #[error("node {node} references frame {frame}, but the file has {count} frames")]
    UnknownFrame {
        node: usize,
        frame: usize,
        count: usize,
    },
    #[error("sample {sample} references node {node}, but the file has {count} nodes")]
    UnknownNode {
        sample: usize,
        node: usize,
        count: usize,
    },
    #[error("node {node} has parent {parent}, which is not an earlier node")]
    InvalidParent { node: usize, parent: usize },
    #[error("replaying samples: {0}")]
    Build(#[from] BuildError),
}

/// Persisted form of `profile`.
pub fn export_profile(profile: &Profile) -> ProfileFile {
    let tree = profile.append_order_tree();
    // File node indices skip the root.
    let file_index = |id: NodeId| id.index().checked_sub(1);

    let frames = profile.frames().iter().map(|(_, f)| f.info().clone()).collect();
    let nodes = tree
        .iter()
        .filter_map(|(_, node)| {
            let frame = node.frame()?;
            Some(NodeRecord {
                frame: frame.index(),
                parent: node.parent().and_then(file_index),
            })
        })
        .collect();
    let samples = profile.samples().iter().map(|&id| file_index(id)).collect();

    ProfileFile {
        name: profile.name().to_string(),
        unit: profile.unit(),
        total_weight: profile.total_weight(),
        frames,
        nodes,
        samples,
        weights: profile.weights().to_vec(),
        exporter: Some(format!("flame-tree-core@{}", env!("CARGO_PKG_VERSION"))),
    }
}

/// Serialize `profile` as pretty-printed interchange JSON.
pub fn to_json(profile: &Profile) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export_profile(profile))
}

pub fn parse_profile_json(data: &[u8]) -> Result<Profile, ImportError> {
    let file: ProfileFile = serde_json::from_slice(data)?;
    import_profile(&file)
}

pub fn import_profile(file: &ProfileFile) -> Result<Profile, ImportError> {
    if file.samples.len() != file.weights.len() {
        return Err(ImportError::LengthMismatch {
            samples: file.samples.len(),
            weights: file.weights.len(),
        });
    }

    let tree = rebuild_tree(file)?;
    let samples = file
        .samples
        .iter()
        .enumerate()
        .map(|(sample, node)| match *node {
            None => Ok(tree.root()),
            Some(node) if node < file.nodes.len() => Ok(NodeId::from_index(node + 1)),
            Some(node) => Err(ImportError::UnknownNode {
                sample,
                node,
                count: file.nodes.len(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = StreamingBuilder::new();
    builder.set_name(file.name.clone());
    builder.set_unit(file.unit);
    for info in &file.frames {
        builder.add_frame(info);
    }

    replay_samples(&tree, &samples, &file.weights, |transition, id, value| {
        let Some(frame) = tree[id].frame() else {
            return Ok(());
        };
        let info = &file.frames[frame.index()];
        match transition {
            Transition::Open => builder.enter_frame(info, value),
            Transition::Close => builder.leave_frame(info, value),
        }
    })?;
    builder.set_total_weight(file.total_weight);

    let profile = builder.build()?;
    debug!(
        name = %file.name,
        exporter = file.exporter.as_deref().unwrap_or("unknown"),
        frames = file.frames.len(),
        nodes = file.nodes.len(),
        "imported profile"
    );
    Ok(profile)
}

/// Append-order tree described by `file.nodes`, keyed by file frame index.
fn rebuild_tree(file: &ProfileFile) -> Result<CallTree, ImportError> {
    let mut tree = CallTree::new();
    for (node, record) in file.nodes.iter().enumerate() {
        if record.frame >= file.frames.len() {
            return Err(ImportError::UnknownFrame {
                node,
                frame: record.frame,
                count: file.frames.len(),
            });
        }
        let parent = match record.parent {
            None => tree.root(),
            Some(parent) if parent < node => NodeId::from_index(parent + 1),
            Some(parent) => return Err(ImportError::InvalidParent { node, parent }),
        };
        tree.push_child(parent, FrameId::from_index(record.frame));
    }
    Ok(tree)
}
