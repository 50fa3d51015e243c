//! Profile construction.
//!
//! Two ingestion strategies produce the same [`Profile`]:
//!
//! ```text
//!   whole stacks + weight  ──▶ BatchBuilder ─────┐
//!                                                ├─▶ ProfileParts::finish ──▶ Profile
//!   enter/leave + value    ──▶ StreamingBuilder ─┘
//! ```
//!
//! Both maintain the append-order tree, the grouped tree, the frame
//! interner and the sample ledger in lockstep.

pub mod batch;
pub mod streaming;

pub use batch::BatchBuilder;
pub use streaming::StreamingBuilder;

use flame_tree_protocol::{FrameKey, SharedStr, ValueUnit};
use thiserror::Error;
use tracing::debug;

use crate::model::{CallTrees, FrameTable, Profile};

/// Malformed input detected while building a profile. Any of these means
/// the whole import should be discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("invalid sample weight: {weight}")]
    InvalidWeight { weight: f64 },
    #[error("tried to leave frame {key} at {value} while no frame was open")]
    StackUnderflow { key: FrameKey, value: f64 },
    #[error("tried to leave frame \"{leaving}\" while \"{open}\" was on top at {value}")]
    FrameMismatch {
        leaving: SharedStr,
        open: SharedStr,
        value: f64,
    },
    #[error("{open} frame(s) still open when the profile was built")]
    UnbalancedFrames { open: usize },
    #[error("values must be non-decreasing: last was {last}, got {value}")]
    NonMonotonicValue { last: f64, value: f64 },
}

/// State shared by both builders.
#[derive(Debug, Default)]
pub(crate) struct ProfileParts {
    pub(crate) name: String,
    pub(crate) unit: ValueUnit,
    pub(crate) total_weight: f64,
    pub(crate) frames: FrameTable,
    pub(crate) trees: CallTrees,
}

impl ProfileParts {
    pub(crate) fn finish(self) -> Profile {
        let mut trees = self.trees;
        let sampled: f64 = trees.weights.iter().sum();
        let total_weight = self.total_weight.max(sampled);
        trees.grouped.sort_by_total_weight();

        debug!(
            name = %self.name,
            samples = trees.samples.len(),
            frames = self.frames.len(),
            append_order_nodes = trees.append_order.node_count(),
            grouped_nodes = trees.grouped.node_count(),
            total_weight,
            "built profile"
        );

        Profile::from_parts(self.name, self.unit, total_weight, self.frames, trees)
    }
}

/// `value` going backwards (or NaN) relative to `last`.
pub(crate) fn check_monotonic(last: f64, value: f64) -> Result<(), BuildError> {
    if value < last || value.is_nan() {
        return Err(BuildError::NonMonotonicValue { last, value });
    }
    Ok(())
}
