//! Call-tree profile core: frame interning, the append-order and grouped
//! call trees, two profile builders, the call-tree algebra and the
//! interchange format.
//!
//! ```
//! use flame_tree_core::builders::BatchBuilder;
//! use flame_tree_protocol::FrameInfo;
//!
//! let (main, work) = (FrameInfo::named("main"), FrameInfo::named("work"));
//! let mut builder = BatchBuilder::new();
//! builder.append_sample(&[main.clone(), work.clone()], 3.0)?;
//! builder.append_sample(&[main], 1.0)?;
//! let profile = builder.build();
//! assert_eq!(profile.total_weight(), 4.0);
//! # Ok::<(), flame_tree_core::builders::BuildError>(())
//! ```

pub mod builders;
pub mod file_format;
pub mod model;
pub mod views;

#[cfg(test)]
mod test_util;

pub use builders::{BatchBuilder, BuildError, StreamingBuilder};
pub use file_format::{ImportError, export_profile, import_profile, parse_profile_json, to_json};
pub use model::{CallTree, CallTreeNode, Frame, FrameId, NodeId, Profile};
pub use views::{CallVisitor, RankedEntry, RankedSort, ranked_frames};
