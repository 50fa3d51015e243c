//! Read-only transforms over a finished [`Profile`](crate::model::Profile).
//!
//! - `time_order`: chronological open/close replay of the sample ledger
//! - `left_heavy`: depth-first replay of the grouped tree
//! - `recursion`: recursion flattening
//! - `sandwich`: caller (inverted) and callee profiles for one frame
//! - `ranked`: per-frame self/total table

pub mod left_heavy;
pub mod ranked;
pub mod recursion;
pub mod sandwich;
pub mod time_order;

pub use ranked::{RankedEntry, RankedSort, ranked_frames};

use crate::model::{CallTreeNode, Frame};

/// Receives balanced open/close events from
/// [`Profile::for_each_call`](crate::model::Profile::for_each_call) and
/// [`Profile::for_each_call_grouped`](crate::model::Profile::for_each_call_grouped).
///
/// `value` is the cumulative weight at which the frame opens or closes.
/// The root is never reported.
pub trait CallVisitor {
    fn open_frame(&mut self, node: &CallTreeNode, frame: &Frame, value: f64);
    fn close_frame(&mut self, node: &CallTreeNode, frame: &Frame, value: f64);
}
