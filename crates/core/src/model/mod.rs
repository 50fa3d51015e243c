pub mod call_tree;
pub mod frame;
pub mod profile;

pub use call_tree::{CallTree, CallTreeNode, NodeId, NodeKind};
pub(crate) use call_tree::TreeOrder;
pub use frame::{Frame, FrameId, FrameTable, SymbolRemap};
pub use profile::Profile;
pub(crate) use profile::CallTrees;
