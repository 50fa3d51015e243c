use super::FrameId;

/// Index of a node in its [`CallTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

/// What a call-tree node stands for. Every tree owns exactly one `Root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Call(FrameId),
}

/// One position in a call tree.
#[derive(Debug, Clone)]
pub struct CallTreeNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    self_weight: f64,
    total_weight: f64,
    /// Set once no further calls may be merged into this node.
    frozen: bool,
}

impl CallTreeNode {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            self_weight: 0.0,
            total_weight: 0.0,
            frozen: false,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The called frame, `None` for the root.
    pub fn frame(&self) -> Option<FrameId> {
        match self.kind {
            NodeKind::Root => None,
            NodeKind::Call(frame) => Some(frame),
        }
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn self_weight(&self) -> f64 {
        self.self_weight
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn add_self_weight(&mut self, delta: f64) {
        self.self_weight += delta;
    }

    pub(crate) fn add_total_weight(&mut self, delta: f64) {
        self.total_weight += delta;
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }
}

/// How a builder looks for an existing child to descend into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TreeOrder {
    /// Only the most recently appended child is a merge candidate.
    AppendOrder,
    /// Any child with the same frame is a merge candidate.
    Grouped,
}

/// Arena-allocated call tree. Node 0 is the root; parents are always
/// allocated before their children.
#[derive(Debug, Clone)]
pub struct CallTree {
    nodes: Vec<CallTreeNode>,
}

impl CallTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![CallTreeNode::new(NodeKind::Root, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&CallTreeNode> {
        self.nodes.get(id.index())
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in allocation order, root first.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CallTreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from_index(i), n))
    }

    /// `id` followed by its ancestors, innermost first, stopping before the root.
    pub fn path_to_root(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |&n| self[n].parent).filter(|&n| !self[n].is_root())
    }

    pub(crate) fn push_child(&mut self, parent: NodeId, frame: FrameId) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes
            .push(CallTreeNode::new(NodeKind::Call(frame), Some(parent)));
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Step from `parent` into a child calling `frame`, reusing an open
    /// matching child when `order` allows it and creating one otherwise.
    pub(crate) fn descend(&mut self, parent: NodeId, frame: FrameId, order: TreeOrder) -> NodeId {
        let kind = NodeKind::Call(frame);
        let children = &self[parent].children;
        let candidate = match order {
            TreeOrder::AppendOrder => children.last().copied(),
            TreeOrder::Grouped => children.iter().copied().find(|&c| self[c].kind == kind),
        };
        if let Some(child) = candidate
            && !self[child].frozen
            && self[child].kind == kind
        {
            return child;
        }
        self.push_child(parent, frame)
    }

    pub(crate) fn freeze_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.index()].children);
        for &child in &children {
            self.nodes[child.index()].freeze();
        }
        self.nodes[id.index()].children = children;
    }

    /// Add `delta` to the total weight of every node in `stack` and to the
    /// self weight of its last node.
    pub(crate) fn add_weight_along(&mut self, stack: &[NodeId], delta: f64) {
        for &id in stack {
            self[id].add_total_weight(delta);
        }
        if let Some(&top) = stack.last() {
            self[top].add_self_weight(delta);
        }
    }

    /// Reorder every node's children by decreasing total weight. Stable, so
    /// equal-weight siblings keep their first-seen order.
    pub(crate) fn sort_by_total_weight(&mut self) {
        for i in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[i].children);
            children.sort_by(|a, b| {
                self.nodes[b.index()]
                    .total_weight
                    .total_cmp(&self.nodes[a.index()].total_weight)
            });
            self.nodes[i].children = children;
        }
    }
}

impl Default for CallTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<NodeId> for CallTree {
    type Output = CallTreeNode;

    fn index(&self, id: NodeId) -> &CallTreeNode {
        &self.nodes[id.index()]
    }
}

impl std::ops::IndexMut<NodeId> for CallTree {
    fn index_mut(&mut self, id: NodeId) -> &mut CallTreeNode {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: FrameId = FrameId::from_index(0);
    const B: FrameId = FrameId::from_index(1);

    #[test]
    fn append_order_reuses_only_last_open_child() {
        let mut tree = CallTree::new();
        let root = tree.root();
        let a1 = tree.descend(root, A, TreeOrder::AppendOrder);
        assert_eq!(tree.descend(root, A, TreeOrder::AppendOrder), a1);

        let b = tree.descend(root, B, TreeOrder::AppendOrder);
        assert_ne!(b, a1);
        // `a` is no longer the last child, so a new branch starts.
        let a2 = tree.descend(root, A, TreeOrder::AppendOrder);
        assert_ne!(a2, a1);
        assert_eq!(tree[root].children(), &[a1, b, a2]);
    }

    #[test]
    fn frozen_child_is_not_reused() {
        let mut tree = CallTree::new();
        let root = tree.root();
        let a1 = tree.descend(root, A, TreeOrder::AppendOrder);
        tree.freeze_children(root);
        assert!(tree[a1].is_frozen());
        let a2 = tree.descend(root, A, TreeOrder::AppendOrder);
        assert_ne!(a1, a2);
    }

    #[test]
    fn grouped_merges_non_adjacent_siblings() {
        let mut tree = CallTree::new();
        let root = tree.root();
        let a = tree.descend(root, A, TreeOrder::Grouped);
        let b = tree.descend(root, B, TreeOrder::Grouped);
        assert_eq!(tree.descend(root, A, TreeOrder::Grouped), a);
        assert_eq!(tree.descend(root, B, TreeOrder::Grouped), b);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn path_to_root_skips_root() {
        let mut tree = CallTree::new();
        let a = tree.push_child(tree.root(), A);
        let b = tree.push_child(a, B);
        let path: Vec<_> = tree.path_to_root(b).collect();
        assert_eq!(path, vec![b, a]);
        assert_eq!(tree.path_to_root(tree.root()).count(), 0);
    }

    #[test]
    fn sorts_children_heaviest_first_and_stable() {
        let mut tree = CallTree::new();
        let root = tree.root();
        let a = tree.push_child(root, A);
        let b = tree.push_child(root, B);
        let c = tree.push_child(root, FrameId::from_index(2));
        tree.add_weight_along(&[a], 1.0);
        tree.add_weight_along(&[b], 5.0);
        tree.add_weight_along(&[c], 1.0);
        tree.sort_by_total_weight();
        assert_eq!(tree[root].children(), &[b, a, c]);
        assert_eq!(tree[b].self_weight(), 5.0);
    }
}
