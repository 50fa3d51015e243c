//! Helpers shared by unit tests.

use flame_tree_protocol::FrameInfo;

use crate::model::{CallTree, CallTreeNode, Frame, NodeId, Profile};
use crate::views::CallVisitor;

pub(crate) fn frame(key: &str) -> FrameInfo {
    FrameInfo::named(key).with_location(format!("{key}.ts"), Some(key.len() as u32), None)
}

/// Collapsed-stack rendering of the call sequence: one `"a;b <weight>"`
/// line per interval where the open stack stays the same.
struct StackListRecorder<'p> {
    profile: &'p Profile,
    lines: Vec<String>,
    stack: Vec<String>,
    last_value: f64,
}

impl StackListRecorder<'_> {
    fn maybe_emit(&mut self, value: f64) {
        if self.last_value != value {
            let weight = self.profile.format_value(value - self.last_value);
            self.lines.push(format!("{} {weight}", self.stack.join(";")));
            self.last_value = value;
        }
    }
}

impl CallVisitor for StackListRecorder<'_> {
    fn open_frame(&mut self, _node: &CallTreeNode, frame: &Frame, value: f64) {
        self.maybe_emit(value);
        self.stack.push(frame.name().to_string());
    }

    fn close_frame(&mut self, _node: &CallTreeNode, _frame: &Frame, value: f64) {
        self.maybe_emit(value);
        self.stack.pop();
    }
}

pub(crate) fn stack_list(profile: &Profile, grouped: bool) -> Vec<String> {
    let mut recorder = StackListRecorder {
        profile,
        lines: Vec::new(),
        stack: Vec::new(),
        last_value: 0.0,
    };
    if grouped {
        profile.for_each_call_grouped(&mut recorder);
    } else {
        profile.for_each_call(&mut recorder);
    }
    recorder.lines
}

/// `(key:self:total` per node, children indented, root shown as `root`.
pub(crate) fn tree_string(profile: &Profile, grouped: bool) -> String {
    fn visit(profile: &Profile, tree: &CallTree, id: NodeId, lines: &mut Vec<String>, indent: usize) {
        let node = &tree[id];
        let key = match node.frame().and_then(|f| profile.frame(f)) {
            Some(frame) => frame.key().to_string(),
            None => "root".to_string(),
        };
        let pad = "  ".repeat(indent);
        let label = format!("{key}:{}:{}", node.self_weight(), node.total_weight());
        if node.children().is_empty() {
            lines.push(format!("{pad}({label})"));
            return;
        }
        lines.push(format!("{pad}({label}"));
        for &child in node.children() {
            visit(profile, tree, child, lines, indent + 1);
        }
        lines.push(format!("{pad})"));
    }

    let tree = if grouped {
        profile.grouped_tree()
    } else {
        profile.append_order_tree()
    };
    let mut lines = Vec::new();
    visit(profile, tree, tree.root(), &mut lines, 0);
    lines.join("\n")
}
