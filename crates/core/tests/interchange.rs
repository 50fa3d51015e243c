//! Integration test: load a persisted profile, replay it through the
//! call-tree algebra and write it back out.

use flame_tree_core::{CallTreeNode, CallVisitor, Frame, Profile, parse_profile_json, to_json};
use flame_tree_protocol::FrameKey;

#[derive(Default)]
struct StackLines {
    lines: Vec<String>,
    stack: Vec<String>,
    last_value: f64,
}

impl StackLines {
    fn flush(&mut self, value: f64) {
        if value != self.last_value {
            self.lines
                .push(format!("{} {}", self.stack.join(";"), value - self.last_value));
            self.last_value = value;
        }
    }
}

impl CallVisitor for StackLines {
    fn open_frame(&mut self, _node: &CallTreeNode, frame: &Frame, value: f64) {
        self.flush(value);
        self.stack.push(frame.name().to_string());
    }

    fn close_frame(&mut self, _node: &CallTreeNode, _frame: &Frame, value: f64) {
        self.flush(value);
        self.stack.pop();
    }
}

fn calls(profile: &Profile) -> Vec<String> {
    let mut lines = StackLines::default();
    profile.for_each_call(&mut lines);
    lines.lines
}

fn grouped_calls(profile: &Profile) -> Vec<String> {
    let mut lines = StackLines::default();
    profile.for_each_call_grouped(&mut lines);
    lines.lines
}

fn load_fixture() -> Profile {
    let data = include_bytes!("fixtures/scenario.json");
    parse_profile_json(data).expect("fixture should import")
}

#[test]
fn fixture_replays_call_sequence() {
    let profile = load_fixture();
    assert_eq!(profile.name(), "scenario");
    assert_eq!(profile.total_weight(), 15.0);
    assert_eq!(profile.total_non_idle_weight(), 10.0);

    assert_eq!(
        calls(&profile),
        [
            "a 1", "a;b 2", "a;b;d 1", "a;b;c 1", " 1", "a 1", "a;b 1", "a;b;b 1", "a;b;e 1",
            "a 1",
        ]
    );
    assert_eq!(
        grouped_calls(&profile),
        ["a;b;d 1", "a;b;c 1", "a;b;b 1", "a;b;e 1", "a;b 3", "a 3"]
    );

    let mut keys = Vec::new();
    profile.for_each_frame(|_, frame| keys.push(frame.key().to_string()));
    assert_eq!(keys, ["a", "b", "d", "c", "e"]);
}

#[test]
fn frame_weights_survive_import() {
    let profile = load_fixture();
    let weights = |key: &str| {
        let (_, frame) = profile
            .frame_by_key(&FrameKey::from(key))
            .expect("frame should exist");
        (frame.self_weight(), frame.total_weight())
    };
    assert_eq!(weights("a"), (3.0, 10.0));
    // The recursive `a;b;b` sample counts once towards b's total.
    assert_eq!(weights("b"), (4.0, 7.0));
    assert_eq!(weights("c"), (1.0, 1.0));
    assert_eq!(weights("e"), (1.0, 1.0));
}

#[test]
fn export_then_import_is_stable() {
    let profile = load_fixture();
    let json = to_json(&profile).expect("profile should serialize");
    let reloaded = parse_profile_json(json.as_bytes()).expect("export should import");

    assert_eq!(calls(&reloaded), calls(&profile));
    assert_eq!(grouped_calls(&reloaded), grouped_calls(&profile));
    assert_eq!(reloaded.total_weight(), profile.total_weight());
}

#[test]
fn derived_profiles_from_fixture() {
    let profile = load_fixture();

    let flattened = profile.flatten_recursion().expect("flatten should succeed");
    assert_eq!(
        calls(&flattened),
        [
            "a 1", "a;b 2", "a;b;d 1", "a;b;c 1", " 1", "a 1", "a;b 2", "a;b;e 1", "a 1",
        ]
    );

    let key = FrameKey::from("b");
    let callers = profile
        .inverted_profile_for_callers_of(&key)
        .expect("inversion should succeed");
    assert_eq!(callers.total_weight(), 7.0);
    assert_eq!(calls(&callers), ["b;a 7"]);

    let callees = profile
        .profile_for_callees_of(&key)
        .expect("callee profile should succeed");
    assert_eq!(callees.total_weight(), 7.0);
    assert_eq!(
        grouped_calls(&callees),
        ["b;d 1", "b;c 1", "b;b 1", "b;e 1", "b 3"]
    );
}
