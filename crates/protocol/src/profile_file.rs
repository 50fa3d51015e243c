use serde::{Deserialize, Serialize};

use crate::{FrameInfo, ValueUnit};

/// Persisted form of a finished profile: the interned frames, the
/// append-order call tree and the sample ledger.
///
/// ```text
///   frames[i]   deduplicated descriptors, in interning order
///   nodes[j]    { frame: i, parent?: j' }   (j' < j, absent = child of root)
///   samples[k]  j, or null for an idle (empty-stack) sample
///   weights[k]  weight of sample k
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: ValueUnit,
    /// Profile duration; may exceed the sum of `weights` when the trace
    /// ends with idle time.
    #[serde(default)]
    pub total_weight: f64,
    pub frames: Vec<FrameInfo>,
    pub nodes: Vec<NodeRecord>,
    pub samples: Vec<Option<usize>>,
    pub weights: Vec<f64>,
    /// Tool and version that wrote the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exporter: Option<String>,
}

/// One append-order call-tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Index into `ProfileFile::frames`.
    pub frame: usize,
    /// Index into `ProfileFile::nodes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let json = r#"{
            "frames": [{"key": 0, "name": "main"}, {"key": 1, "name": "work", "file": "w.c", "line": 3}],
            "nodes": [{"frame": 0}, {"frame": 1, "parent": 0}],
            "samples": [0, 1, null],
            "weights": [1, 2.5, 4]
        }"#;
        let file: ProfileFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.name, "");
        assert_eq!(file.unit, ValueUnit::None);
        assert_eq!(file.frames[1].line, Some(3));
        assert_eq!(file.nodes[1].parent, Some(0));
        assert_eq!(file.samples, vec![Some(0), Some(1), None]);
        assert_eq!(file.weights, vec![1.0, 2.5, 4.0]);
    }

    #[test]
    fn serializes_camel_case() {
        let file = ProfileFile {
            name: "p".into(),
            unit: ValueUnit::Milliseconds,
            total_weight: 3.0,
            frames: vec![FrameInfo::named("a")],
            nodes: vec![NodeRecord {
                frame: 0,
                parent: None,
            }],
            samples: vec![Some(0)],
            weights: vec![3.0],
            exporter: None,
        };
        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["totalWeight"], 3.0);
        assert_eq!(value["unit"], "milliseconds");
        assert!(value["nodes"][0].get("parent").is_none());
        assert!(value.get("exporter").is_none());
    }
}
