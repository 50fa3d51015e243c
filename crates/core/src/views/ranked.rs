use flame_tree_protocol::{FrameKey, SharedStr};

use crate::model::Profile;

/// A single row in the ranked table.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RankedEntry {
    pub key: FrameKey,
    pub name: SharedStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<SharedStr>,
    pub self_weight: f64,
    pub total_weight: f64,
}

/// Sort field for the ranked view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankedSort {
    SelfWeight,
    #[default]
    TotalWeight,
    Name,
}

/// One row per interned frame. Weights sort heaviest first and names
/// alphabetically; `ascending` reverses either.
pub fn ranked_frames(profile: &Profile, sort: RankedSort, ascending: bool) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = Vec::with_capacity(profile.frames().len());
    profile.for_each_frame(|_, frame| {
        entries.push(RankedEntry {
            key: frame.key().clone(),
            name: frame.name().clone(),
            file: frame.file().cloned(),
            self_weight: frame.self_weight(),
            total_weight: frame.total_weight(),
        });
    });

    match sort {
        RankedSort::SelfWeight => entries.sort_by(|a, b| b.self_weight.total_cmp(&a.self_weight)),
        RankedSort::TotalWeight => {
            entries.sort_by(|a, b| b.total_weight.total_cmp(&a.total_weight));
        }
        RankedSort::Name => entries.sort_by(|a, b| a.name.cmp(&b.name)),
    }

    if ascending {
        entries.reverse();
    }

    entries
}
