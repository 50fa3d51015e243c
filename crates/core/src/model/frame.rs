use std::collections::HashMap;

use flame_tree_protocol::{FrameInfo, FrameKey, SharedStr};

/// Index of a frame in its profile's [`FrameTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u32);

impl FrameId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

/// An interned call site plus the weight accumulated by every call to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    info: FrameInfo,
    self_weight: f64,
    total_weight: f64,
}

impl Frame {
    fn new(info: FrameInfo) -> Self {
        Self {
            info,
            self_weight: 0.0,
            total_weight: 0.0,
        }
    }

    pub fn info(&self) -> &FrameInfo {
        &self.info
    }

    pub fn key(&self) -> &FrameKey {
        &self.info.key
    }

    pub fn name(&self) -> &SharedStr {
        &self.info.name
    }

    pub fn file(&self) -> Option<&SharedStr> {
        self.info.file.as_ref()
    }

    pub fn line(&self) -> Option<u32> {
        self.info.line
    }

    pub fn col(&self) -> Option<u32> {
        self.info.col
    }

    /// Weight of samples where this frame was the top of the stack.
    pub fn self_weight(&self) -> f64 {
        self.self_weight
    }

    /// Weight of samples where this frame was anywhere on the stack,
    /// counted once per sample even when it recurs.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub(crate) fn add_self_weight(&mut self, delta: f64) {
        self.self_weight += delta;
    }

    pub(crate) fn add_total_weight(&mut self, delta: f64) {
        self.total_weight += delta;
    }

    pub(crate) fn overwrite_weights_with(&mut self, other: &Frame) {
        self.self_weight = other.self_weight;
        self.total_weight = other.total_weight;
    }

    /// Replace display symbols. The key never changes.
    pub(crate) fn apply_remap(&mut self, remap: SymbolRemap) {
        if let Some(name) = remap.name {
            self.info.name = name;
        }
        if let Some(file) = remap.file {
            self.info.file = Some(file);
        }
        if remap.line.is_some() {
            self.info.line = remap.line;
        }
        if remap.col.is_some() {
            self.info.col = remap.col;
        }
    }
}

/// Replacement symbol information returned by a remapping callback.
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolRemap {
    pub name: Option<SharedStr>,
    pub file: Option<SharedStr>,
    pub line: Option<u32>,
    pub col: Option<u32>,
}

/// Frame interner: one [`Frame`] per distinct [`FrameKey`], enumerated in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct FrameTable {
    frames: Vec<Frame>,
    by_key: HashMap<FrameKey, FrameId>,
}

impl FrameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the frame already interned under `info.key`, or intern `info`.
    pub fn get_or_insert(&mut self, info: &FrameInfo) -> FrameId {
        if let Some(&id) = self.by_key.get(&info.key) {
            return id;
        }
        let id = FrameId::from_index(self.frames.len());
        self.frames.push(Frame::new(info.clone()));
        self.by_key.insert(info.key.clone(), id);
        id
    }

    pub fn get(&self, key: &FrameKey) -> Option<FrameId> {
        self.by_key.get(key).copied()
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (FrameId, &Frame)> {
        self.frames
            .iter()
            .enumerate()
            .map(|(i, f)| (FrameId::from_index(i), f))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.iter_mut()
    }
}

impl std::ops::Index<FrameId> for FrameTable {
    type Output = Frame;

    fn index(&self, id: FrameId) -> &Frame {
        &self.frames[id.index()]
    }
}

impl std::ops::IndexMut<FrameId> for FrameTable {
    fn index_mut(&mut self, id: FrameId) -> &mut Frame {
        &mut self.frames[id.index()]
    }
}
