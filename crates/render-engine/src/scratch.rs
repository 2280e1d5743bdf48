//! Bookkeeping for files living in the engine's scratch space.

use std::collections::BTreeMap;

/// Filename → present flag for every scratch file the encoder created.
///
/// Removing a name that was never registered is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ScratchRegistry {
    files: BTreeMap<String, bool>,
}

impl ScratchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>) {
        self.files.insert(name.into(), true);
    }

    /// Forget `name`, returning whether it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.files.remove(name).unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.get(name).copied().unwrap_or(false)
    }

    /// Remove and return every registered name, sorted.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.files)
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .filter(|(_, present)| **present)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.names().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
