use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a session needs at least one stimulus image")]
pub struct EmptyStimulusSet;

/// The ordered set of images a session draws its stimuli from.
#[derive(Debug, Clone)]
pub struct StimulusSet {
    dir: PathBuf,
    names: Vec<String>,
}

impl StimulusSet {
    pub fn new(dir: PathBuf, names: Vec<String>) -> Result<Self, EmptyStimulusSet> {
        if names.is_empty() {
            return Err(EmptyStimulusSet);
        }
        Ok(Self { dir, names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn path(&self, index: usize) -> Option<PathBuf> {
        self.names.get(index).map(|name| self.dir.join(name))
    }

    /// Iterates `(name, full path)` pairs in presentation-index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PathBuf)> + '_ {
        self.names
            .iter()
            .map(|name| (name.as_str(), self.dir.join(name)))
    }
}

/// Fixed-capacity FIFO over the most recently shown stimuli, newest last.
///
/// A capacity of `n + 1` implements an n-back window: the newest entry
/// repeats the oldest one exactly when the stimulus shown `n` steps ago
/// comes up again.
#[derive(Debug, Clone)]
pub struct RecencyBuffer {
    entries: Vec<usize>,
    capacity: usize,
}

impl RecencyBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "an n-back window needs at least two entries");
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, index: usize) {
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(index);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    /// True when the window is full and the newest entry repeats the oldest.
    pub fn is_repeat(&self) -> bool {
        self.is_full() && self.entries.first() == self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
