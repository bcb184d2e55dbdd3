//! Tie-break policies that pin every choice.

use std::collections::VecDeque;

use harvest_core::selection::SelectionPolicy;

/// Always picks the same index, clamped to the candidate count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedIndex(pub usize);

impl SelectionPolicy for FixedIndex {
    fn pick(&mut self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Replays a script of picks, then falls back to index 0.
///
/// Records every candidate count it was asked about so tests can assert
/// how many ties the engine broke.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelection {
    script: VecDeque<usize>,
    asked: Vec<usize>,
}

impl ScriptedSelection {
    /// Create a policy from a pick script.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        Self {
            script: script.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Candidate counts seen so far, in call order.
    #[must_use]
    pub fn asked(&self) -> &[usize] {
        &self.asked
    }

    /// Picks not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl SelectionPolicy for ScriptedSelection {
    fn pick(&mut self, len: usize) -> usize {
        self.asked.push(len);
        self.script
            .pop_front()
            .unwrap_or(0)
            .min(len.saturating_sub(1))
    }
}
