//! Cycle guard for graph walks.

use crate::model::Value;
use std::collections::HashSet;

/// Identity set of the reference values currently being walked.
///
/// A value is entered before its children are visited and left once its
/// subtree is complete, so a value reached again through a sibling branch
/// is walked again while a value reached through its own descendants is
/// reported as a cycle.
#[derive(Debug, Default)]
pub struct ConversionContext {
    visiting: HashSet<usize>,
}

impl ConversionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `value` as being visited.
    ///
    /// Returns `false` when it is already on the current path. Scalars have
    /// no identity and are always accepted.
    pub fn enter(&mut self, value: &Value) -> bool {
        match value.identity() {
            Some(address) => self.visiting.insert(address),
            None => true,
        }
    }

    /// Remove `value` from the current path.
    pub fn leave(&mut self, value: &Value) {
        if let Some(address) = value.identity() {
            self.visiting.remove(&address);
        }
    }

    pub fn is_visiting(&self, value: &Value) -> bool {
        value
            .identity()
            .is_some_and(|address| self.visiting.contains(&address))
    }

    /// Number of values on the current path.
    pub fn depth(&self) -> usize {
        self.visiting.len()
    }
}
