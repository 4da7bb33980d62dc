//! Fixed-length sample history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Ordered history whose length never changes after construction.
///
/// Built pre-filled to capacity; every [`push`](Self::push) appends one
/// item and drops the oldest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlidingWindow<T> {
    items: VecDeque<T>,
}

impl<T> SlidingWindow<T> {
    /// Build a window of `len` items produced by `seed(index)`, oldest first.
    pub fn filled_with(len: usize, mut seed: impl FnMut(usize) -> T) -> Self {
        Self {
            items: (0..len).map(&mut seed).collect(),
        }
    }

    /// Append `item`, evicting the oldest. A zero-length window stays empty.
    pub fn push(&mut self, item: T) {
        if self.items.is_empty() {
            return;
        }
        self.items.pop_front();
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
