//! Which runways are shown on the board.

use std::collections::BTreeSet;

use crate::model::RunwayId;

/// The visible subset of the known runways.
///
/// Invariant: the selection is empty only when no runway is known. Removing
/// the last selected runway is refused instead of emptying the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunwaySelection {
    known: BTreeSet<RunwayId>,
    selected: BTreeSet<RunwayId>,
}

impl RunwaySelection {
    /// Select every known runway.
    pub fn initialize(all: impl IntoIterator<Item = RunwayId>) -> Self {
        let known: BTreeSet<RunwayId> = all.into_iter().collect();
        Self {
            selected: known.clone(),
            known,
        }
    }

    /// Adopt a freshly loaded runway set.
    ///
    /// Keeps the previous choice where it still applies; falls back to
    /// selecting everything when nothing of it survives.
    pub fn refresh(&mut self, all: impl IntoIterator<Item = RunwayId>) {
        self.known = all.into_iter().collect();
        self.selected.retain(|id| self.known.contains(id));
        if self.selected.is_empty() {
            self.selected = self.known.clone();
        }
    }

    /// Flip one runway in or out of the selection.
    ///
    /// Returns whether the selection changed. Deselecting the only selected
    /// runway and toggling an unknown id are no-ops.
    pub fn toggle(&mut self, id: RunwayId) -> bool {
        if self.selected.contains(&id) {
            if self.selected.len() == 1 {
                return false;
            }
            self.selected.remove(&id)
        } else if self.known.contains(&id) {
            self.selected.insert(id)
        } else {
            false
        }
    }

    /// Whether `id` is currently shown.
    #[must_use]
    pub fn contains(&self, id: RunwayId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = RunwayId> + '_ {
        self.selected.iter().copied()
    }

    /// Number of selected runways.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing is selected (only possible with no known runways).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Number of known runways.
    #[must_use]
    pub fn known_len(&self) -> usize {
        self.known.len()
    }
}
