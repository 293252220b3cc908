//! Core identity and time types.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Item identity
// ---------------------------------------------------------------------------

/// Identity of an item within one trial.
///
/// Memoranda exist before the trial starts; distractors are allocated lazily,
/// in increasing index order, as processing operations consume them. Both
/// indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemId {
    /// A to-be-remembered item; index 0 is studied at serial position 1.
    Memorandum(usize),
    /// A transient item created by a processing operation.
    Distractor(usize),
}

impl ItemId {
    /// Whether this is a memorandum.
    #[must_use]
    pub fn is_memorandum(self) -> bool {
        matches!(self, Self::Memorandum(_))
    }

    /// Single-character label used in recall traces: `A..Z` for memoranda,
    /// `*` for distractors.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn label(self) -> char {
        match self {
            Self::Memorandum(i) if i < 26 => char::from(b'A' + i as u8),
            Self::Memorandum(_) | Self::Distractor(_) => '*',
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memorandum(i) if *i < 26 => write!(f, "{}", self.label()),
            Self::Memorandum(i) => write!(f, "M{}", i + 1),
            Self::Distractor(i) => write!(f, "{}", i + 1),
        }
    }
}

/// Maps item identities onto contiguous storage slots.
///
/// Memoranda occupy slots `0..memoranda`, distractors follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLayout {
    /// Memoranda held in the store.
    pub memoranda: usize,
    /// Distractor capacity.
    pub distractors: usize,
}

impl ItemLayout {
    /// Create a layout.
    #[must_use]
    pub fn new(memoranda: usize, distractors: usize) -> Self {
        Self {
            memoranda,
            distractors,
        }
    }

    /// Total number of slots.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.memoranda + self.distractors
    }

    /// Storage slot of an item.
    #[must_use]
    pub fn slot(&self, id: ItemId) -> usize {
        match id {
            ItemId::Memorandum(i) => i,
            ItemId::Distractor(i) => self.memoranda + i,
        }
    }

    /// Every memorandum followed by the first `allocated` distractors.
    pub fn live(&self, allocated: usize) -> impl Iterator<Item = ItemId> + use<> {
        (0..self.memoranda)
            .map(ItemId::Memorandum)
            .chain((0..allocated.min(self.distractors)).map(ItemId::Distractor))
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Simulated time elapsed within a trial.
///
/// Monotonic: only [`GlobalClock::advance`] moves it, and negative durations
/// are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct GlobalClock(f64);

impl GlobalClock {
    /// A clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self(0.0)
    }

    /// Advance by `duration`.
    pub fn advance(&mut self, duration: f64) {
        if duration > 0.0 {
            self.0 += duration;
        }
    }

    /// Current simulated time.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for GlobalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(ItemId::Memorandum(0).label(), 'A');
        assert_eq!(ItemId::Memorandum(25).label(), 'Z');
        assert_eq!(ItemId::Memorandum(26).label(), '*');
        assert_eq!(ItemId::Distractor(0).label(), '*');
        assert_eq!(ItemId::Distractor(2).to_string(), "3");
    }

    #[test]
    fn slots_do_not_collide() {
        let layout = ItemLayout::new(10, 90);
        assert_eq!(layout.slot(ItemId::Memorandum(9)), 9);
        assert_eq!(layout.slot(ItemId::Distractor(0)), 10);
        assert_eq!(layout.slot(ItemId::Distractor(89)), 99);
        assert_eq!(layout.slots(), 100);
    }

    #[test]
    fn live_items_in_identity_order() {
        let layout = ItemLayout::new(2, 5);
        let live: Vec<ItemId> = layout.live(2).collect();
        assert_eq!(
            live,
            vec![
                ItemId::Memorandum(0),
                ItemId::Memorandum(1),
                ItemId::Distractor(0),
                ItemId::Distractor(1),
            ]
        );
        assert_eq!(layout.live(99).count(), 7);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut clock = GlobalClock::new();
        clock.advance(0.5);
        clock.advance(-1.0);
        clock.advance(0.25);
        assert!((clock.now() - 0.75).abs() < f64::EPSILON);
    }
}
