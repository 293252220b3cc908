//! Item × position-unit association weights.
//!
//! One row per item slot, one column per position unit. Weights start at
//! zero each trial, grow toward the asymptote `L` when an item is encoded at
//! a position, and shrink through decay or response suppression. A weight is
//! only ever positive on a unit that was active in a position the item was
//! encoded at.

use crate::position::PositionVector;
use crate::types::{ItemId, ItemLayout};

/// Dense item × position-unit weight matrix.
#[derive(Debug, Clone)]
pub struct AssociationMatrix {
    layout: ItemLayout,
    units: usize,
    weights: Vec<f64>,
}

impl AssociationMatrix {
    /// An all-zero matrix.
    #[must_use]
    pub fn new(layout: ItemLayout, units: usize) -> Self {
        Self {
            layout,
            units,
            weights: vec![0.0; layout.slots() * units],
        }
    }

    /// Zero every weight.
    pub fn reset(&mut self) {
        self.weights.fill(0.0);
    }

    /// Multiply every non-zero weight by `factor`, skipping the row of `except`.
    pub fn decay(&mut self, factor: f64, except: Option<ItemId>) {
        let skip = except.map(|id| self.layout.slot(id));
        for (slot, row) in self.weights.chunks_mut(self.units.max(1)).enumerate() {
            if Some(slot) == skip {
                continue;
            }
            for w in row.iter_mut().filter(|w| **w != 0.0) {
                *w *= factor;
            }
        }
    }

    /// Move the weights of `item` at every unit active in `cue` toward
    /// `asymptote` by the fraction `eta`.
    pub fn reinforce(&mut self, item: ItemId, cue: &PositionVector, eta: f64, asymptote: f64) {
        let row = self.row_mut(item);
        for unit in cue.active_units() {
            if let Some(w) = row.get_mut(unit) {
                *w += (asymptote - *w) * eta;
            }
        }
    }

    /// Dot product of the binary cue with the row of `item`.
    #[must_use]
    pub fn activation(&self, item: ItemId, cue: &PositionVector) -> f64 {
        let row = self.row(item);
        cue.active_units().filter_map(|unit| row.get(unit)).sum()
    }

    /// Subtract `amount` from the weights of `item` at `units`, clamping at zero.
    pub fn suppress(&mut self, item: ItemId, units: impl IntoIterator<Item = usize>, amount: f64) {
        let row = self.row_mut(item);
        for unit in units {
            if let Some(w) = row.get_mut(unit) {
                *w = (*w - amount).max(0.0);
            }
        }
    }

    /// Weight of `item` at position unit `unit`.
    #[must_use]
    pub fn weight(&self, item: ItemId, unit: usize) -> f64 {
        self.row(item).get(unit).copied().unwrap_or(0.0)
    }

    /// All weights of `item`.
    #[must_use]
    pub fn row(&self, item: ItemId) -> &[f64] {
        let start = self.layout.slot(item) * self.units;
        &self.weights[start..start + self.units]
    }

    /// Number of position units per row.
    #[must_use]
    pub fn units(&self) -> usize {
        self.units
    }

    /// Sum of every weight in the matrix.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    fn row_mut(&mut self, item: ItemId) -> &mut [f64] {
        let start = self.layout.slot(item) * self.units;
        &mut self.weights[start..start + self.units]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: f64 = 1.0 / 9.0;

    fn matrix() -> AssociationMatrix {
        AssociationMatrix::new(ItemLayout::new(3, 2), 12)
    }

    fn cue() -> PositionVector {
        PositionVector::from_offsets(6, &[1, 4])
    }

    #[test]
    fn reinforce_touches_only_active_units() {
        let mut m = matrix();
        let a = ItemId::Memorandum(0);
        m.reinforce(a, &cue(), 0.5, L);
        for unit in 0..12 {
            let expected = if unit == 1 || unit == 10 { L * 0.5 } else { 0.0 };
            assert!((m.weight(a, unit) - expected).abs() < 1e-12, "unit {unit}");
        }
        assert!(m.row(ItemId::Memorandum(1)).iter().all(|w| *w == 0.0));
    }

    #[test]
    fn reinforce_approaches_the_asymptote() {
        let mut m = matrix();
        let a = ItemId::Memorandum(0);
        for _ in 0..200 {
            m.reinforce(a, &cue(), 0.3, L);
        }
        assert!((m.weight(a, 1) - L).abs() < 1e-9);
        m.reinforce(a, &cue(), 1.0, L);
        assert!((m.weight(a, 1) - L).abs() < 1e-12);
    }

    #[test]
    fn activation_sums_cued_weights() {
        let mut m = matrix();
        let d = ItemId::Distractor(1);
        m.reinforce(d, &cue(), 1.0, L);
        assert!((m.activation(d, &cue()) - 2.0 * L).abs() < 1e-12);
        let other = PositionVector::from_offsets(6, &[0, 4]);
        assert!((m.activation(d, &other) - L).abs() < 1e-12);
    }

    #[test]
    fn decay_identities() {
        let mut m = matrix();
        let a = ItemId::Memorandum(0);
        let b = ItemId::Memorandum(2);
        m.reinforce(a, &cue(), 1.0, L);
        m.reinforce(b, &cue(), 1.0, L);
        let before = m.total();
        m.decay(1.0, None);
        assert!((m.total() - before).abs() < 1e-12);
        m.decay(0.5, Some(a));
        assert!((m.weight(a, 1) - L).abs() < 1e-12);
        assert!((m.weight(b, 1) - L / 2.0).abs() < 1e-12);
        m.decay(0.0, None);
        assert!(m.total().abs() < f64::EPSILON);
    }

    #[test]
    fn suppression_never_goes_negative() {
        let mut m = matrix();
        let a = ItemId::Memorandum(1);
        m.reinforce(a, &cue(), 1.0, L);
        m.suppress(a, [1, 2, 99], 1.0);
        assert!(m.weight(a, 1).abs() < f64::EPSILON);
        assert!(m.weight(a, 2).abs() < f64::EPSILON);
        assert!((m.weight(a, 10) - L).abs() < 1e-12);
    }
}
