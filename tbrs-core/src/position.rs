//! Position layer: distributed codes for serial positions.
//!
//! The layer is split into equal blocks of units and every position has
//! exactly one active unit per block. Successive positions drift: each block
//! keeps its active unit with probability `P`, otherwise the unit is redrawn
//! uniformly inside the block. Neighbouring positions therefore share more
//! units than distant ones, which is what produces ordering errors.
//!
//! ```text
//! block:     0        1        2      ...
//! pos 1:  ..#...   #.....   ....#.
//! pos 2:  ..#...   ...#..   ....#.    (block 1 relocated)
//! pos 3:  .....#   ...#..   ....#.    (block 0 relocated)
//! ```
//!
//! Storing the active offset per block makes the one-unit-per-block
//! invariant hold by construction.

use crate::config::GeometryConfig;
use crate::random::RandomProcess;

/// The code of a single serial position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionVector {
    block_size: usize,
    /// Active unit offset within each block.
    active: Vec<usize>,
}

impl PositionVector {
    /// Build a vector from explicit per-block offsets.
    ///
    /// Offsets are reduced modulo `block_size`, so the invariant always holds.
    #[must_use]
    pub fn from_offsets(block_size: usize, offsets: &[usize]) -> Self {
        let block_size = block_size.max(1);
        Self {
            block_size,
            active: offsets.iter().map(|o| o % block_size).collect(),
        }
    }

    /// Number of blocks.
    #[must_use]
    pub fn blocks(&self) -> usize {
        self.active.len()
    }

    /// Total number of units in the layer.
    #[must_use]
    pub fn units(&self) -> usize {
        self.active.len() * self.block_size
    }

    /// Active unit offset in `block`.
    #[must_use]
    pub fn offset(&self, block: usize) -> Option<usize> {
        self.active.get(block).copied()
    }

    /// Global indices of the active units, one per block, ascending.
    pub fn active_units(&self) -> impl Iterator<Item = usize> + '_ {
        self.active
            .iter()
            .enumerate()
            .map(|(block, offset)| block * self.block_size + offset)
    }

    /// Whether the unit at global index `unit` is active.
    #[must_use]
    pub fn is_active(&self, unit: usize) -> bool {
        let block = unit / self.block_size;
        self.active.get(block) == Some(&(unit % self.block_size))
    }

    /// Dense binary form of the code.
    #[must_use]
    pub fn to_dense(&self) -> Vec<u8> {
        let mut dense = vec![0; self.units()];
        for unit in self.active_units() {
            dense[unit] = 1;
        }
        dense
    }

    /// Number of active units shared with another position.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> usize {
        self.active
            .iter()
            .zip(&other.active)
            .filter(|(a, b)| a == b)
            .count()
    }
}

/// The per-trial sequence of position codes.
///
/// Regenerated at the start of every trial and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PositionField {
    vectors: Vec<PositionVector>,
}

impl PositionField {
    /// Generate `count` successive positions.
    #[must_use]
    pub fn generate(
        geometry: &GeometryConfig,
        persistence: f64,
        count: usize,
        rng: &mut RandomProcess,
    ) -> Self {
        let blocks = geometry.unit_blocks;
        let block_size = geometry.block_size.max(1);
        let mut vectors = Vec::with_capacity(count);
        if count == 0 {
            return Self { vectors };
        }

        let mut offsets: Vec<usize> = (0..blocks).map(|_| rng.index(block_size)).collect();
        vectors.push(PositionVector::from_offsets(block_size, &offsets));

        for _ in 1..count {
            for offset in &mut offsets {
                if !rng.keep(persistence) {
                    *offset = rng.index(block_size);
                }
            }
            vectors.push(PositionVector::from_offsets(block_size, &offsets));
        }

        Self { vectors }
    }

    /// Generate the full `max_positions` sequence.
    #[must_use]
    pub fn generate_all(
        geometry: &GeometryConfig,
        persistence: f64,
        rng: &mut RandomProcess,
    ) -> Self {
        Self::generate(geometry, persistence, geometry.max_positions, rng)
    }

    /// Code of serial position `position` (1-based).
    ///
    /// # Panics
    /// Panics if `position` is zero or beyond the generated range; the trial
    /// driver sizes the field to the script before any cue is taken.
    #[must_use]
    pub fn cue(&self, position: usize) -> &PositionVector {
        &self.vectors[position - 1]
    }

    /// Code of serial position `position` (1-based), if generated.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&PositionVector> {
        position.checked_sub(1).and_then(|i| self.vectors.get(i))
    }

    /// Number of generated positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no positions were generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Iterate the positions in serial order.
    pub fn iter(&self) -> impl Iterator<Item = &PositionVector> {
        self.vectors.iter()
    }
}
