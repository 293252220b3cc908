//! Item store: LTM and WM patterns for every item of a trial.
//!
//! ```text
//!   slot:   0 .. max_memoranda-1 | max_memoranda .. +max_distractors-1
//!           memoranda (A, B, ...) | distractors (allocated lazily)
//!   LTM:    static ground truth   | uncharacterized until first use
//!   WM:     uncharacterized until encoded, then mutated by interference
//! ```
//!
//! The store owns both forms; the engines reach patterns through
//! [`ItemId`], never through raw slot arithmetic.

use crate::config::GeometryConfig;
use crate::embedding::EmbeddingTable;
use crate::error::{Result, TbrsError};
use crate::interference::blend;
use crate::pattern::ItemPattern;
use crate::random::RandomProcess;
use crate::types::{ItemId, ItemLayout};

/// A distractor handed out for one processing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistractorSlot {
    /// Identity of the distractor.
    pub id: ItemId,
    /// Whether its LTM pattern still has to be built.
    pub fresh: bool,
}

/// LTM and WM patterns of every memorandum and distractor.
#[derive(Debug, Clone)]
pub struct ItemStore {
    layout: ItemLayout,
    units: usize,
    ltm: Vec<ItemPattern>,
    wm: Vec<ItemPattern>,
    allocated: usize,
    shared: Option<ItemId>,
}

impl ItemStore {
    /// An empty store sized from the geometry. Every pattern starts uncharacterized.
    #[must_use]
    pub fn new(geometry: &GeometryConfig) -> Self {
        let layout = ItemLayout::new(geometry.max_memoranda, geometry.max_distractors);
        let units = geometry.item_units;
        Self {
            layout,
            units,
            ltm: vec![ItemPattern::uncharacterized(units); layout.slots()],
            wm: vec![ItemPattern::uncharacterized(units); layout.slots()],
            allocated: 0,
            shared: None,
        }
    }

    /// Start a new trial: regenerate memorandum LTM patterns and clear
    /// everything else.
    ///
    /// Rows of `table` are copied when given; otherwise every dimension is
    /// drawn uniformly in `[0, 1)`.
    ///
    /// # Errors
    /// Returns `TbrsError::Embedding` if the table lacks a row of the right
    /// width for some memorandum.
    pub fn generate_ltm(
        &mut self,
        rng: &mut RandomProcess,
        table: Option<&EmbeddingTable>,
    ) -> Result<()> {
        for index in 0..self.layout.memoranda {
            let pattern = match table {
                Some(table) => {
                    let row = table
                        .row(index)
                        .filter(|row| row.len() == self.units)
                        .ok_or_else(|| {
                            TbrsError::Embedding(format!(
                                "no row of {} values for memorandum {}",
                                self.units,
                                index + 1
                            ))
                        })?;
                    ItemPattern::from_values(row.iter().copied())
                }
                None => ItemPattern::from_values((0..self.units).map(|_| rng.uniform())),
            };
            self.ltm[index] = pattern;
        }
        for slot in self.layout.memoranda..self.layout.slots() {
            self.ltm[slot] = ItemPattern::uncharacterized(self.units);
        }
        for wm in &mut self.wm {
            *wm = ItemPattern::uncharacterized(self.units);
        }
        self.allocated = 0;
        self.shared = None;
        Ok(())
    }

    /// Allocate the next unused distractor.
    ///
    /// Exactly `max_distractors` allocations succeed per trial.
    ///
    /// # Errors
    /// Returns `TbrsError::DistractorBudgetExhausted` once the budget is spent.
    pub fn allocate_distractor(&mut self) -> Result<ItemId> {
        if self.allocated >= self.layout.distractors {
            return Err(TbrsError::DistractorBudgetExhausted {
                capacity: self.layout.distractors,
            });
        }
        let id = ItemId::Distractor(self.allocated);
        self.allocated += 1;
        Ok(id)
    }

    /// The distractor for the next processing operation.
    ///
    /// With `reuse`, the first call allocates and later calls return the same
    /// distractor with `fresh == false`.
    ///
    /// # Errors
    /// Propagates [`ItemStore::allocate_distractor`] failures.
    pub fn distractor_for_operation(&mut self, reuse: bool) -> Result<DistractorSlot> {
        if reuse {
            if let Some(id) = self.shared {
                return Ok(DistractorSlot { id, fresh: false });
            }
        }
        let id = self.allocate_distractor()?;
        if reuse {
            self.shared = Some(id);
        }
        Ok(DistractorSlot { id, fresh: true })
    }

    /// Number of distractors allocated so far this trial.
    #[must_use]
    pub fn allocated_distractors(&self) -> usize {
        self.allocated
    }

    /// Every memorandum, then every allocated distractor, in identity order.
    pub fn live_items(&self) -> impl Iterator<Item = ItemId> + use<> {
        self.layout.live(self.allocated)
    }

    /// Slot layout.
    #[must_use]
    pub fn layout(&self) -> ItemLayout {
        self.layout
    }

    /// Dimensions per pattern.
    #[must_use]
    pub fn units(&self) -> usize {
        self.units
    }

    /// LTM pattern of `id`.
    #[must_use]
    pub fn ltm(&self, id: ItemId) -> &ItemPattern {
        &self.ltm[self.layout.slot(id)]
    }

    /// WM pattern of `id`.
    #[must_use]
    pub fn wm(&self, id: ItemId) -> &ItemPattern {
        &self.wm[self.layout.slot(id)]
    }

    /// Replace the LTM pattern of `id`.
    pub fn set_ltm(&mut self, id: ItemId, pattern: ItemPattern) {
        let slot = self.layout.slot(id);
        self.ltm[slot] = pattern;
    }

    /// Overwrite the WM pattern of `id` with its LTM pattern.
    pub fn copy_ltm_to_wm(&mut self, id: ItemId) {
        let slot = self.layout.slot(id);
        self.wm[slot].clone_from(&self.ltm[slot]);
    }

    /// Pull the WM pattern of `target` toward the WM pattern of `source`.
    pub fn entangle(&mut self, target: ItemId, source: ItemId, proportion: f64) -> usize {
        let source = self.wm(source).clone();
        let slot = self.layout.slot(target);
        blend(&mut self.wm[slot], &source, proportion)
    }

    /// Pull the WM pattern of `target` toward the LTM pattern of `reference`.
    pub fn restore(&mut self, target: ItemId, reference: ItemId, proportion: f64) -> usize {
        let target = self.layout.slot(target);
        let reference = self.layout.slot(reference);
        blend(&mut self.wm[target], &self.ltm[reference], proportion)
    }

    /// Build a distractor pattern overlapping the WM pattern of `reference`.
    ///
    /// # Errors
    /// Returns `TbrsError::Config` if `overlap` lies outside `[0, 1]`.
    pub fn create_overlapping_pattern(
        &self,
        reference: ItemId,
        overlap: f64,
        noise: f64,
        rng: &mut RandomProcess,
    ) -> Result<ItemPattern> {
        overlapping_pattern(self.wm(reference), overlap, noise, rng)
    }
}

/// A sparse pattern sharing a fraction of `reference`'s characterized dimensions.
///
/// With `k` characterized reference dimensions, `round(overlap * k)` of them
/// form a contiguous run (random start) whose values are
/// `clamp(Normal(ref[d], noise), 0, 1)`, shuffled within the run. The
/// remaining `k - shared` dimensions, as many as exist, are a contiguous run
/// of the reference's uncharacterized dimensions with uniform values.
/// Everything else stays uncharacterized.
///
/// # Errors
/// Returns `TbrsError::Config` if `overlap` lies outside `[0, 1]`.
pub fn overlapping_pattern(
    reference: &ItemPattern,
    overlap: f64,
    noise: f64,
    rng: &mut RandomProcess,
) -> Result<ItemPattern> {
    if !(0.0..=1.0).contains(&overlap) {
        return Err(TbrsError::Config(
            "item distractor overlap should be between 0 and 1".into(),
        ));
    }
    let mut pattern = ItemPattern::uncharacterized(reference.len());
    let characterized = reference.characterized();
    let free = reference.uncharacterized_dims();
    let k = characterized.len();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let shared = ((overlap * k as f64).round() as usize).min(k);

    let start = rng.index(k - shared + 1);
    let run = &characterized[start..start + shared];
    let mut values: Vec<f64> = run
        .iter()
        .map(|&d| {
            let level = reference.get(d).unwrap_or_default();
            rng.normal(level, noise).clamp(0.0, 1.0)
        })
        .collect();
    rng.shuffle(&mut values);
    for (&d, value) in run.iter().zip(values) {
        pattern.set(d, Some(value));
    }

    let novel = (k - shared).min(free.len());
    let start = rng.index(free.len() - novel + 1);
    for &d in &free[start..start + novel] {
        pattern.set(d, Some(rng.uniform()));
    }
    Ok(pattern)
}
