//! Distributed item patterns.
//!
//! An item is a vector over item units. A dimension is either characterized
//! (a value in `[0, 1]` for generated items, any finite value for pretrained
//! embeddings) or uncharacterized (`None`), meaning the item says nothing
//! along that dimension. Distractors are sparse: most of their dimensions are
//! uncharacterized.

use serde::{Deserialize, Serialize};

/// Level an uncharacterized dimension takes when distances are computed.
///
/// It sits outside the unit interval, so a sparse pattern is far from a
/// dense one.
pub const UNCHARACTERIZED_LEVEL: f64 = -1.0;

/// A distributed item representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPattern {
    dims: Vec<Option<f64>>,
}

impl ItemPattern {
    /// A pattern with every dimension uncharacterized.
    #[must_use]
    pub fn uncharacterized(units: usize) -> Self {
        Self {
            dims: vec![None; units],
        }
    }

    /// A fully characterized pattern.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            dims: values.into_iter().map(Some).collect(),
        }
    }

    /// A pattern from explicit optional dimensions.
    #[must_use]
    pub fn from_dims(dims: Vec<Option<f64>>) -> Self {
        Self { dims }
    }

    /// Number of dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dims.len()
    }

    /// Whether the pattern has no dimensions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Value of dimension `d`, if characterized.
    #[must_use]
    pub fn get(&self, d: usize) -> Option<f64> {
        self.dims.get(d).copied().flatten()
    }

    /// Set dimension `d`. Out-of-range indices are ignored.
    pub fn set(&mut self, d: usize, value: Option<f64>) {
        if let Some(slot) = self.dims.get_mut(d) {
            *slot = value;
        }
    }

    /// All dimensions.
    #[must_use]
    pub fn dims(&self) -> &[Option<f64>] {
        &self.dims
    }

    pub(crate) fn dims_mut(&mut self) -> &mut [Option<f64>] {
        &mut self.dims
    }

    /// Indices of characterized dimensions, ascending.
    #[must_use]
    pub fn characterized(&self) -> Vec<usize> {
        self.indices(true)
    }

    /// Indices of uncharacterized dimensions, ascending.
    #[must_use]
    pub fn uncharacterized_dims(&self) -> Vec<usize> {
        self.indices(false)
    }

    /// Number of characterized dimensions.
    #[must_use]
    pub fn characterized_count(&self) -> usize {
        self.dims.iter().filter(|d| d.is_some()).count()
    }

    /// Whether dimension `d` is characterized.
    #[must_use]
    pub fn is_characterized(&self, d: usize) -> bool {
        self.get(d).is_some()
    }

    /// Root-mean-square difference over every dimension, with uncharacterized
    /// dimensions read as [`UNCHARACTERIZED_LEVEL`].
    ///
    /// Patterns of different lengths are compared over the shorter length
    /// but divided by the longer one.
    #[must_use]
    pub fn rmse(&self, other: &Self) -> f64 {
        let size = self.len().max(other.len());
        if size == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .dims
            .iter()
            .zip(&other.dims)
            .map(|(a, b)| {
                let diff = a.unwrap_or(UNCHARACTERIZED_LEVEL) - b.unwrap_or(UNCHARACTERIZED_LEVEL);
                diff * diff
            })
            .sum();
        (sum / size as f64).sqrt()
    }

    fn indices(&self, characterized: bool) -> Vec<usize> {
        self.dims
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_some() == characterized)
            .map(|(i, _)| i)
            .collect()
    }

    /// Compact rendering: two digits per characterized dimension, `--` otherwise.
    #[must_use]
    pub fn sketch(&self, max_dims: usize) -> String {
        self.dims
            .iter()
            .take(max_dims)
            .map(|d| match d {
                Some(v) => format!("{:02}", (v.clamp(0.0, 0.99) * 100.0) as u32),
                None => "--".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
