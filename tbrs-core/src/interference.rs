//! Interference: blending one pattern toward another.
//!
//! Used in two directions: a distractor pulls the cued memorandum's WM
//! pattern toward itself, and refreshing pulls a WM pattern back toward its
//! LTM pattern. Only dimensions characterized in *both* patterns move.

use crate::pattern::ItemPattern;

/// Move `target` toward `source` by `proportion`.
///
/// For every dimension where both patterns are characterized and differ,
/// `target[d] = target[d] * (1 - proportion) + source[d] * proportion`.
/// Uncharacterized and equal dimensions are left untouched. `proportion` is
/// clamped to `[0, 1]`.
///
/// Returns the number of dimensions that moved.
pub fn blend(target: &mut ItemPattern, source: &ItemPattern, proportion: f64) -> usize {
    let p = proportion.clamp(0.0, 1.0);
    let mut moved = 0;
    for (t, s) in target.dims_mut().iter_mut().zip(source.dims()) {
        if let (Some(tv), Some(sv)) = (t.as_mut(), *s) {
            if *tv != sv {
                *tv = *tv * (1.0 - p) + sv * p;
                moved += 1;
            }
        }
    }
    moved
}
