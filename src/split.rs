//! Random train/validation partition of a training set.

use crate::error::{DataError, Result};
use crate::rng::RandomSource;

/// Index sets produced by [`split_indices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSplit {
    /// Prefix of the permutation, `n_cut` indices.
    pub train: Vec<usize>,
    /// Suffix of the permutation, `floor(valid_split * n)` indices.
    pub valid: Vec<usize>,
}

impl IndexSplit {
    /// Total number of indices in both parts.
    pub fn len(&self) -> usize {
        self.train.len() + self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that the two parts are disjoint and together cover `0..n`.
    pub fn is_disjoint_cover(&self, n: usize) -> bool {
        if self.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &idx in self.train.iter().chain(self.valid.iter()) {
            if idx >= n || seen[idx] {
                return false;
            }
            seen[idx] = true;
        }
        true
    }
}

/// Rejects fractions outside `[0, 1)`, NaN included.
pub fn validate_fraction(valid_split: f64) -> Result<()> {
    if (0.0..1.0).contains(&valid_split) {
        Ok(())
    } else {
        Err(DataError::InvalidSplit(valid_split))
    }
}

/// Boundary between the train prefix and the validation suffix:
/// `n - floor(valid_split * n)`.
pub fn cut_point(n: usize, valid_split: f64) -> usize {
    let n_valid = (valid_split * n as f64).floor() as usize;
    n - n_valid.min(n)
}

/// Draws a permutation of `0..n` from `rng` and cuts it at [`cut_point`].
pub fn split_indices(n: usize, valid_split: f64, rng: &RandomSource) -> Result<IndexSplit> {
    validate_fraction(valid_split)?;

    let mut indices = rng.permutation(n);
    let valid = indices.split_off(cut_point(n, valid_split));

    Ok(IndexSplit {
        train: indices,
        valid,
    })
}
