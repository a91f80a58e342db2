//! Shared random source for index permutations.
//!
//! The split permutation and every epoch shuffle draw from one generator so a
//! run is reproducible from a single seed. Seeding is the caller's decision:
//! either pass a seed through [`LoaderConfig`](crate::config::LoaderConfig)
//! or hand a [`RandomSource`] to the loader directly.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to a mutex-guarded `StdRng`. Clones share state.
#[derive(Debug, Clone)]
pub struct RandomSource {
    inner: Arc<Mutex<StdRng>>,
}

impl RandomSource {
    /// Deterministic source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Source seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// `Some(seed)` gives a deterministic source, `None` an OS-seeded one.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_os_rng(),
        }
    }

    /// Uniformly random permutation of `0..n`.
    pub fn permutation(&self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        self.shuffle(&mut indices);
        indices
    }

    /// Shuffles `values` in place.
    pub fn shuffle<T>(&self, values: &mut [T]) {
        values.shuffle(&mut *self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, StdRng> {
        // A panic while holding the lock cannot leave StdRng in a bad state.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutation_covers_range() {
        let rng = RandomSource::seeded(7);
        let mut perm = rng.permutation(100);
        perm.sort_unstable();
        assert_eq!(perm, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_permutation() {
        let a = RandomSource::seeded(42).permutation(50);
        let b = RandomSource::seeded(42).permutation(50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_clones_share_state() {
        let rng = RandomSource::seeded(1);
        let clone = rng.clone();
        let first = rng.permutation(20);
        let second = clone.permutation(20);
        // Второй вызов продолжает ту же последовательность
        let fresh = RandomSource::seeded(1);
        assert_eq!(first, fresh.permutation(20));
        assert_eq!(second, fresh.permutation(20));
    }

    #[test]
    fn test_empty_permutation() {
        assert!(RandomSource::seeded(0).permutation(0).is_empty());
    }
}
