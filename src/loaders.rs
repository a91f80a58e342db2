//! Train/validation/test loaders for CIFAR-100.
//!
//! [`DatasetSplitLoader::build`] is the whole pipeline: load both partitions,
//! attach the train-time augmentation and the eval-time normalization, cut a
//! random validation subset off the training partition and wrap the three
//! datasets in [`DataLoader`]s.
//!
//! ```no_run
//! use cifar_loaders::{DatasetSplitLoader, LoaderConfig};
//!
//! let config = LoaderConfig::default().with_root("~/data/CIFAR100").with_seed(0);
//! let (train, valid, test) = DatasetSplitLoader::new(config)?.build()?.into_parts();
//!
//! for batch in train.iter() {
//!     let batch = batch?;
//!     assert_eq!(batch.features.shape()[1..], [3, 32, 32]);
//! }
//! # Ok::<(), cifar_loaders::DataError>(())
//! ```

use crate::config::LoaderConfig;
use crate::data::cifar::{Cifar100, Cifar100Options, MEAN, STD};
use crate::data::dataloader::{DataLoader, DataLoaderBuilder};
use crate::data::dataset::{Dataset, MapDataset, SubsetDataset};
use crate::data::transforms::{Compose, Normalize, RandomCrop, RandomHorizontalFlip, ToTensor};
use crate::error::Result;
use crate::rng::RandomSource;
use crate::split::split_indices;
use ndarray::ArrayD;
use std::sync::Arc;

/// CIFAR-100 partition with its per-sample transform attached.
pub type Cifar100Pipeline = MapDataset<Cifar100>;

/// Augmentation applied to training samples.
pub fn train_transform() -> Compose {
    Compose::new()
        .add(RandomCrop::new(32, 4))
        .add(RandomHorizontalFlip::new(0.5))
        .add(ToTensor::new())
        .add(Normalize::new(MEAN.to_vec(), STD.to_vec()))
}

/// Deterministic transform for validation and test samples.
pub fn eval_transform() -> Compose {
    Compose::new()
        .add(ToTensor::new())
        .add(Normalize::new(MEAN.to_vec(), STD.to_vec()))
}

/// The three loaders returned by a build. Train and validation views share
/// one training dataset; the test loader owns a separate dataset.
pub struct SplitLoaders<D, T = D> {
    pub train: DataLoader<SubsetDataset<Arc<D>>>,
    pub valid: DataLoader<SubsetDataset<Arc<D>>>,
    pub test: DataLoader<T>,
}

impl<D, T> std::fmt::Debug for SplitLoaders<D, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitLoaders").finish_non_exhaustive()
    }
}

impl<D, T> SplitLoaders<D, T> {
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        DataLoader<SubsetDataset<Arc<D>>>,
        DataLoader<SubsetDataset<Arc<D>>>,
        DataLoader<T>,
    ) {
        (self.train, self.valid, self.test)
    }
}

/// Builds train/valid/test loaders from a validated [`LoaderConfig`].
#[derive(Debug, Clone)]
pub struct DatasetSplitLoader {
    config: LoaderConfig,
    rng: RandomSource,
}

impl DatasetSplitLoader {
    /// Validates `config` before anything touches the filesystem. The random
    /// source is seeded from `config.seed`, or from the OS when it is unset.
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        let rng = RandomSource::from_seed_option(config.seed);
        Ok(Self { config, rng })
    }

    /// Replaces the random source used for the split and for shuffling.
    pub fn with_random_source(mut self, rng: RandomSource) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads CIFAR-100 from the configured root and builds the loaders.
    ///
    /// Only the training partition may be downloaded; the test partition is
    /// expected to be present already (it ships in the same archive).
    pub fn build(&self) -> Result<SplitLoaders<Cifar100Pipeline>> {
        self.config.validate()?;
        let root = self.config.resolved_root()?;

        let train_dataset = Cifar100::new(
            &root,
            Cifar100Options {
                train: true,
                download: self.config.download,
                label_kind: self.config.label_kind,
            },
        )?;
        let test_dataset = Cifar100::new(
            &root,
            Cifar100Options {
                train: false,
                download: false,
                label_kind: self.config.label_kind,
            },
        )?;

        self.build_from(
            MapDataset::new(train_dataset, train_transform()),
            MapDataset::new(test_dataset, eval_transform()),
        )
    }

    /// Splits `train_dataset` and wraps all three datasets in loaders.
    /// `test_dataset` is used whole and never takes part in the split.
    pub fn build_from<D, T>(&self, train_dataset: D, test_dataset: T) -> Result<SplitLoaders<D, T>>
    where
        D: Dataset<Item = ArrayD<f32>, Label = usize>,
        T: Dataset<Item = ArrayD<f32>, Label = usize>,
    {
        self.config.validate()?;

        let n = train_dataset.len();
        let split = split_indices(n, self.config.valid_split, &self.rng)?;
        log::info!(
            "split {} training samples into {} train / {} valid; {} test samples",
            n,
            split.train.len(),
            split.valid.len(),
            test_dataset.len()
        );

        let train_dataset = Arc::new(train_dataset);
        let train_subset = SubsetDataset::new(Arc::clone(&train_dataset), split.train)?;
        let valid_subset = SubsetDataset::new(train_dataset, split.valid)?;

        let train = self
            .loader_builder(self.config.train_batch_size)
            .shuffle(true)
            .build(train_subset)?;
        let valid = self
            .loader_builder(self.config.test_batch_size)
            .build(valid_subset)?;
        let test = self
            .loader_builder(self.config.test_batch_size)
            .build(test_dataset)?;

        Ok(SplitLoaders { train, valid, test })
    }

    fn loader_builder(&self, batch_size: usize) -> DataLoaderBuilder {
        DataLoaderBuilder::new()
            .batch_size(batch_size)
            .num_workers(self.config.num_workers)
            .pin_memory(true)
            .random_source(self.rng.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::InMemoryDataset;
    use crate::data::transforms::Transform;
    use crate::error::DataError;

    fn dataset(n: usize) -> InMemoryDataset {
        let features = ArrayD::from_shape_vec(
            ndarray::IxDyn(&[n, 1]),
            (0..n).map(|x| x as f32).collect(),
        )
        .unwrap();
        InMemoryDataset::new(features, (0..n).collect()).unwrap()
    }

    fn config() -> LoaderConfig {
        LoaderConfig::default().with_num_workers(0).with_seed(17)
    }

    #[test]
    fn test_reference_split_sizes() {
        let loaders = DatasetSplitLoader::new(config())
            .unwrap()
            .build_from(dataset(1000), dataset(200))
            .unwrap();

        assert_eq!(loaders.train.len(), 950);
        assert_eq!(loaders.valid.len(), 50);
        assert_eq!(loaders.test.len(), 200);

        let mut all: Vec<usize> = loaders
            .train
            .dataset()
            .indices()
            .iter()
            .chain(loaders.valid.dataset().indices())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_loader_settings() {
        let loaders = DatasetSplitLoader::new(config().with_train_batch_size(64).with_test_batch_size(100))
            .unwrap()
            .build_from(dataset(100), dataset(10))
            .unwrap();

        assert!(loaders.train.is_shuffled());
        assert!(!loaders.valid.is_shuffled());
        assert!(!loaders.test.is_shuffled());
        assert_eq!(loaders.train.batch_size(), 64);
        assert_eq!(loaders.valid.batch_size(), 100);
        assert_eq!(loaders.test.batch_size(), 100);
        assert!(loaders.train.pin_memory() && loaders.valid.pin_memory() && loaders.test.pin_memory());
    }

    #[test]
    fn test_valid_loader_single_short_batch() {
        let (_, valid, _) = DatasetSplitLoader::new(config())
            .unwrap()
            .build_from(dataset(1000), dataset(10))
            .unwrap()
            .into_parts();

        let batches: Vec<_> = valid.iter().collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 50);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = DatasetSplitLoader::new(config().with_valid_split(1.0)).unwrap_err();
        assert!(matches!(err, DataError::InvalidSplit(_)));
    }

    #[test]
    fn test_transforms_produce_chw_tensors() {
        let image = ArrayD::from_elem(ndarray::IxDyn(&[32, 32, 3]), 128.0);
        assert_eq!(train_transform().apply(image.clone()).shape(), &[3, 32, 32]);

        let out = eval_transform().apply(image);
        assert_eq!(out.shape(), &[3, 32, 32]);
        let expected = (128.0 / 255.0 - MEAN[0]) / STD[0];
        assert!((out[[0, 5, 5]] - expected).abs() < 1e-5);
    }
}
