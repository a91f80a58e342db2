//! # cifar-loaders: CIFAR-100 data pipelines in Rust
//!
//! Builds the three data loaders a CIFAR-100 classifier trains against:
//! a shuffled, augmented **train** loader and deterministic **valid** and
//! **test** loaders. The validation set is a random fraction of the training
//! partition; the test loader reads the separate test partition.
//!
//! ## Usage Example
//!
//! ```no_run
//! use cifar_loaders::{DatasetSplitLoader, LoaderConfig};
//!
//! // 1. Configure (every option has a default)
//! let config = LoaderConfig::default()
//!     .with_valid_split(0.1)
//!     .with_seed(1234);
//!
//! // 2. Build: downloads the training files on first use
//! let loaders = DatasetSplitLoader::new(config)?.build()?;
//!
//! // 3. Iterate; every `iter()` is a fresh epoch
//! for batch in loaders.train.iter() {
//!     let batch = batch?;
//!     println!("{:?} {:?}", batch.features.shape(), batch.labels.len());
//! }
//! # Ok::<(), cifar_loaders::DataError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod loaders;
pub mod rng;
pub mod split;

pub use config::LoaderConfig;
pub use error::{DataError, Result};
pub use loaders::{DatasetSplitLoader, SplitLoaders};
pub use rng::RandomSource;
