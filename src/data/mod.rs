//! # Data Loading Module
//!
//! PyTorch-style Dataset and DataLoader API for image classification data.
//!
//! ## Key Components
//!
//! - [`Dataset`]: Trait for defining data sources
//! - [`DataLoader`]: Batched data iterator with shuffle and worker support
//! - [`Sampler`]: Data sampling strategies (sequential, random)
//! - [`Transform`]: Image transformations (augmentation, tensor conversion, normalization)
//! - [`Cifar100`]: The CIFAR-100 binary distribution
//!
//! ## Example
//!
//! ```ignore
//! use cifar_loaders::data::{Cifar100, Cifar100Options, DataLoader, MapDataset};
//! use cifar_loaders::loaders::eval_transform;
//!
//! let test = Cifar100::new("/tmp/CIFAR100", Cifar100Options { train: false, ..Default::default() })?;
//! let loader = DataLoader::new(MapDataset::new(test, eval_transform()), 128);
//!
//! for batch in loader.iter() {
//!     let batch = batch?;
//!     // batch.features: [128, 3, 32, 32], batch.labels: [128]
//! }
//! ```
//!
//! ## Available Components
//!
//! ### Datasets
//! - [`InMemoryDataset`]: In-memory dataset with features and class labels
//! - [`MapDataset`]: Dataset with a per-sample transform
//! - [`SubsetDataset`]: Non-copying view over a subset of indices
//!
//! ### Samplers
//! - [`SequentialSampler`]: Iterate in order
//! - [`RandomSampler`]: Shuffle indices randomly
//! - [`BatchSampler`]: Group indices into batches
//!
//! ### Transforms
//! - [`RandomCrop`], [`RandomHorizontalFlip`]: Geometric augmentation on `[H, W, C]` images
//! - [`ToTensor`]: `[H, W, C]` bytes to `[C, H, W]` floats in `[0, 1]`
//! - [`Normalize`]: Per-channel mean/std normalization
//! - [`Compose`]: Chain multiple transforms

pub mod cifar;
pub mod dataloader;
pub mod dataset;
pub mod download;
pub mod sampler;
pub mod transforms;

pub use cifar::{Cifar100, Cifar100Options, LabelKind};
pub use dataloader::{Batch, DataLoader, DataLoaderBuilder, DataLoaderIter};
pub use dataset::{Dataset, InMemoryDataset, MapDataset, SubsetDataset};
pub use sampler::{BatchSampler, RandomSampler, Sampler, SequentialSampler};
pub use transforms::{Compose, Normalize, RandomCrop, RandomHorizontalFlip, ToTensor, Transform};
